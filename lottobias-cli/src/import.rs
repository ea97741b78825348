use anyhow::{Context, Result};
use chrono::NaiveDate;
use lottobias_db::rusqlite::Connection;
use serde::Deserialize;
use std::path::Path;

use lottobias_db::db::insert_draw;
use lottobias_db::models::{parse_number_list, profile, validate_draw, DrawRecord};

/// One CSV row: `draw_date,numbers,bonus,lottery`, number lists comma-separated.
#[derive(Debug, Deserialize)]
struct CsvRow {
    draw_date: String,
    numbers: String,
    #[serde(default)]
    bonus: String,
    lottery: String,
}

/// ISO dates first, then the `DD/MM/YYYY` form used by most lottery exports.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .with_context(|| format!("Invalid date format: '{}'", raw))
}

fn parse_row(row: &CsvRow) -> Result<DrawRecord> {
    let profile = profile(&row.lottery)?;
    let draw_date = parse_date(&row.draw_date)?;
    let numbers = parse_number_list(&row.numbers).context("numbers")?;
    let bonus = parse_number_list(&row.bonus).context("bonus")?;

    let record = DrawRecord::new(draw_date, numbers, bonus, profile.key);
    validate_draw(&record, profile)?;
    Ok(record)
}

#[derive(Debug, Default)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Cannot open {:?}", path))?;

    let tx = conn.unchecked_transaction()
        .context("Cannot start transaction")?;

    let mut result = ImportResult::default();

    for row_result in reader.deserialize::<CsvRow>() {
        result.total_records += 1;
        let line = result.total_records + 1;
        match row_result {
            Ok(row) => match parse_row(&row) {
                Ok(record) => match insert_draw(&tx, &record) {
                    Ok(true) => result.inserted += 1,
                    Ok(false) => result.skipped += 1,
                    Err(e) => {
                        log::warn!("line {}: insert failed: {:#}", line, e);
                        result.errors += 1;
                    }
                },
                Err(e) => {
                    log::warn!("line {}: {:#}", line, e);
                    result.errors += 1;
                }
            },
            Err(e) => {
                log::warn!("line {}: unreadable row: {}", line, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("Commit failed")?;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lottobias_db::db::{count_draws, fetch_history, migrate};
    use std::io::Write;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2026-02-17").unwrap(), NaiveDate::from_ymd_opt(2026, 2, 17).unwrap());
        assert_eq!(parse_date("17/02/2026").unwrap(), NaiveDate::from_ymd_opt(2026, 2, 17).unwrap());
        assert!(parse_date("2026/02/17").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_import_valid_rows() {
        let conn = memory_db();
        let file = csv_file(
            "draw_date,numbers,bonus,lottery\n\
             2024-01-03,\"1,2,3,4,5,6\",,lotto_649\n\
             2024-01-06,\"7,8,9,10,11,12\",,lotto_649\n\
             2024-01-05,\"1,2,3,4,5\",\"3,9\",euromillions\n",
        );
        let result = import_csv(&conn, file.path()).unwrap();
        assert_eq!(result.total_records, 3);
        assert_eq!(result.inserted, 3);
        assert_eq!(result.errors, 0);
        assert_eq!(count_draws(&conn, Some("lotto_649")).unwrap(), 2);

        let em = fetch_history(&conn, "euromillions").unwrap();
        assert_eq!(em[0].bonus, vec![3, 9]);
    }

    #[test]
    fn test_import_skips_duplicates() {
        let conn = memory_db();
        let file = csv_file("draw_date,numbers,lottery\n2024-01-03,\"6,5,4,3,2,1\",lotto_649\n");
        assert_eq!(import_csv(&conn, file.path()).unwrap().inserted, 1);
        let again = import_csv(&conn, file.path()).unwrap();
        assert_eq!(again.inserted, 0);
        assert_eq!(again.skipped, 1);
    }

    #[test]
    fn test_import_counts_invalid_rows() {
        let conn = memory_db();
        let file = csv_file(
            "draw_date,numbers,bonus,lottery\n\
             2024-01-03,\"1,2,3,4,5,6\",,lotto_649\n\
             2024-01-04,\"1,2,3,4,5,50\",,lotto_649\n\
             2024-01-05,\"1,2,3,4,5,6\",,keno\n\
             not-a-date,\"1,2,3,4,5,6\",,lotto_649\n\
             2024-01-06,\"1,1,3,4,5,6\",,lotto_649\n",
        );
        let result = import_csv(&conn, file.path()).unwrap();
        assert_eq!(result.total_records, 5);
        assert_eq!(result.inserted, 1);
        assert_eq!(result.errors, 4);
    }

    #[test]
    fn test_import_normalizes_lottery_key() {
        let conn = memory_db();
        let file = csv_file("draw_date,numbers,bonus,lottery\n03/01/2024,\"1,2,3,4,5\",7,Powerball\n");
        assert_eq!(import_csv(&conn, file.path()).unwrap().inserted, 1);
        assert_eq!(count_draws(&conn, Some("powerball")).unwrap(), 1);
    }

    #[test]
    fn test_import_missing_file() {
        let conn = memory_db();
        assert!(import_csv(&conn, Path::new("/nonexistent/draws.csv")).is_err());
    }
}
