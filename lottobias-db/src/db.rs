use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::Connection;
use std::path::Path;

use crate::models::{format_number_list, parse_number_list, DrawRecord};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS draws (
    lottery    TEXT NOT NULL,
    draw_date  TEXT NOT NULL,
    numbers    TEXT NOT NULL,
    bonus      TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (lottery, draw_date, numbers)
);
CREATE INDEX IF NOT EXISTS idx_draws_lottery_date ON draws (lottery, draw_date);
";

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("lottobias.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Cannot open database {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Migration failed")?;
    Ok(())
}

/// Returns `false` when the draw was already stored.
pub fn insert_draw(conn: &Connection, draw: &DrawRecord) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO draws (lottery, draw_date, numbers, bonus) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![
            draw.lottery,
            draw.draw_date.format("%Y-%m-%d").to_string(),
            format_number_list(&draw.numbers),
            format_number_list(&draw.bonus),
        ],
    ).context("Insert failed")?;
    Ok(changed > 0)
}

fn decode_row(lottery: String, date: String, numbers: String, bonus: String) -> Result<DrawRecord> {
    let draw_date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .with_context(|| format!("Corrupt date '{}' in database", date))?;
    Ok(DrawRecord::new(
        draw_date,
        parse_number_list(&numbers)?,
        parse_number_list(&bonus)?,
        lottery,
    ))
}

/// Most recent draws first.
pub fn fetch_last_draws(conn: &Connection, lottery: &str, limit: u32) -> Result<Vec<DrawRecord>> {
    let mut stmt = conn.prepare(
        "SELECT lottery, draw_date, numbers, bonus
         FROM draws WHERE lottery = ?1 ORDER BY draw_date DESC, rowid DESC LIMIT ?2"
    )?;
    let rows = stmt.query_map(rusqlite::params![lottery, limit], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?.collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(lottery, date, numbers, bonus)| decode_row(lottery, date, numbers, bonus))
        .collect()
}

/// Whole history of one lottery in chronological order (oldest first).
pub fn fetch_history(conn: &Connection, lottery: &str) -> Result<Vec<DrawRecord>> {
    let n = count_draws(conn, Some(lottery))?;
    let mut draws = fetch_last_draws(conn, lottery, n)?;
    draws.reverse();
    Ok(draws)
}

pub fn count_draws(conn: &Connection, lottery: Option<&str>) -> Result<u32> {
    let count: u32 = match lottery {
        Some(l) => conn.query_row("SELECT COUNT(*) FROM draws WHERE lottery = ?1", [l], |row| row.get(0))?,
        None => conn.query_row("SELECT COUNT(*) FROM draws", [], |row| row.get(0))?,
    };
    Ok(count)
}

/// Stored lotteries with their draw counts.
pub fn list_lotteries(conn: &Connection) -> Result<Vec<(String, u32)>> {
    let mut stmt = conn.prepare(
        "SELECT lottery, COUNT(*) FROM draws GROUP BY lottery ORDER BY lottery"
    )?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_draw(lottery: &str, date: &str, numbers: Vec<u8>) -> DrawRecord {
        DrawRecord::new(
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            numbers,
            vec![],
            lottery,
        )
    }

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_count() {
        let conn = memory_db();
        assert_eq!(count_draws(&conn, None).unwrap(), 0);

        insert_draw(&conn, &test_draw("lotto_649", "2024-01-01", vec![1, 2, 3, 4, 5, 6])).unwrap();
        assert_eq!(count_draws(&conn, None).unwrap(), 1);
        assert_eq!(count_draws(&conn, Some("lotto_649")).unwrap(), 1);
        assert_eq!(count_draws(&conn, Some("uk_lotto")).unwrap(), 0);
    }

    #[test]
    fn test_duplicate_ignored() {
        let conn = memory_db();
        let draw = test_draw("lotto_649", "2024-01-01", vec![1, 2, 3, 4, 5, 6]);

        assert!(insert_draw(&conn, &draw).unwrap());
        assert!(!insert_draw(&conn, &draw).unwrap());
        assert_eq!(count_draws(&conn, None).unwrap(), 1);
    }

    #[test]
    fn test_fetch_order() {
        let conn = memory_db();
        insert_draw(&conn, &test_draw("lotto_649", "2024-01-01", vec![1, 2, 3, 4, 5, 6])).unwrap();
        insert_draw(&conn, &test_draw("lotto_649", "2024-01-05", vec![7, 8, 9, 10, 11, 12])).unwrap();
        insert_draw(&conn, &test_draw("lotto_649", "2024-01-03", vec![13, 14, 15, 16, 17, 18])).unwrap();

        let draws = fetch_last_draws(&conn, "lotto_649", 10).unwrap();
        let dates: Vec<String> = draws.iter().map(|d| d.draw_date.to_string()).collect();
        assert_eq!(dates, vec!["2024-01-05", "2024-01-03", "2024-01-01"]);

        let history = fetch_history(&conn, "lotto_649").unwrap();
        assert_eq!(history[0].draw_date.to_string(), "2024-01-01");
        assert_eq!(history[2].numbers, vec![7, 8, 9, 10, 11, 12]);
    }

    #[test]
    fn test_lotteries_kept_apart() {
        let conn = memory_db();
        insert_draw(&conn, &test_draw("lotto_649", "2024-01-01", vec![1, 2, 3, 4, 5, 6])).unwrap();
        let mut em = test_draw("euromillions", "2024-01-02", vec![1, 2, 3, 4, 5]);
        em.bonus = vec![3, 9];
        insert_draw(&conn, &em).unwrap();

        let history = fetch_history(&conn, "euromillions").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].bonus, vec![3, 9]);

        let lotteries = list_lotteries(&conn).unwrap();
        assert_eq!(lotteries, vec![("euromillions".to_string(), 1), ("lotto_649".to_string(), 1)]);
    }
}
