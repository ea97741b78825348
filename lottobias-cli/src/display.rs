use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::import::ImportResult;
use lottobias_db::models::{DrawRecord, LotteryProfile};
use lottobias_engine::{BiasModel, GeneratedLine, RankedNumber, Tag};

fn join_numbers(numbers: &[u8]) -> String {
    numbers
        .iter()
        .map(|n| format!("{:2}", n))
        .collect::<Vec<_>>()
        .join(" - ")
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn display_draws(draws: &[DrawRecord]) {
    if draws.is_empty() {
        println!("No draws to display.");
        return;
    }

    let mut table = new_table(vec!["Date", "Lottery", "Numbers", "Bonus"]);
    for draw in draws {
        let bonus = if draw.bonus.is_empty() {
            "-".to_string()
        } else {
            join_numbers(&draw.bonus)
        };
        table.add_row(vec![
            draw.draw_date.to_string(),
            draw.lottery.clone(),
            join_numbers(&draw.numbers),
            bonus,
        ]);
    }

    println!("{table}");
}

pub fn display_profiles(profiles: &[LotteryProfile], stored: &[(String, u32)]) {
    let mut table = new_table(vec!["Key", "Name", "Pool", "Pick", "Bonus", "Stored draws"]);
    for p in profiles {
        let bonus = match p.bonus {
            Some(b) => format!("{} from {}-{}", b.pick, b.min, b.max),
            None => "-".to_string(),
        };
        let count = stored
            .iter()
            .find(|(key, _)| key == p.key)
            .map_or(0, |(_, n)| *n);
        table.add_row(vec![
            p.key.to_string(),
            p.name.to_string(),
            format!("{}-{}", p.min, p.max),
            p.numbers_per_draw.to_string(),
            bonus,
            count.to_string(),
        ]);
    }
    println!("{table}");
}

pub fn display_import_summary(result: &ImportResult) {
    println!("Import finished:");
    println!("  Rows read          : {}", result.total_records);
    println!("  Inserted           : {}", result.inserted);
    println!("  Duplicates ignored : {}", result.skipped);
    if result.errors > 0 {
        println!("  Rejected           : {}", result.errors);
    }
}

fn model_header(model: &BiasModel) {
    println!(
        "\n{}: {} draws, short window {}, long window {}, mean confidence {:.4}",
        model.lottery,
        model.history_len,
        model.short_window,
        model.long_window,
        model.mean_confidence()
    );
    if model.is_uniform() {
        println!("Not enough evidence: scores are uniform.");
    }
}

pub fn display_ranking(model: &BiasModel, ranked: &[RankedNumber], title: &str) {
    model_header(model);
    println!("\n── {title} ──");

    let mut table = new_table(vec!["#", "Number", "Score", "Confidence", "Trend", "Decay", "Momentum", "Pair", "Tag", "Why"]);
    for (i, r) in ranked.iter().enumerate() {
        let color = match r.tag {
            Tag::Hot => Color::Green,
            Tag::Cold => Color::Red,
            Tag::Neutral => Color::White,
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format!("{:2}", r.number)),
            Cell::new(format!("{:.4}", r.score)),
            Cell::new(format!("{:.3}", r.confidence)),
            Cell::new(format!("{:+.3}", r.signals.trend)),
            Cell::new(format!("{:+.3}", r.signals.decay)),
            Cell::new(format!("{:+.3}", r.signals.momentum)),
            Cell::new(format!("{:+.3}", r.signals.pair)),
            Cell::new(r.tag.to_string()).fg(color),
            Cell::new(&r.explanation),
        ]);
    }
    println!("{table}");
}

pub fn display_pairs(model: &BiasModel, limit: usize) {
    let pairs = model.pairs.strongest_pairs(limit);
    if model.history_len == 0 || pairs.is_empty() {
        return;
    }
    println!("\n── Strongest pairs ──");
    let mut table = new_table(vec!["Pair", "Seen", "Lift"]);
    for (a, b, lift) in pairs {
        table.add_row(vec![
            format!("{:2} - {:2}", a, b),
            model.pairs.count(a, b).to_string(),
            format!("{:.2}", lift),
        ]);
    }
    println!("{table}");
}

pub fn display_lines(lines: &[GeneratedLine]) {
    println!("\n── Suggested lines ──");

    let mut table = new_table(vec!["#", "Numbers", "Bonus", "Score", "Repairs", "Constraints", "Seed"]);
    for (i, line) in lines.iter().enumerate() {
        let bonus = if line.bonus.is_empty() {
            "-".to_string()
        } else {
            join_numbers(&line.bonus)
        };
        let status = if line.unmet.is_empty() {
            Cell::new("ok").fg(Color::Green)
        } else {
            let unmet: Vec<String> = line.unmet.iter().map(|k| k.to_string()).collect();
            Cell::new(format!("relaxed: {}", unmet.join(", "))).fg(Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(join_numbers(&line.numbers)),
            Cell::new(bonus),
            Cell::new(format!("{:.4}", line.score)),
            Cell::new(line.repairs),
            status,
            Cell::new(line.seed),
        ]);
    }
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_numbers() {
        assert_eq!(join_numbers(&[3, 14, 27]), " 3 - 14 - 27");
        assert_eq!(join_numbers(&[]), "");
    }
}
