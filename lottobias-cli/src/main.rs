mod display;
mod import;
mod logging;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use lottobias_db::db::{count_draws, db_path, fetch_history, fetch_last_draws, list_lotteries, migrate, open_db};
use lottobias_db::models::{parse_number_list, profile, LotteryProfile, PROFILES};
use lottobias_db::rusqlite::Connection;
use lottobias_engine::sampler::rank;
use lottobias_engine::{analyze, date_seed, generate_lines, BiasConfig, DrawHistory, LineConstraints, Mode, Preset};

use crate::display::{
    display_draws, display_import_summary, display_lines, display_pairs, display_profiles, display_ranking,
};

#[derive(Parser)]
#[command(name = "lottobias", about = "Bias detection and line suggestions for lottery draw histories")]
struct Cli {
    /// SQLite database (default: ./data/lottobias.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import draws from a CSV file (draw_date,numbers,bonus,lottery)
    Import {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List the most recent draws of a lottery
    List {
        #[arg(short = 'L', long)]
        lottery: String,

        #[arg(short, long, default_value = "10")]
        last: u32,
    },

    /// Show the built-in lottery profiles
    Profiles,

    /// Print the effective configuration as JSON
    Config {
        #[arg(short = 'L', long)]
        lottery: String,

        #[arg(short, long)]
        preset: Option<Preset>,
    },

    /// Rank every number of the pool by dampened bias score
    Rank {
        #[arg(short = 'L', long)]
        lottery: String,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        preset: Option<Preset>,

        /// Short trend window (draws)
        #[arg(short, long)]
        window: Option<usize>,

        #[arg(short, long)]
        top: Option<usize>,

        #[arg(long)]
        min_confidence: Option<f64>,

        #[arg(long)]
        json: bool,
    },

    /// Generate candidate lines from the bias model
    Lines {
        #[arg(short = 'L', long)]
        lottery: String,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        preset: Option<Preset>,

        /// Number of lines
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// RNG seed (default: today's date as YYYYMMDD)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Numbers forced into every line, e.g. 7,13
        #[arg(long)]
        lock: Option<String>,

        #[arg(long)]
        no_constraints: bool,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    logging::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Profiles => {
            let conn = connect(cli.db.as_deref())?;
            display_profiles(PROFILES, &list_lotteries(&conn)?);
            Ok(())
        }
        Command::Config { lottery, preset } => {
            let config = build_config(profile(&lottery)?, None, preset)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Import { file } => {
            let conn = connect(cli.db.as_deref())?;
            let result = import::import_csv(&conn, &file)?;
            display_import_summary(&result);
            Ok(())
        }
        Command::List { lottery, last } => {
            let conn = connect(cli.db.as_deref())?;
            cmd_list(&conn, profile(&lottery)?, last)
        }
        Command::Rank {
            lottery,
            config,
            preset,
            window,
            top,
            min_confidence,
            json,
        } => {
            let conn = connect(cli.db.as_deref())?;
            let p = profile(&lottery)?;
            let mut config = build_config(p, config.as_deref(), preset)?;
            config.mode = Mode::Ranking;
            if let Some(w) = window {
                config.short_window = w;
            }
            if top.is_some() {
                config.top = top;
            }
            if let Some(c) = min_confidence {
                config.min_confidence = c;
            }
            cmd_rank(&conn, p, &config, json)
        }
        Command::Lines {
            lottery,
            config,
            preset,
            count,
            seed,
            lock,
            no_constraints,
            json,
        } => {
            let conn = connect(cli.db.as_deref())?;
            let p = profile(&lottery)?;
            let mut config = build_config(p, config.as_deref(), preset)?;
            config.mode = Mode::Lines;
            if let Some(n) = count {
                config.num_lines = n;
            }
            config.rng_seed = Some(seed.or(config.rng_seed).unwrap_or_else(date_seed));
            if let Some(lock) = lock {
                config.locked = parse_number_list(&lock).context("--lock")?;
            }
            if no_constraints {
                config.constraints = LineConstraints::none();
            }
            cmd_lines(&conn, p, &config, json)
        }
    }
}

fn connect(path: Option<&Path>) -> Result<Connection> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(db_path);
    let conn = open_db(&path)?;
    migrate(&conn)?;
    Ok(conn)
}

/// Config file (or defaults), reshaped to the profile's main pool, then the preset.
fn build_config(profile: &LotteryProfile, path: Option<&Path>, preset: Option<Preset>) -> Result<BiasConfig> {
    let pool = profile.main_pool();
    let mut config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read {:?}", path))?;
            let mut config: BiasConfig = serde_json::from_str(&text)
                .with_context(|| format!("Invalid configuration in {:?}", path))?;
            if config.numbers_per_draw != pool.pick
                && config.constraints == LineConstraints::balanced(config.numbers_per_draw)
            {
                config.constraints = LineConstraints::balanced(pool.pick);
            }
            config
        }
        None => BiasConfig::for_pool(pool),
    };
    config.pool_min = pool.min;
    config.pool_max = pool.max;
    config.numbers_per_draw = pool.pick;

    if let Some(preset) = preset {
        preset.apply(&mut config);
    }
    config.validate()?;
    Ok(config)
}

fn load_history(conn: &Connection, profile: &LotteryProfile) -> Result<Option<DrawHistory>> {
    if count_draws(conn, Some(profile.key))? == 0 {
        println!("No draws for {}. Run first: lottobias import --file <csv>", profile.key);
        return Ok(None);
    }
    let records = fetch_history(conn, profile.key)?;
    let history = DrawHistory::new(profile.key, profile.main_pool(), records)
        .with_context(|| format!("Stored draws for {} are inconsistent", profile.key))?;
    Ok(Some(history))
}

fn cmd_list(conn: &Connection, profile: &LotteryProfile, last: u32) -> Result<()> {
    if count_draws(conn, Some(profile.key))? == 0 {
        println!("No draws for {}. Run first: lottobias import --file <csv>", profile.key);
        return Ok(());
    }
    let draws = fetch_last_draws(conn, profile.key, last)?;
    display_draws(&draws);
    Ok(())
}

fn cmd_rank(conn: &Connection, profile: &LotteryProfile, config: &BiasConfig, json: bool) -> Result<()> {
    let Some(history) = load_history(conn, profile)? else {
        return Ok(());
    };
    let model = analyze(&history, config)?;
    let ranked = rank(&model, config);

    if json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
        return Ok(());
    }

    display_ranking(&model, &ranked, &format!("{} ranking", profile.name));
    display_pairs(&model, 5);

    if let Some(bonus_pool) = profile.bonus_pool() {
        let bonus_history = history.bonus_history(bonus_pool);
        let mut bonus_config = config.for_bonus(bonus_pool);
        bonus_config.top = None;
        let bonus_model = analyze(&bonus_history, &bonus_config)?;
        display_ranking(&bonus_model, &rank(&bonus_model, &bonus_config), "Bonus ranking");
    }
    Ok(())
}

fn cmd_lines(conn: &Connection, profile: &LotteryProfile, config: &BiasConfig, json: bool) -> Result<()> {
    let Some(history) = load_history(conn, profile)? else {
        return Ok(());
    };
    let model = analyze(&history, config)?;

    let bonus_model = match profile.bonus_pool() {
        Some(bonus_pool) => Some(analyze(&history.bonus_history(bonus_pool), &config.for_bonus(bonus_pool))?),
        None => None,
    };

    let lines = generate_lines(&model, bonus_model.as_ref(), config)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&lines)?);
    } else {
        println!("\n{}: {} draws analysed, seed {}", profile.name, model.history_len, config.rng_seed.unwrap_or_default());
        display_lines(&lines);
    }
    Ok(())
}
