use std::path::PathBuf;

use anyhow::{Context, Result};

use fbref_stats::config::AppConfig;
use fbref_stats::service::{away_managers, home_managers};
use fbref_stats::store::SqliteStore;

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let db_path = parse_db_path_arg(&args)
        .or(AppConfig::from_env().db_path)
        .context("unable to resolve sqlite path")?;
    let store = SqliteStore::open(&db_path)?;

    let managers = if args.iter().any(|a| a == "--away") {
        away_managers(&store)?
    } else {
        home_managers(&store)?
    };
    for name in managers {
        println!("{name}");
    }
    Ok(())
}

fn parse_db_path_arg(args: &[String]) -> Option<PathBuf> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
