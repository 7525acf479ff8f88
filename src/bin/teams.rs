use std::path::PathBuf;

use anyhow::{Context, Result};

use fbref_stats::config::AppConfig;
use fbref_stats::service::{list_teams, team_by_id};
use fbref_stats::store::SqliteStore;

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let db_path = parse_db_path_arg(&args)
        .or(AppConfig::from_env().db_path)
        .context("unable to resolve sqlite path")?;
    let store = SqliteStore::open(&db_path)?;

    if let Some(id) = parse_id_arg(&args) {
        let team = team_by_id(&store, &id)?;
        println!("{}\t{}", team.id, team.name);
        return Ok(());
    }

    let teams = list_teams(&store)?;
    for team in &teams {
        println!("{}\t{}", team.id, team.name);
    }
    println!("{} teams", teams.len());
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

fn parse_id_arg(args: &[String]) -> Option<String> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(id) = arg.strip_prefix("--id=") {
            return Some(id.trim().to_string());
        }
        if arg == "--id" {
            return args.get(idx + 1).map(|s| s.trim().to_string());
        }
    }
    None
}
