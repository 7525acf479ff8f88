use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use fbref_stats::config::AppConfig;
use fbref_stats::filter::MatchFilter;
use fbref_stats::model::TeamId;
use fbref_stats::service::get_aggregate_stats;
use fbref_stats::store::SqliteStore;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let config = AppConfig::from_env();
    let db_path = arg_value(&args, "--db")
        .map(PathBuf::from)
        .or(config.db_path)
        .context("unable to resolve sqlite path")?;
    let store = SqliteStore::open(&db_path)?;

    let filter = MatchFilter {
        season: arg_value(&args, "--season"),
        competition: arg_value(&args, "--competition"),
        team_id: arg_value(&args, "--team").map(TeamId),
        home_team_id: arg_value(&args, "--home-team").map(TeamId),
        away_team_id: arg_value(&args, "--away-team").map(TeamId),
        home_manager: arg_value(&args, "--home-manager"),
        away_manager: arg_value(&args, "--away-manager"),
        date_from: parse_date_arg(&args, "--from")?,
        date_to: parse_date_arg(&args, "--to")?,
    };

    let report = get_aggregate_stats(&store, &filter)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serialize stats report")?
    );
    Ok(())
}

fn parse_date_arg(args: &[String], name: &str) -> Result<Option<NaiveDate>> {
    let Some(raw) = arg_value(args, name) else {
        return Ok(None);
    };
    let date = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .with_context(|| format!("{name} expects YYYY-MM-DD, got {raw}"))?;
    Ok(Some(date))
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
