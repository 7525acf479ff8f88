use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use fbref_stats::config::AppConfig;
use fbref_stats::pipeline::CreateOutcome;
use fbref_stats::scheduler::BatchScheduler;
use fbref_stats::service::Ingestion;
use fbref_stats::source::{FileMatchSource, HttpMatchSource, MatchSource};
use fbref_stats::store::SqliteStore;

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    init_logging(&args);

    let config = AppConfig::from_env();
    let team = arg_value(&args, "--team").ok_or_else(|| anyhow!("--team <squad id> is required"))?;
    let season = arg_value(&args, "--season");

    let db_path = arg_value(&args, "--db")
        .map(PathBuf::from)
        .or_else(|| config.db_path.clone())
        .context("unable to resolve sqlite path")?;
    let store = SqliteStore::open(&db_path)?;

    let source: Box<dyn MatchSource> = match &config.source_file {
        Some(path) => Box::new(
            FileMatchSource::open(path)
                .with_context(|| format!("load snapshot {}", path.display()))?,
        ),
        None => Box::new(HttpMatchSource::new(&config.source_url, config.http_timeout)?),
    };
    let scheduler = if config.source_file.is_some() {
        BatchScheduler::unthrottled(config.batch_size)?
    } else {
        BatchScheduler::new(config.batch_size, config.cooldown)?
    };
    let ingestion = Ingestion::new(&store, source.as_ref(), &scheduler);

    let outcomes = match season.as_deref() {
        Some(season) => ingestion.ingest_team_fixtures_for_season(&team, season),
        None => ingestion.ingest_team_fixtures(&team),
    }
    .with_context(|| format!("ingest fixtures for {team}"))?;

    let created = outcomes.iter().filter(|o| o.is_created()).count();
    println!("Ingest complete");
    println!("DB: {}", db_path.display());
    println!("Fixtures processed: {}", outcomes.len());
    println!("Matches created: {created}");
    println!("Already stored: {}", outcomes.len() - created);
    for outcome in &outcomes {
        if let CreateOutcome::Created(processed) = outcome {
            let m = &processed.stored;
            println!(
                " + {} {} {}-{} ({}, {} players)",
                m.date,
                m.competition,
                m.home_goals,
                m.away_goals,
                m.winner,
                processed.player_stats.len()
            );
        }
    }
    Ok(())
}

fn init_logging(args: &[String]) {
    let level = if args.iter().any(|a| a == "--verbose") {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
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
