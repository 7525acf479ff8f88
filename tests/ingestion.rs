use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;

use fbref_stats::IngestError;
use fbref_stats::model::DRAW;
use fbref_stats::pipeline::{CreateOutcome, Ingestor};
use fbref_stats::scheduler::{BatchScheduler, CancelToken};
use fbref_stats::service::Ingestion;
use fbref_stats::source::{FixtureLink, MatchSource, RawMatchRecord, ScheduleRef};
use fbref_stats::store::{MatchStore, SqliteStore};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Fetch(String),
    Pause(Duration),
}

#[derive(Default)]
struct ScriptedSource {
    fixtures: Vec<FixtureLink>,
    records: HashMap<String, RawMatchRecord>,
    fail_on: HashSet<String>,
    rate_limited: bool,
    events: Arc<Mutex<Vec<Event>>>,
}

impl ScriptedSource {
    fn fetched(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|e| match e {
                Event::Fetch(r) => Some(r.clone()),
                Event::Pause(_) => None,
            })
            .collect()
    }
}

impl MatchSource for ScriptedSource {
    fn list_fixtures(&self, schedule: &ScheduleRef) -> fbref_stats::Result<Vec<FixtureLink>> {
        if self.rate_limited {
            return Err(IngestError::RateLimited {
                reference: schedule.team.clone(),
            });
        }
        Ok(self.fixtures.clone())
    }

    fn extract_match(&self, fixture: &FixtureLink) -> fbref_stats::Result<RawMatchRecord> {
        self.events
            .lock()
            .unwrap()
            .push(Event::Fetch(fixture.match_reference.clone()));
        if self.fail_on.contains(&fixture.match_reference) {
            return Err(IngestError::extraction("homeGoals", "<missing>"));
        }
        self.records
            .get(&fixture.match_reference)
            .cloned()
            .ok_or_else(|| IngestError::not_found("fixture", fixture.match_reference.clone()))
    }
}

const TEAMS: [(&str, &str); 4] = [
    ("Arsenal", "18bb7c10"),
    ("Chelsea", "cff3d9bb"),
    ("Liverpool", "822bd0ba"),
    ("Everton", "d3fd31cc"),
];

fn squad_link(name: &str) -> Option<String> {
    TEAMS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(n, id)| format!("/en/squads/{id}/{n}-Stats"))
}

fn record(reference: &str, date: &str, home: &str, away: &str, hg: u32, ag: u32) -> RawMatchRecord {
    RawMatchRecord {
        date: date.to_string(),
        match_reference: reference.to_string(),
        season: "2023-2024".to_string(),
        competition: "Premier League".to_string(),
        home_team: home.to_string(),
        away_team: away.to_string(),
        home_team_link: squad_link(home),
        away_team_link: squad_link(away),
        home_goals: hg.to_string(),
        away_goals: ag.to_string(),
        home_manager: format!("{home} Manager"),
        away_manager: format!("{away} Manager"),
        player_lines: Vec::new(),
    }
}

fn five_fixture_source() -> ScriptedSource {
    let rows = [
        record("/m/1", "20230812", "Arsenal", "Chelsea", 2, 1),
        record("/m/2", "20230819", "Liverpool", "Everton", 0, 0),
        record("/m/3", "20230826", "Chelsea", "Liverpool", 1, 3),
        record("/m/4", "20230902", "Everton", "Arsenal", 1, 1),
        record("/m/5", "20230909", "Arsenal", "Liverpool", 4, 0),
    ];
    let fixtures = rows
        .iter()
        .map(|r| FixtureLink {
            match_reference: r.match_reference.clone(),
            raw_date: r.date.clone(),
            season: r.season.clone(),
        })
        .collect();
    ScriptedSource {
        fixtures,
        records: rows
            .into_iter()
            .map(|r| (r.match_reference.clone(), r))
            .collect(),
        ..ScriptedSource::default()
    }
}

fn recording_scheduler(batch_size: usize, events: Arc<Mutex<Vec<Event>>>) -> BatchScheduler {
    BatchScheduler::new(batch_size, Duration::from_secs(30))
        .expect("scheduler builds")
        .with_pause(move |d| events.lock().unwrap().push(Event::Pause(d)))
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

#[test]
fn scheduler_runs_batches_with_cooldown_between() {
    let source = five_fixture_source();
    let scheduler = recording_scheduler(2, source.events.clone());

    let records = scheduler
        .run(&source.fixtures, &source)
        .expect("all fixtures extract");
    let refs: Vec<_> = records.iter().map(|r| r.match_reference.as_str()).collect();
    assert_eq!(refs, vec!["/m/1", "/m/2", "/m/3", "/m/4", "/m/5"]);

    let events = source.events.lock().unwrap().clone();
    let mut batches: Vec<Vec<String>> = vec![Vec::new()];
    for event in &events {
        match event {
            Event::Fetch(r) => batches.last_mut().unwrap().push(r.clone()),
            Event::Pause(d) => {
                assert_eq!(*d, Duration::from_secs(30));
                batches.push(Vec::new());
            }
        }
    }
    let sizes: Vec<_> = batches.iter().map(|b| b.len()).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(batches[2], vec!["/m/5".to_string()]);
}

#[test]
fn failed_fetch_aborts_before_next_batch_and_writes_nothing() {
    let mut source = five_fixture_source();
    source.fail_on.insert("/m/3".to_string());
    let scheduler = recording_scheduler(2, source.events.clone());
    let store = SqliteStore::in_memory().unwrap();

    let result = Ingestion::new(&store, &source, &scheduler)
        .with_today(today())
        .ingest_team_fixtures("18bb7c10");

    assert!(matches!(result, Err(IngestError::Extraction { .. })));
    assert!(!source.fetched().contains(&"/m/5".to_string()));
    let pauses = source
        .events
        .lock()
        .unwrap()
        .iter()
        .filter(|e| matches!(e, Event::Pause(_)))
        .count();
    assert_eq!(pauses, 1);
    assert_eq!(store.count_matches().unwrap(), 0);
    assert!(store.list_teams().unwrap().is_empty());
}

#[test]
fn rate_limited_discovery_extracts_nothing() {
    let mut source = five_fixture_source();
    source.rate_limited = true;
    let scheduler = recording_scheduler(3, source.events.clone());
    let store = SqliteStore::in_memory().unwrap();

    let result = Ingestion::new(&store, &source, &scheduler)
        .with_today(today())
        .ingest_team_fixtures_for_season("18bb7c10", "2023-2024");

    assert!(matches!(result, Err(IngestError::RateLimited { .. })));
    assert!(source.events.lock().unwrap().is_empty());
    assert_eq!(store.count_matches().unwrap(), 0);
}

#[test]
fn reingesting_is_a_no_op() {
    let source = five_fixture_source();
    let scheduler = recording_scheduler(3, source.events.clone());
    let store = SqliteStore::in_memory().unwrap();
    let ingestion = Ingestion::new(&store, &source, &scheduler).with_today(today());

    let first = ingestion.ingest_team_fixtures("18bb7c10").unwrap();
    assert_eq!(first.len(), 5);
    assert!(first.iter().all(CreateOutcome::is_created));
    assert_eq!(store.count_matches().unwrap(), 5);
    assert_eq!(store.list_teams().unwrap().len(), 4);

    let second = ingestion.ingest_team_fixtures("18bb7c10").unwrap();
    assert_eq!(second.len(), 5);
    assert!(
        second
            .iter()
            .all(|o| matches!(o, CreateOutcome::AlreadyExists { .. }))
    );
    assert_eq!(store.count_matches().unwrap(), 5);
    assert_eq!(store.list_teams().unwrap().len(), 4);
}

#[test]
fn future_fixtures_are_skipped() {
    let source = five_fixture_source();
    let scheduler = recording_scheduler(2, source.events.clone());
    let store = SqliteStore::in_memory().unwrap();

    let outcomes = Ingestion::new(&store, &source, &scheduler)
        .with_today(NaiveDate::from_ymd_opt(2023, 8, 26).unwrap())
        .ingest_team_fixtures("18bb7c10")
        .unwrap();

    assert_eq!(outcomes.len(), 2);
    assert_eq!(source.fetched().len(), 2);
}

#[test]
fn duplicate_reference_returns_already_exists() {
    let store = SqliteStore::in_memory().unwrap();
    let ingestor = Ingestor::new(&store);
    let raw = record("/m/1", "20230812", "Arsenal", "Chelsea", 2, 1);

    assert!(ingestor.create_match(&raw).unwrap().is_created());
    let again = ingestor.create_match(&raw).unwrap();
    assert_eq!(
        again,
        CreateOutcome::AlreadyExists {
            match_reference: "/m/1".to_string()
        }
    );
    assert_eq!(store.count_matches().unwrap(), 1);
}

#[test]
fn winner_matches_goal_comparison() {
    let store = SqliteStore::in_memory().unwrap();
    let ingestor = Ingestor::new(&store);
    let cases = [
        (record("/w/1", "20230812", "Arsenal", "Chelsea", 2, 1), "Arsenal"),
        (record("/w/2", "20230812", "Arsenal", "Chelsea", 0, 1), "Chelsea"),
        (record("/w/3", "20230812", "Arsenal", "Chelsea", 10, 2), "Arsenal"),
        (record("/w/4", "20230812", "Arsenal", "Chelsea", 3, 3), DRAW),
    ];
    for (raw, expected) in cases {
        let CreateOutcome::Created(processed) = ingestor.create_match(&raw).unwrap() else {
            panic!("expected a new match");
        };
        assert_eq!(processed.stored.winner, expected);
    }
}

#[test]
fn teams_are_created_only_on_first_sighting() {
    let store = SqliteStore::in_memory().unwrap();
    let ingestor = Ingestor::new(&store);

    ingestor
        .create_match(&record("/t/1", "20230812", "Arsenal", "Chelsea", 1, 0))
        .unwrap();
    assert_eq!(store.list_teams().unwrap().len(), 2);

    ingestor
        .create_match(&record("/t/2", "20230819", "Chelsea", "Arsenal", 1, 0))
        .unwrap();
    assert_eq!(store.list_teams().unwrap().len(), 2);

    ingestor
        .create_match(&record("/t/3", "20230826", "Liverpool", "Arsenal", 1, 0))
        .unwrap();
    let teams = store.list_teams().unwrap();
    assert_eq!(teams.len(), 3);
    assert!(teams.iter().any(|t| t.name == "Liverpool" && t.id.as_str() == "822bd0ba"));
}

#[test]
fn non_breaking_space_in_team_name_resolves_to_same_team() {
    let store = SqliteStore::in_memory().unwrap();
    let ingestor = Ingestor::new(&store);
    let mut plain = record("/nb/1", "20230812", "Arsenal", "Chelsea", 1, 0);
    plain.away_team = "Crystal Palace".to_string();
    plain.away_team_link = Some("/en/squads/47c64c55/Crystal-Palace-Stats".to_string());
    ingestor.create_match(&plain).unwrap();

    let mut spaced = record("/nb/2", "20230819", "Crystal Palace", "Arsenal", 0, 2);
    spaced.home_team = "Crystal\u{a0}Palace".to_string();
    spaced.home_team_link = Some("/en/squads/47c64c55/Crystal-Palace-Stats".to_string());
    let CreateOutcome::Created(processed) = ingestor.create_match(&spaced).unwrap() else {
        panic!("expected a new match");
    };

    assert_eq!(processed.stored.home_team_id.as_str(), "47c64c55");
    assert_eq!(processed.stored.winner, "Arsenal");
    let teams = store.list_teams().unwrap();
    assert_eq!(teams.len(), 2);
    assert!(teams.iter().any(|t| t.name == "Crystal Palace"));
}

#[test]
fn malformed_goals_write_nothing() {
    let store = SqliteStore::in_memory().unwrap();
    let mut raw = record("/bad/1", "20230812", "Arsenal", "Chelsea", 1, 0);
    raw.home_goals = String::new();

    let err = Ingestor::new(&store).create_match(&raw).unwrap_err();
    assert!(matches!(err, IngestError::Extraction { field: "homeGoals", .. }));
    assert_eq!(store.count_matches().unwrap(), 0);
    assert!(store.list_teams().unwrap().is_empty());
}

#[test]
fn cancelled_run_stops_between_batches() {
    let source = five_fixture_source();
    let token = CancelToken::new();
    let trigger = token.clone();
    let events = source.events.clone();
    let scheduler = BatchScheduler::new(2, Duration::ZERO)
        .unwrap()
        .with_cancel_token(token)
        .with_pause(move |d| {
            events.lock().unwrap().push(Event::Pause(d));
            trigger.cancel();
        });

    let err = scheduler.run(&source.fixtures, &source).unwrap_err();
    assert!(matches!(err, IngestError::Cancelled { completed: 2, total: 5 }));
    assert_eq!(source.fetched().len(), 2);
}
