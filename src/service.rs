use chrono::{Local, NaiveDate};
use log::{debug, info};

use crate::error::{IngestError, Result};
use crate::filter::MatchFilter;
use crate::model::{Side, Team, TeamId};
use crate::parse::{FieldValue, parse_match_date};
use crate::pipeline::{CreateOutcome, Ingestor};
use crate::scheduler::BatchScheduler;
use crate::source::{FixtureLink, MatchSource, ScheduleRef};
use crate::stats::{StatsReport, StoreLookup, compute_stats};
use crate::store::MatchStore;

pub struct Ingestion<'a, S: MatchStore + ?Sized, M: MatchSource + ?Sized> {
    store: &'a S,
    source: &'a M,
    scheduler: &'a BatchScheduler,
    today: Option<NaiveDate>,
}

impl<'a, S: MatchStore + ?Sized, M: MatchSource + ?Sized> Ingestion<'a, S, M> {
    pub fn new(store: &'a S, source: &'a M, scheduler: &'a BatchScheduler) -> Self {
        Self {
            store,
            source,
            scheduler,
            today: None,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn ingest_team_fixtures(&self, team: &str) -> Result<Vec<CreateOutcome>> {
        self.ingest(&ScheduleRef::all_competitions(team))
    }

    pub fn ingest_team_fixtures_for_season(
        &self,
        team: &str,
        season: &str,
    ) -> Result<Vec<CreateOutcome>> {
        self.ingest(&ScheduleRef::season(team, season))
    }

    pub fn ingest(&self, schedule: &ScheduleRef) -> Result<Vec<CreateOutcome>> {
        if schedule.team.trim().is_empty() {
            return Err(IngestError::Validation { field: "team" });
        }

        let fixtures = self.source.list_fixtures(schedule)?;
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let played = played_before(fixtures, today);
        info!(
            "{} fixtures to ingest for {}{}",
            played.len(),
            schedule.team,
            schedule
                .season
                .as_deref()
                .map(|s| format!(" ({s})"))
                .unwrap_or_default()
        );

        let records = self.scheduler.run(&played, self.source)?;
        let outcomes = Ingestor::new(self.store).create_all(&records)?;

        let created = outcomes.iter().filter(|o| o.is_created()).count();
        info!(
            "ingested {} new matches, {} already stored",
            created,
            outcomes.len() - created
        );
        Ok(outcomes)
    }
}

// Keeps fixtures dated strictly before `today`; undated entries are dropped.
pub fn played_before(fixtures: Vec<FixtureLink>, today: NaiveDate) -> Vec<FixtureLink> {
    fixtures
        .into_iter()
        .filter(|f| match parse_match_date(&f.raw_date) {
            FieldValue::Parsed(date) => date < today,
            _ => false,
        })
        .collect()
}

pub fn get_aggregate_stats<S: MatchStore + ?Sized>(
    store: &S,
    filter: &MatchFilter,
) -> Result<StatsReport> {
    let matches = store.find_matches(filter)?;
    if filter.is_empty() {
        debug!("aggregating all {} stored matches", matches.len());
    } else {
        debug!("aggregating {} matches for {:?}", matches.len(), filter);
    }
    compute_stats(&matches, &StoreLookup(store))
}

pub fn home_managers<S: MatchStore + ?Sized>(store: &S) -> Result<Vec<String>> {
    store.distinct_managers(Side::Home)
}

pub fn away_managers<S: MatchStore + ?Sized>(store: &S) -> Result<Vec<String>> {
    store.distinct_managers(Side::Away)
}

pub fn list_teams<S: MatchStore + ?Sized>(store: &S) -> Result<Vec<Team>> {
    store.list_teams()
}

pub fn team_by_id<S: MatchStore + ?Sized>(store: &S, id: &str) -> Result<Team> {
    if id.trim().is_empty() {
        return Err(IngestError::Validation { field: "id" });
    }
    store
        .find_team_by_id(&TeamId(id.trim().to_string()))?
        .ok_or_else(|| IngestError::not_found("team", id))
}
