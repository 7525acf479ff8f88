use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{IngestError, Result};
use crate::http_client::build_http_client;
use crate::model::Side;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRef {
    pub team: String,
    pub season: Option<String>,
}

impl ScheduleRef {
    pub fn all_competitions(team: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            season: None,
        }
    }

    pub fn season(team: impl Into<String>, season: impl Into<String>) -> Self {
        Self {
            team: team.into(),
            season: Some(season.into()),
        }
    }

    fn key(&self) -> String {
        match self.season.as_deref() {
            Some(season) => format!("{}/{}", self.team, season),
            None => self.team.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixtureLink {
    pub match_reference: String,
    pub raw_date: String,
    pub season: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPlayerLine {
    pub name: Option<String>,
    pub minutes_played: Option<String>,
    pub goals: Option<String>,
    pub assists: Option<String>,
    pub converted_penalties: Option<String>,
    pub attempted_penalties: Option<String>,
    pub shots: Option<String>,
    pub shots_on_target: Option<String>,
    #[serde(rename = "xG")]
    pub xg: Option<String>,
    #[serde(rename = "npxG")]
    pub npxg: Option<String>,
    #[serde(rename = "xAG")]
    pub xag: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawMatchRecord {
    pub date: String,
    pub match_reference: String,
    pub season: String,
    pub competition: String,
    pub home_team: String,
    pub away_team: String,
    pub home_team_link: Option<String>,
    pub away_team_link: Option<String>,
    pub home_goals: String,
    pub away_goals: String,
    pub home_manager: String,
    pub away_manager: String,
    pub player_lines: Vec<RawPlayerLine>,
}

impl RawMatchRecord {
    pub fn team_link(&self, side: Side) -> Option<&str> {
        match side {
            Side::Home => self.home_team_link.as_deref(),
            Side::Away => self.away_team_link.as_deref(),
        }
    }
}

pub trait MatchSource: Sync {
    fn list_fixtures(&self, schedule: &ScheduleRef) -> Result<Vec<FixtureLink>>;

    fn extract_match(&self, fixture: &FixtureLink) -> Result<RawMatchRecord>;
}

pub fn parse_fixture_list(raw: &str) -> Result<Vec<FixtureLink>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let v: Value = serde_json::from_str(trimmed)?;
    let default_season = v
        .get("season")
        .and_then(|s| s.as_str())
        .map(normalize_season)
        .unwrap_or_default();

    let Some(items) = v.get("fixtures").and_then(|f| f.as_array()) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let notes = item
            .get("notes")
            .and_then(|n| n.as_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        if notes.contains("cancelled") || notes.contains("awarded") {
            continue;
        }
        let Some(match_reference) = item.get("matchReference").and_then(|x| x.as_str()) else {
            continue;
        };
        let raw_date = item
            .get("date")
            .and_then(|x| x.as_str())
            .unwrap_or_default()
            .to_string();
        let season = item
            .get("season")
            .and_then(|x| x.as_str())
            .map(normalize_season)
            .unwrap_or_else(|| default_season.clone());
        out.push(FixtureLink {
            match_reference: match_reference.to_string(),
            raw_date,
            season,
        });
    }
    Ok(out)
}

// Schedule headings read like "2023-2024 Arsenal Stats"; keep the leading season.
fn normalize_season(raw: &str) -> String {
    raw.chars()
        .take(9)
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect()
}

pub struct HttpMatchSource {
    client: Client,
    base_url: String,
}

impl HttpMatchSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url,
        })
    }

    fn schedule_url(&self, schedule: &ScheduleRef) -> String {
        match schedule.season.as_deref() {
            Some(season) => format!(
                "{}/en/squads/{}/{}/all_comps",
                self.base_url, schedule.team, season
            ),
            None => format!("{}/en/squads/{}/all_comps", self.base_url, schedule.team),
        }
    }

    fn match_url(&self, reference: &str) -> String {
        if reference.starts_with("http") {
            reference.to_string()
        } else if reference.starts_with('/') {
            format!("{}{}", self.base_url, reference)
        } else {
            format!("{}/{}", self.base_url, reference)
        }
    }

    fn get_text(&self, url: &str, reference: &str, entity: &'static str) -> Result<String> {
        let resp = self.client.get(url).send()?;
        if let Some(err) = status_error(resp.status(), reference, entity) {
            return Err(err);
        }
        Ok(resp.error_for_status()?.text()?)
    }
}

fn status_error(status: StatusCode, reference: &str, entity: &'static str) -> Option<IngestError> {
    match status {
        StatusCode::TOO_MANY_REQUESTS => Some(IngestError::RateLimited {
            reference: reference.to_string(),
        }),
        StatusCode::NOT_FOUND => Some(IngestError::not_found(entity, reference)),
        _ => None,
    }
}

impl MatchSource for HttpMatchSource {
    fn list_fixtures(&self, schedule: &ScheduleRef) -> Result<Vec<FixtureLink>> {
        let url = self.schedule_url(schedule);
        let body = self.get_text(&url, &schedule.key(), "schedule")?;
        parse_fixture_list(&body)
    }

    fn extract_match(&self, fixture: &FixtureLink) -> Result<RawMatchRecord> {
        let url = self.match_url(&fixture.match_reference);
        let body = self.get_text(&url, &fixture.match_reference, "fixture")?;
        let mut record: RawMatchRecord = serde_json::from_str(body.trim())?;
        fill_from_fixture(&mut record, fixture);
        Ok(record)
    }
}

// Schedule-level fields win over whatever the match payload carried.
fn fill_from_fixture(record: &mut RawMatchRecord, fixture: &FixtureLink) {
    record.match_reference = fixture.match_reference.clone();
    record.date = fixture.raw_date.clone();
    record.season = fixture.season.clone();
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Snapshot {
    #[serde(default)]
    schedules: HashMap<String, Value>,
    #[serde(default)]
    matches: HashMap<String, RawMatchRecord>,
}

/// Replays a JSON snapshot: `{ "schedules": { "<team>[/<season>]": <schedule> }, "matches": { "<ref>": <record> } }`.
pub struct FileMatchSource {
    schedules: HashMap<String, Vec<FixtureLink>>,
    matches: HashMap<String, RawMatchRecord>,
}

impl FileMatchSource {
    pub fn open(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(raw)?;
        let mut schedules = HashMap::with_capacity(snapshot.schedules.len());
        for (key, value) in snapshot.schedules {
            schedules.insert(key, parse_fixture_list(&value.to_string())?);
        }
        Ok(Self {
            schedules,
            matches: snapshot.matches,
        })
    }
}

impl MatchSource for FileMatchSource {
    fn list_fixtures(&self, schedule: &ScheduleRef) -> Result<Vec<FixtureLink>> {
        let key = schedule.key();
        self.schedules
            .get(&key)
            .cloned()
            .ok_or_else(|| IngestError::not_found("schedule", key))
    }

    fn extract_match(&self, fixture: &FixtureLink) -> Result<RawMatchRecord> {
        let mut record = self
            .matches
            .get(&fixture.match_reference)
            .cloned()
            .ok_or_else(|| IngestError::not_found("fixture", fixture.match_reference.clone()))?;
        fill_from_fixture(&mut record, fixture);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_list_skips_cancelled_and_awarded() {
        let raw = r#"{
            "season": "2022-2023 Arsenal Stats",
            "fixtures": [
                {"matchReference": "/en/matches/a", "date": "20220805"},
                {"matchReference": "/en/matches/b", "date": "20220813", "notes": "Match Cancelled"},
                {"matchReference": "/en/matches/c", "date": "20220820", "notes": "Match awarded to Arsenal"},
                {"date": "20220827"},
                {"matchReference": "/en/matches/d", "date": "20220903", "season": "2022-2023"}
            ]
        }"#;
        let rows = parse_fixture_list(raw).unwrap();
        let refs: Vec<_> = rows.iter().map(|r| r.match_reference.as_str()).collect();
        assert_eq!(refs, vec!["/en/matches/a", "/en/matches/d"]);
        assert_eq!(rows[0].season, "2022-2023");
        assert_eq!(rows[0].raw_date, "20220805");
    }

    #[test]
    fn null_schedule_is_empty() {
        assert!(parse_fixture_list("null").unwrap().is_empty());
        assert!(parse_fixture_list("{}").unwrap().is_empty());
    }

    #[test]
    fn file_source_fills_fixture_fields() {
        let raw = r#"{
            "schedules": {
                "18bb7c10/2022-2023": {"season": "2022-2023", "fixtures": [
                    {"matchReference": "/en/matches/a", "date": "20220805"}
                ]}
            },
            "matches": {
                "/en/matches/a": {"homeTeam": "Crystal Palace", "awayTeam": "Arsenal",
                    "homeGoals": "0", "awayGoals": "2", "competition": "Premier League"}
            }
        }"#;
        let source = FileMatchSource::from_json(raw).unwrap();
        let fixtures = source
            .list_fixtures(&ScheduleRef::season("18bb7c10", "2022-2023"))
            .unwrap();
        assert_eq!(fixtures.len(), 1);
        let record = source.extract_match(&fixtures[0]).unwrap();
        assert_eq!(record.match_reference, "/en/matches/a");
        assert_eq!(record.date, "20220805");
        assert_eq!(record.season, "2022-2023");

        let missing = source.list_fixtures(&ScheduleRef::all_competitions("nope"));
        assert!(matches!(missing, Err(IngestError::NotFound { .. })));
    }

    #[test]
    fn status_codes_map_to_source_errors() {
        let limited = status_error(StatusCode::TOO_MANY_REQUESTS, "18bb7c10", "schedule");
        assert!(matches!(
            limited,
            Some(IngestError::RateLimited { ref reference }) if reference == "18bb7c10"
        ));
        let missing = status_error(StatusCode::NOT_FOUND, "/en/matches/a", "fixture");
        assert!(matches!(
            missing,
            Some(IngestError::NotFound { entity: "fixture", ref key }) if key == "/en/matches/a"
        ));
        assert!(status_error(StatusCode::OK, "x", "fixture").is_none());
        assert!(status_error(StatusCode::INTERNAL_SERVER_ERROR, "x", "fixture").is_none());
    }
}
