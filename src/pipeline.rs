use log::{debug, info};
use serde::Serialize;

use crate::error::{IngestError, Result};
use crate::model::{Match, NewMatch, NewPlayerStat, PlayerMatchStat, Side, winner_label};
use crate::parse::{parse_decimal, parse_goals, parse_int, parse_match_date};
use crate::resolver::TeamResolver;
use crate::source::{RawMatchRecord, RawPlayerLine};
use crate::store::MatchStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedMatch {
    #[serde(rename = "match")]
    pub stored: Match,
    pub player_stats: Vec<PlayerMatchStat>,
}

/// Result of one `create_match` call. A known fixture is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CreateOutcome {
    Created(ProcessedMatch),
    #[serde(rename_all = "camelCase")]
    AlreadyExists { match_reference: String },
}

impl CreateOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, CreateOutcome::Created(_))
    }
}

pub struct Ingestor<'a, S: MatchStore + ?Sized> {
    store: &'a S,
    resolver: TeamResolver<'a, S>,
}

impl<'a, S: MatchStore + ?Sized> Ingestor<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            resolver: TeamResolver::new(store),
        }
    }

    pub fn create_match(&self, raw: &RawMatchRecord) -> Result<CreateOutcome> {
        let reference = raw.match_reference.trim();
        if reference.is_empty() {
            return Err(IngestError::Validation {
                field: "matchReference",
            });
        }

        if self.store.find_match_by_reference(reference)?.is_some() {
            debug!("{reference} already stored");
            return Ok(CreateOutcome::AlreadyExists {
                match_reference: reference.to_string(),
            });
        }

        let date = parse_match_date(&raw.date).required("date")?;
        let home_goals = parse_goals(&raw.home_goals).required("homeGoals")?;
        let away_goals = parse_goals(&raw.away_goals).required("awayGoals")?;
        let player_stats = raw
            .player_lines
            .iter()
            .map(normalize_player_line)
            .collect::<Result<Vec<_>>>()?;

        let home_name = clean_text(&raw.home_team);
        let away_name = clean_text(&raw.away_team);
        let home_team_id = self.resolver.resolve(&home_name, Side::Home, raw)?;
        let away_team_id = self.resolver.resolve(&away_name, Side::Away, raw)?;

        let new_match = NewMatch {
            date,
            home_team_id,
            away_team_id,
            home_goals,
            away_goals,
            winner: winner_label(&home_name, &away_name, home_goals, away_goals),
            home_manager: clean_text(&raw.home_manager),
            away_manager: clean_text(&raw.away_manager),
            match_reference: reference.to_string(),
            season: raw.season.trim().to_string(),
            competition: clean_text(&raw.competition),
        };

        let (stored, player_stats) = self.store.create_match(&new_match, &player_stats)?;
        info!(
            "stored {} {} {}-{} {} ({} player rows)",
            stored.date,
            home_name,
            stored.home_goals,
            stored.away_goals,
            away_name,
            player_stats.len()
        );
        Ok(CreateOutcome::Created(ProcessedMatch {
            stored,
            player_stats,
        }))
    }

    pub fn create_all(&self, records: &[RawMatchRecord]) -> Result<Vec<CreateOutcome>> {
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            out.push(self.create_match(record)?);
        }
        Ok(out)
    }
}

fn normalize_player_line(line: &RawPlayerLine) -> Result<NewPlayerStat> {
    let player_name = line.name.as_deref().map(clean_text).unwrap_or_default();
    if player_name.is_empty() {
        return Err(IngestError::Validation {
            field: "playerName",
        });
    }
    Ok(NewPlayerStat {
        player_name,
        minutes_played: parse_int(line.minutes_played.as_deref()).or_default(),
        goals: parse_int(line.goals.as_deref()).or_default(),
        assists: parse_int(line.assists.as_deref()).or_default(),
        converted_penalties: parse_int(line.converted_penalties.as_deref()).or_default(),
        attempted_penalties: parse_int(line.attempted_penalties.as_deref()).or_default(),
        shots: parse_int(line.shots.as_deref()).or_default(),
        shots_on_target: parse_int(line.shots_on_target.as_deref()).or_default(),
        xg: parse_decimal(line.xg.as_deref()).or_default(),
        npxg: parse_decimal(line.npxg.as_deref()).or_default(),
        xag: parse_decimal(line.xag.as_deref()).or_default(),
    })
}

// Pages render non-breaking spaces inside names.
fn clean_text(raw: &str) -> String {
    raw.replace('\u{a0}', " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_line_defaults_unparseable_numbers() {
        let line = RawPlayerLine {
            name: Some("Bukayo\u{a0}Saka".to_string()),
            minutes_played: Some("90".to_string()),
            goals: Some("1".to_string()),
            assists: None,
            shots: Some("".to_string()),
            shots_on_target: Some("x".to_string()),
            xg: Some("0.4".to_string()),
            npxg: None,
            xag: Some("-".to_string()),
            ..RawPlayerLine::default()
        };
        let stat = normalize_player_line(&line).unwrap();
        assert_eq!(stat.player_name, "Bukayo Saka");
        assert_eq!(stat.minutes_played, 90);
        assert_eq!(stat.goals, 1);
        assert_eq!(stat.assists, 0);
        assert_eq!(stat.shots, 0);
        assert_eq!(stat.shots_on_target, 0);
        assert_eq!(stat.xg, 0.4);
        assert_eq!(stat.npxg, 0.0);
        assert_eq!(stat.xag, 0.0);
    }

    #[test]
    fn unnamed_player_line_is_rejected() {
        let err = normalize_player_line(&RawPlayerLine::default()).unwrap_err();
        assert!(matches!(err, IngestError::Validation { field: "playerName" }));
    }
}
