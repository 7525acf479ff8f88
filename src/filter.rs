use chrono::NaiveDate;
use rusqlite::types::Value as SqlValue;
use serde::{Deserialize, Serialize};

use crate::model::TeamId;

// Unset fields do not constrain the selection; an empty filter selects every match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchFilter {
    pub season: Option<String>,
    pub competition: Option<String>,
    pub team_id: Option<TeamId>,
    pub home_team_id: Option<TeamId>,
    pub away_team_id: Option<TeamId>,
    pub home_manager: Option<String>,
    pub away_manager: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl MatchFilter {
    pub fn is_empty(&self) -> bool {
        *self == MatchFilter::default()
    }

    pub fn to_sql(&self) -> (String, Vec<SqlValue>) {
        let mut clauses: Vec<&'static str> = Vec::new();
        let mut values: Vec<SqlValue> = Vec::new();

        if let Some(season) = &self.season {
            clauses.push("season = ?");
            values.push(SqlValue::Text(season.clone()));
        }
        if let Some(competition) = &self.competition {
            clauses.push("competition = ?");
            values.push(SqlValue::Text(competition.clone()));
        }
        if let Some(team) = &self.team_id {
            clauses.push("(home_team_id = ? OR away_team_id = ?)");
            values.push(SqlValue::Text(team.0.clone()));
            values.push(SqlValue::Text(team.0.clone()));
        }
        if let Some(team) = &self.home_team_id {
            clauses.push("home_team_id = ?");
            values.push(SqlValue::Text(team.0.clone()));
        }
        if let Some(team) = &self.away_team_id {
            clauses.push("away_team_id = ?");
            values.push(SqlValue::Text(team.0.clone()));
        }
        if let Some(manager) = &self.home_manager {
            clauses.push("home_manager = ?");
            values.push(SqlValue::Text(manager.clone()));
        }
        if let Some(manager) = &self.away_manager {
            clauses.push("away_manager = ?");
            values.push(SqlValue::Text(manager.clone()));
        }
        if let Some(from) = self.date_from {
            clauses.push("date >= ?");
            values.push(SqlValue::Text(from.to_string()));
        }
        if let Some(to) = self.date_to {
            clauses.push("date <= ?");
            values.push(SqlValue::Text(to.to_string()));
        }

        if clauses.is_empty() {
            return ("1 = 1".to_string(), values);
        }
        (clauses.join(" AND "), values)
    }
}
