use std::cmp::Ordering;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DRAW: &str = "Draw";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Home => f.write_str("home"),
            Side::Away => f.write_str("away"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: i64,
    pub date: NaiveDate,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_goals: u32,
    pub away_goals: u32,
    pub winner: String,
    pub home_manager: String,
    pub away_manager: String,
    pub match_reference: String,
    pub season: String,
    pub competition: String,
}

impl Match {
    pub fn is_draw(&self) -> bool {
        self.winner == DRAW
    }

    pub fn total_goals(&self) -> u32 {
        self.home_goals + self.away_goals
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMatch {
    pub date: NaiveDate,
    pub home_team_id: TeamId,
    pub away_team_id: TeamId,
    pub home_goals: u32,
    pub away_goals: u32,
    pub winner: String,
    pub home_manager: String,
    pub away_manager: String,
    pub match_reference: String,
    pub season: String,
    pub competition: String,
}

impl NewMatch {
    pub fn into_match(self, id: i64) -> Match {
        Match {
            id,
            date: self.date,
            home_team_id: self.home_team_id,
            away_team_id: self.away_team_id,
            home_goals: self.home_goals,
            away_goals: self.away_goals,
            winner: self.winner,
            home_manager: self.home_manager,
            away_manager: self.away_manager,
            match_reference: self.match_reference,
            season: self.season,
            competition: self.competition,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMatchStat {
    pub id: i64,
    pub match_id: i64,
    pub player_name: String,
    pub minutes_played: i64,
    pub goals: i64,
    pub assists: i64,
    pub converted_penalties: i64,
    pub attempted_penalties: i64,
    pub shots: i64,
    pub shots_on_target: i64,
    #[serde(rename = "xG")]
    pub xg: f64,
    #[serde(rename = "npxG")]
    pub npxg: f64,
    #[serde(rename = "xAG")]
    pub xag: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPlayerStat {
    pub player_name: String,
    pub minutes_played: i64,
    pub goals: i64,
    pub assists: i64,
    pub converted_penalties: i64,
    pub attempted_penalties: i64,
    pub shots: i64,
    pub shots_on_target: i64,
    pub xg: f64,
    pub npxg: f64,
    pub xag: f64,
}

impl NewPlayerStat {
    pub fn into_stat(self, id: i64, match_id: i64) -> PlayerMatchStat {
        PlayerMatchStat {
            id,
            match_id,
            player_name: self.player_name,
            minutes_played: self.minutes_played,
            goals: self.goals,
            assists: self.assists,
            converted_penalties: self.converted_penalties,
            attempted_penalties: self.attempted_penalties,
            shots: self.shots,
            shots_on_target: self.shots_on_target,
            xg: self.xg,
            npxg: self.npxg,
            xag: self.xag,
        }
    }
}

pub fn winner_label(home_name: &str, away_name: &str, home_goals: u32, away_goals: u32) -> String {
    match home_goals.cmp(&away_goals) {
        Ordering::Greater => home_name.to_string(),
        Ordering::Less => away_name.to_string(),
        Ordering::Equal => DRAW.to_string(),
    }
}
