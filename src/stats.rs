use std::collections::HashMap;

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::error::{IngestError, Result};
use crate::model::{Match, TeamId};
use crate::store::MatchStore;

pub const THRESHOLDS: usize = 5;

const THRESHOLD_KEYS: [&str; THRESHOLDS] =
    ["atLeast1", "atLeast2", "atLeast3", "atLeast4", "atLeast5"];

pub trait TeamLookup {
    fn team_name(&self, id: &TeamId) -> Result<Option<String>>;
}

impl TeamLookup for HashMap<TeamId, String> {
    fn team_name(&self, id: &TeamId) -> Result<Option<String>> {
        Ok(self.get(id).cloned())
    }
}

pub struct StoreLookup<'a, S: ?Sized>(pub &'a S);

impl<S: MatchStore + ?Sized> TeamLookup for StoreLookup<'_, S> {
    fn team_name(&self, id: &TeamId) -> Result<Option<String>> {
        Ok(self.0.find_team_by_id(id)?.map(|t| t.name))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Share {
    Percent(f64),
    NoData,
}

impl Share {
    pub fn of(count: u32, total: u32) -> Self {
        if total == 0 {
            return Share::NoData;
        }
        Share::Percent(round2(f64::from(count) / f64::from(total) * 100.0))
    }
}

impl Serialize for Share {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Share::Percent(v) => serializer.serialize_str(&format!("{v:.2}%")),
            Share::NoData => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FairOdds {
    Decimal(f64),
    Undefined,
}

impl FairOdds {
    pub fn of(count: u32, total: u32) -> Self {
        if count == 0 || total == 0 {
            return FairOdds::Undefined;
        }
        let p = f64::from(count) / f64::from(total);
        FairOdds::Decimal(round2(1.0 / p))
    }
}

impl Serialize for FairOdds {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FairOdds::Decimal(v) => serializer.serialize_str(&format!("{v:.2}")),
            FairOdds::Undefined => serializer.serialize_str("undefined"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerThreshold<T>(pub [T; THRESHOLDS]);

impl<T: Copy> PerThreshold<T> {
    pub fn at_least(&self, n: usize) -> T {
        self.0[n - 1]
    }

    fn map<U>(&self, f: impl Fn(T) -> U) -> PerThreshold<U> {
        PerThreshold(self.0.map(f))
    }
}

impl PerThreshold<u32> {
    fn record(&mut self, goals: u32) {
        let reached = (goals as usize).min(THRESHOLDS);
        for slot in self.0.iter_mut().take(reached) {
            *slot += 1;
        }
    }
}

impl<T: Serialize> Serialize for PerThreshold<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(THRESHOLDS))?;
        for (key, value) in THRESHOLD_KEYS.iter().zip(self.0.iter()) {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GoalSummary {
    pub average: Option<f64>,
    pub min: Option<u32>,
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FairOddsReport {
    pub home_team_wins: FairOdds,
    pub home_or_away_wins: FairOdds,
    pub home_or_draws: FairOdds,
    pub draws: FairOdds,
    pub away_or_draws: FairOdds,
    pub away_team_wins: FairOdds,
    pub both_scored: FairOdds,
    pub not_both_scored: FairOdds,
    pub home_team_goals_over: PerThreshold<FairOdds>,
    pub away_team_goals_over: PerThreshold<FairOdds>,
    pub game_total_over: PerThreshold<FairOdds>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub games: u32,
    pub home_team_wins: u32,
    pub draws: u32,
    pub away_team_wins: u32,
    pub home_team_win_percentage: Share,
    pub home_or_away_win_percentage: Share,
    pub home_or_draws_percentage: Share,
    pub draws_percentage: Share,
    pub away_or_draws_percentage: Share,
    pub away_team_win_percentage: Share,
    pub home_team_goals: GoalSummary,
    pub away_team_goals: GoalSummary,
    pub both_scored: u32,
    pub both_scored_percentage: Share,
    pub not_both_scored_percentage: Share,
    pub home_team_goals_over: PerThreshold<u32>,
    pub home_team_goals_over_percentage: PerThreshold<Share>,
    pub away_team_goals_over: PerThreshold<u32>,
    pub away_team_goals_over_percentage: PerThreshold<Share>,
    pub game_total_over: PerThreshold<u32>,
    pub game_total_over_percentage: PerThreshold<Share>,
    pub fair_odds: FairOddsReport,
}

impl StatsReport {
    pub fn is_empty(&self) -> bool {
        self.games == 0
    }
}

#[derive(Default)]
struct Tally {
    games: u32,
    home_wins: u32,
    away_wins: u32,
    draws: u32,
    both_scored: u32,
    home_goals: GoalTally,
    away_goals: GoalTally,
    home_over: PerThreshold<u32>,
    away_over: PerThreshold<u32>,
    total_over: PerThreshold<u32>,
}

impl Default for PerThreshold<u32> {
    fn default() -> Self {
        PerThreshold([0; THRESHOLDS])
    }
}

#[derive(Default)]
struct GoalTally {
    sum: u64,
    min: Option<u32>,
    max: Option<u32>,
}

impl GoalTally {
    fn push(&mut self, goals: u32) {
        self.sum += u64::from(goals);
        self.min = Some(self.min.map_or(goals, |m| m.min(goals)));
        self.max = Some(self.max.map_or(goals, |m| m.max(goals)));
    }

    fn summary(&self, games: u32) -> GoalSummary {
        GoalSummary {
            average: (games > 0).then(|| round2(self.sum as f64 / f64::from(games))),
            min: self.min,
            max: self.max,
        }
    }
}

/// Aggregates an already-filtered set of matches.
pub fn compute_stats<L: TeamLookup + ?Sized>(matches: &[Match], lookup: &L) -> Result<StatsReport> {
    let mut names: HashMap<TeamId, String> = HashMap::new();
    let mut t = Tally::default();

    for m in matches {
        t.games += 1;

        if m.is_draw() {
            t.draws += 1;
        } else {
            if !names.contains_key(&m.home_team_id) {
                let name = lookup
                    .team_name(&m.home_team_id)?
                    .ok_or_else(|| IngestError::not_found("team", m.home_team_id.0.clone()))?;
                names.insert(m.home_team_id.clone(), name);
            }
            if names.get(&m.home_team_id) == Some(&m.winner) {
                t.home_wins += 1;
            } else {
                t.away_wins += 1;
            }
        }

        t.home_goals.push(m.home_goals);
        t.away_goals.push(m.away_goals);

        if m.home_goals > 0 || m.away_goals > 0 {
            t.total_over.record(m.total_goals());
            if m.home_goals > 0 && m.away_goals > 0 {
                t.both_scored += 1;
            }
        }

        t.home_over.record(m.home_goals);
        t.away_over.record(m.away_goals);
    }

    Ok(build_report(&t))
}

fn build_report(t: &Tally) -> StatsReport {
    let n = t.games;
    let not_both = n - t.both_scored;
    let share = |count: u32| Share::of(count, n);
    let odds = |count: u32| FairOdds::of(count, n);

    StatsReport {
        games: n,
        home_team_wins: t.home_wins,
        draws: t.draws,
        away_team_wins: t.away_wins,
        home_team_win_percentage: share(t.home_wins),
        home_or_away_win_percentage: share(t.home_wins + t.away_wins),
        home_or_draws_percentage: share(t.home_wins + t.draws),
        draws_percentage: share(t.draws),
        away_or_draws_percentage: share(t.away_wins + t.draws),
        away_team_win_percentage: share(t.away_wins),
        home_team_goals: t.home_goals.summary(n),
        away_team_goals: t.away_goals.summary(n),
        both_scored: t.both_scored,
        both_scored_percentage: share(t.both_scored),
        not_both_scored_percentage: share(not_both),
        home_team_goals_over: t.home_over,
        home_team_goals_over_percentage: t.home_over.map(share),
        away_team_goals_over: t.away_over,
        away_team_goals_over_percentage: t.away_over.map(share),
        game_total_over: t.total_over,
        game_total_over_percentage: t.total_over.map(share),
        fair_odds: FairOddsReport {
            home_team_wins: odds(t.home_wins),
            home_or_away_wins: odds(t.home_wins + t.away_wins),
            home_or_draws: odds(t.home_wins + t.draws),
            draws: odds(t.draws),
            away_or_draws: odds(t.away_wins + t.draws),
            away_team_wins: odds(t.away_wins),
            both_scored: odds(t.both_scored),
            not_both_scored: odds(not_both),
            home_team_goals_over: t.home_over.map(odds),
            away_team_goals_over: t.away_over.map(odds),
            game_total_over: t.total_over.map(odds),
        },
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
