use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params, params_from_iter};

use crate::error::{IngestError, Result};
use crate::filter::MatchFilter;
use crate::model::{Match, NewMatch, NewPlayerStat, PlayerMatchStat, Side, Team, TeamId};

const CACHE_DIR: &str = "fbref_stats";
const DB_FILE: &str = "matches.sqlite";

const MATCH_COLUMNS: &str = "id, date, home_team_id, away_team_id, home_goals, away_goals, winner, \
     home_manager, away_manager, match_reference, season, competition";

const STAT_COLUMNS: &str = "id, match_id, player_name, minutes_played, goals, assists, \
     converted_penalties, attempted_penalties, shots, shots_on_target, xg, npxg, xag";

pub trait MatchStore {
    fn find_team_by_name(&self, name: &str) -> Result<Option<Team>>;

    fn find_team_by_id(&self, id: &TeamId) -> Result<Option<Team>>;

    fn list_teams(&self) -> Result<Vec<Team>>;

    fn create_team(&self, team: &Team) -> Result<()>;

    fn find_match_by_reference(&self, reference: &str) -> Result<Option<Match>>;

    /// Writes the match and its player rows as one unit: either all rows land or none.
    fn create_match(
        &self,
        new_match: &NewMatch,
        stats: &[NewPlayerStat],
    ) -> Result<(Match, Vec<PlayerMatchStat>)>;

    fn find_matches(&self, filter: &MatchFilter) -> Result<Vec<Match>>;

    fn player_stats_for_match(&self, match_id: i64) -> Result<Vec<PlayerMatchStat>>;

    fn distinct_managers(&self, side: Side) -> Result<Vec<String>>;

    fn count_matches(&self) -> Result<usize>;
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}

fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self { conn })
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS teams (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS matches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            home_team_id TEXT NOT NULL REFERENCES teams(id),
            away_team_id TEXT NOT NULL REFERENCES teams(id),
            home_goals INTEGER NOT NULL,
            away_goals INTEGER NOT NULL,
            winner TEXT NOT NULL,
            home_manager TEXT NOT NULL,
            away_manager TEXT NOT NULL,
            match_reference TEXT NOT NULL UNIQUE,
            season TEXT NOT NULL,
            competition TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_matches_season ON matches(season);
        CREATE INDEX IF NOT EXISTS idx_matches_competition ON matches(competition);
        CREATE INDEX IF NOT EXISTS idx_matches_teams ON matches(home_team_id, away_team_id);

        CREATE TABLE IF NOT EXISTS player_match_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id INTEGER NOT NULL REFERENCES matches(id) ON DELETE CASCADE,
            player_name TEXT NOT NULL CHECK (length(player_name) > 0),
            minutes_played INTEGER NOT NULL,
            goals INTEGER NOT NULL,
            assists INTEGER NOT NULL,
            converted_penalties INTEGER NOT NULL,
            attempted_penalties INTEGER NOT NULL,
            shots INTEGER NOT NULL,
            shots_on_target INTEGER NOT NULL,
            xg REAL NOT NULL,
            npxg REAL NOT NULL,
            xag REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_player_stats_match ON player_match_stats(match_id);
        "#,
    )?;
    Ok(())
}

impl MatchStore for SqliteStore {
    fn find_team_by_name(&self, name: &str) -> Result<Option<Team>> {
        let team = self
            .conn
            .query_row(
                "SELECT id, name FROM teams WHERE name = ?1",
                params![name],
                team_from_row,
            )
            .optional()?;
        Ok(team)
    }

    fn find_team_by_id(&self, id: &TeamId) -> Result<Option<Team>> {
        let team = self
            .conn
            .query_row(
                "SELECT id, name FROM teams WHERE id = ?1",
                params![id.as_str()],
                team_from_row,
            )
            .optional()?;
        Ok(team)
    }

    fn list_teams(&self) -> Result<Vec<Team>> {
        let mut stmt = self.conn.prepare("SELECT id, name FROM teams ORDER BY name")?;
        let rows = stmt.query_map([], team_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn create_team(&self, team: &Team) -> Result<()> {
        if team.id.as_str().is_empty() {
            return Err(IngestError::Validation { field: "team.id" });
        }
        if team.name.is_empty() {
            return Err(IngestError::Validation { field: "team.name" });
        }
        self.conn
            .execute(
                "INSERT INTO teams (id, name) VALUES (?1, ?2)",
                params![team.id.as_str(), team.name],
            )
            .map_err(|err| map_constraint(err, format!("team {} ({})", team.name, team.id)))?;
        Ok(())
    }

    fn find_match_by_reference(&self, reference: &str) -> Result<Option<Match>> {
        let sql = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE match_reference = ?1");
        let found = self
            .conn
            .query_row(&sql, params![reference], match_from_row)
            .optional()?;
        Ok(found)
    }

    fn create_match(
        &self,
        new_match: &NewMatch,
        stats: &[NewPlayerStat],
    ) -> Result<(Match, Vec<PlayerMatchStat>)> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            r#"
            INSERT INTO matches (
                date, home_team_id, away_team_id, home_goals, away_goals, winner,
                home_manager, away_manager, match_reference, season, competition
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                new_match.date.to_string(),
                new_match.home_team_id.as_str(),
                new_match.away_team_id.as_str(),
                new_match.home_goals,
                new_match.away_goals,
                new_match.winner,
                new_match.home_manager,
                new_match.away_manager,
                new_match.match_reference,
                new_match.season,
                new_match.competition,
            ],
        )
        .map_err(|err| map_constraint(err, format!("match {}", new_match.match_reference)))?;
        let match_id = tx.last_insert_rowid();

        let mut created = Vec::with_capacity(stats.len());
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO player_match_stats (
                    match_id, player_name, minutes_played, goals, assists,
                    converted_penalties, attempted_penalties, shots, shots_on_target,
                    xg, npxg, xag
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )?;
            for stat in stats {
                stmt.execute(params![
                    match_id,
                    stat.player_name,
                    stat.minutes_played,
                    stat.goals,
                    stat.assists,
                    stat.converted_penalties,
                    stat.attempted_penalties,
                    stat.shots,
                    stat.shots_on_target,
                    stat.xg,
                    stat.npxg,
                    stat.xag,
                ])
                .map_err(|err| {
                    map_constraint(err, format!("player stat {:?}", stat.player_name))
                })?;
                created.push(stat.clone().into_stat(tx.last_insert_rowid(), match_id));
            }
        }

        tx.commit()?;
        Ok((new_match.clone().into_match(match_id), created))
    }

    fn find_matches(&self, filter: &MatchFilter) -> Result<Vec<Match>> {
        let (clause, values) = filter.to_sql();
        let sql = format!("SELECT {MATCH_COLUMNS} FROM matches WHERE {clause} ORDER BY date, id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), match_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn player_stats_for_match(&self, match_id: i64) -> Result<Vec<PlayerMatchStat>> {
        let sql =
            format!("SELECT {STAT_COLUMNS} FROM player_match_stats WHERE match_id = ?1 ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![match_id], stat_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn distinct_managers(&self, side: Side) -> Result<Vec<String>> {
        let sql = match side {
            Side::Home => "SELECT DISTINCT home_manager FROM matches ORDER BY home_manager ASC",
            Side::Away => "SELECT DISTINCT away_manager FROM matches ORDER BY away_manager ASC",
        };
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn count_matches(&self) -> Result<usize> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

fn map_constraint(err: rusqlite::Error, what: String) -> IngestError {
    match err {
        rusqlite::Error::SqliteFailure(code, msg) if code.code == ErrorCode::ConstraintViolation => {
            IngestError::Persistence {
                message: format!("{what}: {}", msg.unwrap_or_else(|| code.to_string())),
                conflict: code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
            }
        }
        other => IngestError::Database(other),
    }
}

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: TeamId(row.get(0)?),
        name: row.get(1)?,
    })
}

fn match_from_row(row: &Row<'_>) -> rusqlite::Result<Match> {
    let raw_date: String = row.get(1)?;
    let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    Ok(Match {
        id: row.get(0)?,
        date,
        home_team_id: TeamId(row.get(2)?),
        away_team_id: TeamId(row.get(3)?),
        home_goals: row.get(4)?,
        away_goals: row.get(5)?,
        winner: row.get(6)?,
        home_manager: row.get(7)?,
        away_manager: row.get(8)?,
        match_reference: row.get(9)?,
        season: row.get(10)?,
        competition: row.get(11)?,
    })
}

fn stat_from_row(row: &Row<'_>) -> rusqlite::Result<PlayerMatchStat> {
    Ok(PlayerMatchStat {
        id: row.get(0)?,
        match_id: row.get(1)?,
        player_name: row.get(2)?,
        minutes_played: row.get(3)?,
        goals: row.get(4)?,
        assists: row.get(5)?,
        converted_penalties: row.get(6)?,
        attempted_penalties: row.get(7)?,
        shots: row.get(8)?,
        shots_on_target: row.get(9)?,
        xg: row.get(10)?,
        npxg: row.get(11)?,
        xag: row.get(12)?,
    })
}
