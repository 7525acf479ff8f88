use std::fs;

use chrono::NaiveDate;

use fbref_stats::filter::MatchFilter;
use fbref_stats::scheduler::BatchScheduler;
use fbref_stats::service::{Ingestion, away_managers, get_aggregate_stats, team_by_id};
use fbref_stats::source::FileMatchSource;
use fbref_stats::store::{MatchStore, SqliteStore};

const SNAPSHOT: &str = r#"{
  "schedules": {
    "18bb7c10/2023-2024": {
      "season": "2023-2024",
      "fixtures": [
        {"matchReference": "/en/matches/1", "date": "20230812"},
        {"matchReference": "/en/matches/2", "date": "20230821"},
        {"matchReference": "/en/matches/3", "date": "20230826", "notes": "Match Cancelled"}
      ]
    }
  },
  "matches": {
    "/en/matches/1": {
      "competition": "Premier League",
      "homeTeam": "Arsenal", "awayTeam": "Nottingham Forest",
      "homeTeamLink": "/en/squads/18bb7c10/Arsenal-Stats",
      "awayTeamLink": "/en/squads/e4a775cb/Nottingham-Forest-Stats",
      "homeGoals": "2", "awayGoals": "1",
      "homeManager": "Mikel Arteta", "awayManager": "Steve Cooper",
      "playerLines": [{"name": "Bukayo Saka", "minutesPlayed": "90", "goals": "1", "xG": "0.5"}]
    },
    "/en/matches/2": {
      "competition": "Premier League",
      "homeTeam": "Crystal Palace", "awayTeam": "Arsenal",
      "homeTeamLink": "/en/squads/47c64c55/Crystal-Palace-Stats",
      "awayTeamLink": "/en/squads/18bb7c10/Arsenal-Stats",
      "homeGoals": "0", "awayGoals": "1",
      "homeManager": "Roy Hodgson", "awayManager": "Mikel Arteta",
      "playerLines": []
    }
  }
}"#;

#[test]
fn snapshot_ingest_persists_across_reopen() {
    let dir = tempfile::tempdir().expect("temp dir");
    let snapshot_path = dir.path().join("snapshot.json");
    fs::write(&snapshot_path, SNAPSHOT).expect("write snapshot");
    let db_path = dir.path().join("nested").join("matches.sqlite");

    {
        let store = SqliteStore::open(&db_path).expect("open db");
        let source = FileMatchSource::open(&snapshot_path).expect("load snapshot");
        let scheduler = BatchScheduler::unthrottled(2).expect("scheduler");
        let outcomes = Ingestion::new(&store, &source, &scheduler)
            .with_today(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap())
            .ingest_team_fixtures_for_season("18bb7c10", "2023-2024")
            .expect("ingest succeeds");
        assert_eq!(outcomes.len(), 2);
    }

    let store = SqliteStore::open(&db_path).expect("reopen db");
    assert_eq!(store.count_matches().unwrap(), 2);
    assert_eq!(team_by_id(&store, "e4a775cb").unwrap().name, "Nottingham Forest");
    assert_eq!(
        away_managers(&store).unwrap(),
        vec!["Mikel Arteta".to_string(), "Steve Cooper".to_string()]
    );

    let report = get_aggregate_stats(&store, &MatchFilter::default()).unwrap();
    assert_eq!(report.games, 2);
    assert_eq!(report.home_team_wins, 1);
    assert_eq!(report.away_team_wins, 1);

    let stored = store
        .find_match_by_reference("/en/matches/1")
        .unwrap()
        .expect("match stored");
    let stats = store.player_stats_for_match(stored.id).unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].assists, 0);
    assert_eq!(stats[0].xg, 0.5);
}
