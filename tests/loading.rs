use std::path::Path;

use chrono::{TimeZone, Utc};
use nba_stats_etl::LoadError;
use nba_stats_etl::ingestion::{ExtractOptions, SourceLocation, extract};
use nba_stats_etl::model::{PlayerKey, TransformOutput};
use nba_stats_etl::processing::{TransformOptions, transform};
use nba_stats_etl::store::{Loader, read_players, read_season_stats};

fn batch(fixture: &str) -> TransformOutput {
    let ex = extract(
        &SourceLocation::new(Path::new("tests/fixtures").join(fixture)),
        &ExtractOptions::default(),
    )
    .unwrap();
    let stamp = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    transform(&ex.dataset, &TransformOptions::default(), stamp).unwrap()
}

#[test]
fn load_writes_linked_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("stats.db");
    let summary = Loader::new(&db).load(&batch("season_a.csv")).unwrap();
    assert_eq!(summary.players_written, 3);
    assert_eq!(summary.stats_written, 3);
    assert_eq!(summary.records_written(), 6);

    let players = read_players(&db).unwrap();
    let stats = read_season_stats(&db).unwrap();
    assert_eq!(players.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3]);
    for stat in &stats {
        assert_eq!(players.iter().filter(|p| p.id == stat.player_id).count(), 1);
    }
    assert_eq!(stats[0].metric("points"), Some(25.7));
    assert_eq!(players[0].last_updated, "2025-03-01T12:00:00.000000Z");
}

#[test]
fn second_load_replaces_everything() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("stats.db");
    let loader = Loader::new(&db);
    loader.load(&batch("season_a.csv")).unwrap();
    loader.load(&batch("season_b.csv")).unwrap();

    let players = read_players(&db).unwrap();
    let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["LeBron James", "Nikola Jokić"]);
    assert_eq!(players[0].id, 1);
    assert_eq!(players[0].age, Some(40));

    let stats = read_season_stats(&db).unwrap();
    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].metric("points"), Some(24.4));
    assert_eq!(stats[1].metric("points"), Some(29.6));
    assert_eq!(stats[1].awards.as_deref(), Some("MVP-2"));
}

#[test]
fn dangling_reference_rolls_back_to_previous_state() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("stats.db");
    let loader = Loader::new(&db);
    loader.load(&batch("season_a.csv")).unwrap();
    let players_before = read_players(&db).unwrap();
    let stats_before = read_season_stats(&db).unwrap();

    let mut broken = batch("season_b.csv");
    broken.stats[1].player_key = PlayerKey::new(99);
    let err = loader.load(&broken).unwrap_err();
    assert!(matches!(err, LoadError::DanglingReference { player_key: 99 }));

    assert_eq!(read_players(&db).unwrap(), players_before);
    assert_eq!(read_season_stats(&db).unwrap(), stats_before);
}

#[test]
fn store_keeps_one_stat_row_per_player_and_season() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("stats.db");
    let loader = Loader::new(&db);
    loader.load(&batch("season_b.csv")).unwrap();
    let stats_before = read_season_stats(&db).unwrap();

    let mut doubled = batch("season_a.csv");
    let extra = doubled.stats[0].clone();
    doubled.stats.push(extra);
    let err = loader.load(&doubled).unwrap_err();
    assert!(matches!(err, LoadError::Sql { .. }), "got: {err}");
    assert_eq!(read_season_stats(&db).unwrap(), stats_before);
}

#[test]
fn duplicate_player_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("stats.db");
    let mut broken = batch("season_a.csv");
    broken.players[1].key = broken.players[0].key;

    let err = Loader::new(&db).load(&broken).unwrap_err();
    assert!(matches!(err, LoadError::DuplicatePlayerKey { .. }));
    assert!(read_players(&db).unwrap().is_empty());
}

#[test]
fn store_directory_is_created_on_first_load() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("nested").join("stats.db");
    Loader::new(&db).load(&batch("sentinels.csv")).unwrap();
    let stats = read_season_stats(&db).unwrap();
    assert_eq!(stats[0].metric("three_pt_pct"), None);
    assert_eq!(stats[0].metric("three_pt_made"), Some(0.0));
}
