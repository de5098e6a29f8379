use chrono::{TimeZone, Utc};
use nba_stats_etl::TransformationError;
use nba_stats_etl::ingestion::{ExtractOptions, SourceLocation, extract};
use nba_stats_etl::model::TransformOutput;
use nba_stats_etl::processing::{TransformOptions, transform};

fn transform_fixture(name: &str) -> Result<TransformOutput, TransformationError> {
    let ex = extract(
        &SourceLocation::new(format!("tests/fixtures/{name}")),
        &ExtractOptions::default(),
    )
    .unwrap();
    let stamp = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
    transform(&ex.dataset, &TransformOptions::default(), stamp)
}

#[test]
fn lebron_row_maps_onto_player_and_season_stat() {
    let out = transform_fixture("season_a.csv").unwrap();
    assert_eq!(out.players.len(), 3);
    assert_eq!(out.stats.len(), 3);

    let lebron = &out.players[0];
    assert_eq!(lebron.name, "LeBron James");
    assert_eq!(lebron.age, Some(39));
    assert_eq!(lebron.team.as_deref(), Some("LAL"));
    assert_eq!(lebron.position.as_deref(), Some("PF"));
    assert_eq!(lebron.player_additional.as_deref(), Some("jamesle01"));

    let stat = &out.stats[0];
    assert_eq!(stat.player_key, lebron.key);
    assert_eq!(stat.season, "2024-25");
    assert_eq!(stat.games_played, Some(71));
    assert_eq!(stat.points(), Some(25.7));
    assert_eq!(stat.metric("field_goal_pct"), Some(0.54));
    assert_eq!(stat.awards.as_deref(), Some("AS"));
    assert_eq!(out.stats[1].awards, None);
}

#[test]
fn sentinel_becomes_null_but_literal_zero_stays_zero() {
    let out = transform_fixture("sentinels.csv").unwrap();
    let stat = &out.stats[0];
    assert_eq!(stat.metric("three_pt_pct"), None);
    assert_eq!(stat.metric("ft_pct"), None);
    assert_eq!(stat.metric("three_pt_made"), Some(0.0));
    assert_eq!(stat.metric("three_pt_attempts"), Some(0.0));
    assert_eq!(stat.games_started, Some(0));
}

#[test]
fn missing_points_column_fails_the_transform() {
    let err = transform_fixture("missing_points.csv").unwrap_err();
    match err {
        TransformationError::MissingColumn { column, accepted, .. } => {
            assert_eq!(column, "points");
            assert!(accepted.contains(&"pts".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn same_natural_key_with_different_team_conflicts() {
    let err = transform_fixture("conflicting_identity.csv").unwrap_err();
    match err {
        TransformationError::ConflictingIdentity {
            player,
            column,
            first_row,
            row,
            ..
        } => {
            assert_eq!(player, "Dennis Schröder");
            assert_eq!(column, "team");
            assert_eq!(first_row, 2);
            assert_eq!(row, 3);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn transform_is_deterministic() {
    let a = transform_fixture("season_b.csv").unwrap();
    let b = transform_fixture("season_b.csv").unwrap();
    assert_eq!(a, b);
}
