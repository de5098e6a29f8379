//! Transform stage: raw [`crate::types::DataSet`] → normalized players and season stats.
//!
//! [`transform`] runs, in order:
//!
//! 1. header normalization and column binding ([`columns::ColumnMap::resolve`])
//! 2. missing-value sentinels → null ([`sentinels::normalize_nulls`])
//! 3. per row: identity columns → [`Player`] (collapsed by natural key), statistical columns →
//!    [`SeasonStat`] (at most one per player and season)
//! 4. key derivation ([`keys::KeyRegistry`]); each stat carries its player's key
//! 5. `last_updated` stamping
//!
//! Any row that fails aborts the whole transform. Errors name the source line (header is line 1).
//!
//! ```rust
//! use chrono::Utc;
//! use nba_stats_etl::ingestion::csv::parse_delimited;
//! use nba_stats_etl::processing::{transform, TransformOptions};
//!
//! let raw = parse_delimited(
//!     "Player,Age,Team,Pos,G,GS,MP,PTS,Player-additional\n\
//!      LeBron James,39,LAL,PF,70,70,35.3,25.7,jamesle01\n",
//!     b',',
//!     std::path::Path::new("inline.csv"),
//! )
//! .unwrap();
//! let out = transform(&raw, &TransformOptions::default(), Utc::now()).unwrap();
//! assert_eq!(out.players.len(), 1);
//! assert_eq!(out.stats[0].player_key, out.players[0].key);
//! assert_eq!(out.stats[0].points(), Some(25.7));
//! ```

pub mod columns;
mod coerce;
pub mod keys;
pub mod sentinels;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{TransformationError, TransformationResult};
use crate::model::{Player, PlayerKey, SeasonStat, TransformOutput};
use crate::types::Value;

use columns::{
    AGE, AWARDS, ColumnMap, ColumnSpec, GAMES_PLAYED, GAMES_STARTED, METRIC_COLUMNS, METRIC_COUNT,
    PLAYER_ADDITIONAL, PLAYER_NAME, POSITION, SEASON, TEAM,
};
use keys::{KeyRegistry, NaturalKey, Resolved};

/// Options controlling the transform stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    /// Season label for rows without a `season` column value.
    pub season: String,
    /// Cell contents treated as missing values.
    pub null_sentinels: Vec<String>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            season: "2024-25".to_string(),
            null_sentinels: vec!["-".to_string()],
        }
    }
}

/// Transform a raw dataset into players and season stats stamped with `stamped_at`.
pub fn transform(
    dataset: &crate::types::DataSet,
    options: &TransformOptions,
    stamped_at: DateTime<Utc>,
) -> TransformationResult<TransformOutput> {
    let columns = ColumnMap::resolve(&dataset.schema)?;
    let (cleaned, replaced) = sentinels::normalize_nulls(dataset, &options.null_sentinels);
    debug!(replaced, "normalized missing-value sentinels");

    let mut registry = KeyRegistry::new();
    let mut players: Vec<Player> = Vec::new();
    // Source row on which each player first appeared, parallel to `players`.
    let mut first_rows: Vec<usize> = Vec::new();
    let mut stats: Vec<SeasonStat> = Vec::with_capacity(cleaned.row_count());
    // Source row of each (player, season) pair already emitted.
    let mut seasons: HashMap<(PlayerKey, String), usize> = HashMap::new();

    for (idx, row) in cleaned.rows.iter().enumerate() {
        let user_row = cleaned.source_line(idx);
        let cells = RowCells {
            row,
            user_row,
            columns: &columns,
        };

        let identity = cells.identity()?;
        let natural = NaturalKey::derive(
            &identity.name,
            identity.player_additional.as_deref(),
            identity.team.as_deref(),
        );
        let key = match registry.resolve(natural) {
            Resolved::New(key) => {
                players.push(Player {
                    key,
                    name: identity.name,
                    age: identity.age,
                    team: identity.team,
                    position: identity.position,
                    player_additional: identity.player_additional,
                    last_updated: stamped_at,
                });
                first_rows.push(user_row);
                key
            }
            Resolved::Existing(key) => {
                let idx = key.get() as usize - 1;
                check_identity(&players[idx], first_rows[idx], &identity, user_row)?;
                key
            }
        };

        let stat = cells.season_stat(key, &options.season, stamped_at)?;
        if let Some(&first_row) = seasons.get(&(key, stat.season.clone())) {
            return Err(TransformationError::DuplicateSeasonStat {
                player: players[key.get() as usize - 1].name.clone(),
                season: stat.season,
                first_row,
                row: user_row,
            });
        }
        seasons.insert((key, stat.season.clone()), user_row);
        stats.push(stat);
    }

    info!(
        players = players.len(),
        stats = stats.len(),
        "data transformation complete"
    );
    Ok(TransformOutput { players, stats })
}

struct Identity {
    name: String,
    age: Option<i64>,
    team: Option<String>,
    position: Option<String>,
    player_additional: Option<String>,
}

struct RowCells<'a> {
    row: &'a [Value],
    user_row: usize,
    columns: &'a ColumnMap,
}

impl RowCells<'_> {
    fn get(&self, spec: &ColumnSpec) -> TransformationResult<Value> {
        match self.columns.index(spec) {
            Some(idx) => coerce::coerce(self.user_row, spec.name, spec.data_type, &self.row[idx]),
            None => Ok(Value::Null),
        }
    }

    fn identity(&self) -> TransformationResult<Identity> {
        let name = coerce::as_text(self.get(&PLAYER_NAME)?).ok_or_else(|| TransformationError::MissingValue {
            row: self.user_row,
            column: PLAYER_NAME.name.to_string(),
        })?;
        Ok(Identity {
            name,
            age: coerce::as_int(self.get(&AGE)?),
            team: coerce::as_text(self.get(&TEAM)?),
            position: coerce::as_text(self.get(&POSITION)?),
            player_additional: coerce::as_text(self.get(&PLAYER_ADDITIONAL)?),
        })
    }

    fn season_stat(
        &self,
        player_key: PlayerKey,
        default_season: &str,
        stamped_at: DateTime<Utc>,
    ) -> TransformationResult<SeasonStat> {
        let mut metrics = [None; METRIC_COUNT];
        for (slot, spec) in metrics.iter_mut().zip(METRIC_COLUMNS.iter()) {
            *slot = coerce::as_float(self.get(spec)?);
        }
        Ok(SeasonStat {
            player_key,
            season: coerce::as_text(self.get(&SEASON)?).unwrap_or_else(|| default_season.to_owned()),
            games_played: coerce::as_int(self.get(&GAMES_PLAYED)?),
            games_started: coerce::as_int(self.get(&GAMES_STARTED)?),
            metrics,
            awards: coerce::as_text(self.get(&AWARDS)?),
            last_updated: stamped_at,
        })
    }
}

/// Rows sharing a natural key must agree on every identity attribute.
fn check_identity(
    existing: &Player,
    first_row: usize,
    incoming: &Identity,
    row: usize,
) -> TransformationResult<()> {
    let age = |v: Option<i64>| v.map(|a| a.to_string());
    let pairs = [
        (AGE.name, age(existing.age), age(incoming.age)),
        (TEAM.name, existing.team.clone(), incoming.team.clone()),
        (POSITION.name, existing.position.clone(), incoming.position.clone()),
        (
            PLAYER_ADDITIONAL.name,
            existing.player_additional.clone(),
            incoming.player_additional.clone(),
        ),
    ];
    for (column, first, second) in pairs {
        if first != second {
            return Err(TransformationError::ConflictingIdentity {
                player: existing.name.clone(),
                column: column.to_string(),
                first_row,
                first,
                row,
                second,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::csv::parse_delimited;
    use chrono::TimeZone;
    use std::path::Path;

    const HEADER: &str = "Rk,Player,Age,Team,Pos,G,GS,MP,3P%,PTS,Awards,Player-additional";

    fn run(body: &str) -> TransformationResult<TransformOutput> {
        let text = format!("{HEADER}\n{body}");
        let raw = parse_delimited(&text, b',', Path::new("inline.csv")).unwrap();
        transform(&raw, &TransformOptions::default(), ts())
    }

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 2, 0, 0).unwrap()
    }

    #[test]
    fn single_row_produces_linked_player_and_stat() {
        let out = run("1,LeBron James,39,LAL,PF,70,70,35.3,.410,25.7,AS,jamesle01\n").unwrap();
        assert_eq!(out.players.len(), 1);
        assert_eq!(out.stats.len(), 1);

        let p = &out.players[0];
        assert_eq!(p.name, "LeBron James");
        assert_eq!(p.age, Some(39));
        assert_eq!(p.team.as_deref(), Some("LAL"));
        assert_eq!(p.position.as_deref(), Some("PF"));
        assert_eq!(p.player_additional.as_deref(), Some("jamesle01"));
        assert_eq!(p.last_updated, ts());

        let s = &out.stats[0];
        assert_eq!(s.player_key, p.key);
        assert_eq!(s.season, "2024-25");
        assert_eq!(s.games_played, Some(70));
        assert_eq!(s.points(), Some(25.7));
        assert_eq!(s.metric("three_pt_pct"), Some(0.41));
        assert_eq!(s.metric("assists"), None);
        assert_eq!(s.awards.as_deref(), Some("AS"));
        assert_eq!(s.last_updated, ts());
    }

    #[test]
    fn sentinel_is_null_but_zero_is_zero() {
        let out = run(concat!(
            "1,A,25,BOS,C,10,0,12.0,-,4.0,,a01\n",
            "2,B,26,BOS,C,10,0,12.0,0,4.0,,b01\n",
        ))
        .unwrap();
        assert_eq!(out.stats[0].metric("three_pt_pct"), None);
        assert_eq!(out.stats[1].metric("three_pt_pct"), Some(0.0));
    }

    #[test]
    fn repeated_player_across_seasons_collapses_to_one_player() {
        let raw = parse_delimited(
            concat!(
                "Season,Player,Age,Team,Pos,G,GS,MP,PTS,Player-additional\n",
                "2023-24,A,25,BOS,C,10,0,12.0,4.0,a01\n",
                "2024-25,A,25,BOS,C,5,0,10.0,2.0,a01\n",
                "2024-25,B,30,NYK,G,10,10,30.0,20.0,b01\n",
            ),
            b',',
            Path::new("inline.csv"),
        )
        .unwrap();
        let out = transform(&raw, &TransformOptions::default(), ts()).unwrap();
        assert_eq!(out.players.len(), 2);
        assert_eq!(out.stats.len(), 3);
        assert_eq!(out.stats[0].player_key, out.stats[1].player_key);
        assert_ne!(out.stats[0].season, out.stats[1].season);
        assert_ne!(out.stats[0].player_key, out.stats[2].player_key);
        for stat in &out.stats {
            assert!(out.player_for(stat).is_some());
        }
    }

    #[test]
    fn same_player_twice_in_one_season_is_an_error() {
        let err = run(concat!(
            "1,LeBron James,39,LAL,PF,70,70,35.3,.410,25.7,,jamesle01\n",
            "2,LeBron James,39,LAL,PF,70,70,35.3,.410,25.7,,jamesle01\n",
        ))
        .unwrap_err();
        match err {
            TransformationError::DuplicateSeasonStat {
                player,
                season,
                first_row,
                row,
            } => {
                assert_eq!(player, "LeBron James");
                assert_eq!(season, "2024-25");
                assert_eq!((first_row, row), (2, 3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn errors_name_the_source_line_after_skipped_blank_rows() {
        let err = run(concat!(
            "1,A,25,BOS,C,10,0,12.0,.3,4.0,,a01\n",
            ",,,,,,,,,,,\n",
            "2,B,26,BOS,C,10,0,12.0,.3,lots,,b01\n",
        ))
        .unwrap_err();
        assert!(
            matches!(err, TransformationError::ParseError { row: 4, ref column, .. } if column == "points"),
            "got: {err}"
        );
    }

    #[test]
    fn missing_secondary_id_keys_by_team() {
        let out = run(concat!(
            "1,Jalen Williams,23,OKC,SG,60,60,32.0,.35,21.0,,\n",
            "2,Jalen Williams,24,DEN,PF,30,2,12.0,.30,6.0,,\n",
        ))
        .unwrap();
        assert_eq!(out.players.len(), 2);
    }

    #[test]
    fn conflicting_identity_is_an_error() {
        let err = run(concat!(
            "1,A,25,BOS,C,10,0,12.0,.3,4.0,,a01\n",
            "2,A,25,2TM,C,5,0,10.0,.2,2.0,,a01\n",
        ))
        .unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, TransformationError::ConflictingIdentity { .. }));
        assert!(msg.contains("team"), "got: {msg}");
        assert!(msg.contains("row 3"), "got: {msg}");
        assert!(msg.contains("row 2"), "got: {msg}");
    }

    #[test]
    fn one_bad_value_aborts_the_whole_transform() {
        let err = run(concat!(
            "1,A,25,BOS,C,10,0,12.0,.3,4.0,,a01\n",
            "2,B,26,BOS,C,10,0,12.0,.3,lots,,b01\n",
        ))
        .unwrap_err();
        assert!(
            matches!(err, TransformationError::ParseError { row: 3, ref column, .. } if column == "points")
        );
    }

    #[test]
    fn null_name_is_missing_value() {
        let err = run("1,-,25,BOS,C,10,0,12.0,.3,4.0,,a01\n").unwrap_err();
        assert!(matches!(err, TransformationError::MissingValue { row: 2, .. }));
    }

    #[test]
    fn season_column_overrides_default() {
        let raw = parse_delimited(
            "Season,Player,Age,Team,Pos,G,GS,MP,PTS\n2023-24,A,25,BOS,C,1,1,1.0,1.0\n",
            b',',
            Path::new("inline.csv"),
        )
        .unwrap();
        let out = transform(&raw, &TransformOptions::default(), ts()).unwrap();
        assert_eq!(out.stats[0].season, "2023-24");
        assert_eq!(out.players[0].player_additional, None);
    }
}
