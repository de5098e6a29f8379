//! Load stage: atomic replacement of `players` and `player_stats`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rusqlite::types::Value as SqlValue;
use rusqlite::{Transaction, params, params_from_iter};
use tracing::info;

use crate::clock::to_store_text;
use crate::error::{LoadError, LoadResult};
use crate::model::{Player, PlayerKey, SeasonStat, TransformOutput};
use crate::processing::columns::METRIC_COLUMNS;

use super::schema;

/// Rows written by one successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadSummary {
    pub players_written: usize,
    pub stats_written: usize,
}

impl LoadSummary {
    /// Count recorded as `records_processed` for the run.
    pub fn records_written(&self) -> usize {
        self.players_written + self.stats_written
    }
}

/// Writes transform output into the store at `db_path`.
///
/// Every call opens its own connection and drops it before returning.
#[derive(Debug, Clone)]
pub struct Loader {
    db_path: PathBuf,
}

impl Loader {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Replace the stored players and season stats with `batch`.
    ///
    /// Deletes all prior `player_stats` and `players` rows and inserts the batch inside one
    /// transaction. Season stats are written with the store ids assigned to their players in the
    /// same transaction. On any error the transaction is rolled back and the store keeps its
    /// previous contents.
    pub fn load(&self, batch: &TransformOutput) -> LoadResult<LoadSummary> {
        let mut conn = super::connect(&self.db_path).map_err(|e| match e {
            super::ConnectError::Io(source) => LoadError::Io {
                path: self.db_path.clone(),
                source,
            },
            super::ConnectError::Sqlite(source) => LoadError::Open {
                path: self.db_path.clone(),
                source,
            },
        })?;
        schema::ensure_data_tables(&conn).map_err(LoadError::Schema)?;

        let tx = conn
            .transaction()
            .map_err(LoadError::sql("begin load transaction"))?;

        let stats_removed = tx
            .execute("DELETE FROM player_stats", [])
            .map_err(LoadError::sql("clear player_stats"))?;
        let players_removed = tx
            .execute("DELETE FROM players", [])
            .map_err(LoadError::sql("clear players"))?;

        let ids = insert_players(&tx, &batch.players)?;
        let stats_written = insert_stats(&tx, &batch.stats, &ids)?;

        tx.commit().map_err(LoadError::sql("commit load transaction"))?;

        let summary = LoadSummary {
            players_written: ids.len(),
            stats_written,
        };
        info!(
            db = %self.db_path.display(),
            players_removed,
            stats_removed,
            players = summary.players_written,
            stats = summary.stats_written,
            "loaded players and season stats"
        );
        Ok(summary)
    }
}

fn insert_players(tx: &Transaction<'_>, players: &[Player]) -> LoadResult<HashMap<PlayerKey, i64>> {
    let mut stmt = tx
        .prepare(
            "INSERT INTO players (player_name, age, team, position, player_additional, last_updated) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .map_err(LoadError::sql("prepare player insert"))?;

    let mut ids = HashMap::with_capacity(players.len());
    for p in players {
        stmt.execute(params![
            p.name,
            p.age,
            p.team,
            p.position,
            p.player_additional,
            to_store_text(p.last_updated),
        ])
        .map_err(LoadError::sql("insert player"))?;
        if ids.insert(p.key, tx.last_insert_rowid()).is_some() {
            return Err(LoadError::DuplicatePlayerKey {
                player_key: p.key.get(),
            });
        }
    }
    Ok(ids)
}

fn insert_stats(
    tx: &Transaction<'_>,
    stats: &[SeasonStat],
    ids: &HashMap<PlayerKey, i64>,
) -> LoadResult<usize> {
    let mut columns = vec!["player_id", "season", "games_played", "games_started"];
    columns.extend(METRIC_COLUMNS.iter().map(|c| c.name));
    columns.extend(["awards", "last_updated"]);
    let placeholders = (1..=columns.len())
        .map(|i| format!("?{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "INSERT INTO player_stats ({}) VALUES ({placeholders})",
        columns.join(", ")
    );

    let mut stmt = tx
        .prepare(&sql)
        .map_err(LoadError::sql("prepare season stat insert"))?;

    for stat in stats {
        let player_id = ids
            .get(&stat.player_key)
            .copied()
            .ok_or(LoadError::DanglingReference {
                player_key: stat.player_key.get(),
            })?;

        let mut values: Vec<SqlValue> = Vec::with_capacity(columns.len());
        values.push(SqlValue::Integer(player_id));
        values.push(SqlValue::Text(stat.season.clone()));
        values.push(stat.games_played.map_or(SqlValue::Null, SqlValue::Integer));
        values.push(stat.games_started.map_or(SqlValue::Null, SqlValue::Integer));
        values.extend(stat.metrics.iter().map(|m| m.map_or(SqlValue::Null, SqlValue::Real)));
        values.push(stat.awards.clone().map_or(SqlValue::Null, SqlValue::Text));
        values.push(SqlValue::Text(to_store_text(stat.last_updated)));

        stmt.execute(params_from_iter(values))
            .map_err(LoadError::sql("insert season stat"))?;
    }
    Ok(stats.len())
}
