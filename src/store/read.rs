//! Read-back of the stored relations, ordered by id.

use std::path::Path;

use rusqlite::types::Type;
use rusqlite::{Connection, Row};

use crate::clock::from_store_text;
use crate::error::RecorderResult;
use crate::processing::columns::{METRIC_COLUMNS, METRIC_COUNT};

use super::runs::{EtlRun, RUNNING, RunStatus};

/// A row of `players`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredPlayer {
    pub id: i64,
    pub name: String,
    pub age: Option<i64>,
    pub team: Option<String>,
    pub position: Option<String>,
    pub player_additional: Option<String>,
    pub last_updated: String,
}

/// A row of `player_stats`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSeasonStat {
    pub id: i64,
    pub player_id: i64,
    pub season: String,
    pub games_played: Option<i64>,
    pub games_started: Option<i64>,
    pub metrics: [Option<f64>; METRIC_COUNT],
    pub awards: Option<String>,
    pub last_updated: String,
}

impl StoredSeasonStat {
    pub fn metric(&self, name: &str) -> Option<f64> {
        crate::processing::columns::metric_index(name).and_then(|idx| self.metrics[idx])
    }
}

fn open(path: &Path) -> rusqlite::Result<Connection> {
    Connection::open(path)
}

pub fn read_players(db_path: &Path) -> rusqlite::Result<Vec<StoredPlayer>> {
    let conn = open(db_path)?;
    let mut stmt = conn.prepare(
        "SELECT id, player_name, age, team, position, player_additional, last_updated \
         FROM players ORDER BY id",
    )?;
    stmt.query_map([], |row| {
        Ok(StoredPlayer {
            id: row.get(0)?,
            name: row.get(1)?,
            age: row.get(2)?,
            team: row.get(3)?,
            position: row.get(4)?,
            player_additional: row.get(5)?,
            last_updated: row.get(6)?,
        })
    })?
    .collect()
}

pub fn read_season_stats(db_path: &Path) -> rusqlite::Result<Vec<StoredSeasonStat>> {
    let conn = open(db_path)?;
    let metric_list = METRIC_COLUMNS
        .iter()
        .map(|c| c.name)
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT id, player_id, season, games_played, games_started, {metric_list}, awards, last_updated \
         FROM player_stats ORDER BY id"
    );
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_map([], stat_from_row)?.collect()
}

fn stat_from_row(row: &Row<'_>) -> rusqlite::Result<StoredSeasonStat> {
    let mut metrics = [None; METRIC_COUNT];
    for (i, slot) in metrics.iter_mut().enumerate() {
        *slot = row.get(5 + i)?;
    }
    Ok(StoredSeasonStat {
        id: row.get(0)?,
        player_id: row.get(1)?,
        season: row.get(2)?,
        games_played: row.get(3)?,
        games_started: row.get(4)?,
        metrics,
        awards: row.get(5 + METRIC_COUNT)?,
        last_updated: row.get(6 + METRIC_COUNT)?,
    })
}

/// All run records, oldest first.
pub fn read_runs(db_path: &Path) -> RecorderResult<Vec<EtlRun>> {
    let conn = open(db_path)?;
    let mut stmt = conn.prepare(
        "SELECT id, start_time, end_time, status, records_processed, error_message \
         FROM etl_runs ORDER BY id",
    )?;
    let runs = stmt
        .query_map([], |row| {
            let start: String = row.get(1)?;
            let end: Option<String> = row.get(2)?;
            let status: String = row.get(3)?;
            let records: i64 = row.get(4)?;
            Ok(EtlRun {
                id: row.get(0)?,
                start_time: parse_time(1, &start)?,
                end_time: end.as_deref().map(|e| parse_time(2, e)).transpose()?,
                status: parse_status(3, &status)?,
                records_processed: u64::try_from(records).unwrap_or(0),
                error_message: row.get(5)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(runs)
}

fn parse_time(col: usize, raw: &str) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    from_store_text(raw).ok_or_else(|| conversion_error(col, format!("bad timestamp '{raw}'")))
}

fn parse_status(col: usize, raw: &str) -> rusqlite::Result<Option<RunStatus>> {
    if raw == RUNNING {
        return Ok(None);
    }
    raw.parse::<RunStatus>()
        .map(Some)
        .map_err(|msg| conversion_error(col, msg))
}

fn conversion_error(col: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(col, Type::Text, msg.into())
}
