//! Idempotent DDL for the three relations.
//!
//! `players` and `player_stats` use a plain `INTEGER PRIMARY KEY` so ids restart at 1 after a
//! full replace; `etl_runs` uses `AUTOINCREMENT` because run ids are never reused.

use rusqlite::Connection;

use crate::processing::columns::METRIC_COLUMNS;

const CREATE_PLAYERS: &str = r"
CREATE TABLE IF NOT EXISTS players (
    id INTEGER PRIMARY KEY,
    player_name TEXT NOT NULL,
    age INTEGER,
    team TEXT,
    position TEXT,
    player_additional TEXT,
    last_updated TEXT NOT NULL
);
";

const CREATE_RUNS: &str = r"
CREATE TABLE IF NOT EXISTS etl_runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    start_time TEXT NOT NULL,
    end_time TEXT,
    status TEXT NOT NULL,
    records_processed INTEGER NOT NULL DEFAULT 0,
    error_message TEXT
);
";

fn create_player_stats() -> String {
    let metrics: String = METRIC_COLUMNS
        .iter()
        .map(|c| format!("    {} {},\n", c.name, c.data_type.sql_affinity()))
        .collect();
    format!(
        "CREATE TABLE IF NOT EXISTS player_stats (
    id INTEGER PRIMARY KEY,
    player_id INTEGER NOT NULL REFERENCES players (id),
    season TEXT NOT NULL,
    games_played INTEGER,
    games_started INTEGER,
{metrics}    awards TEXT,
    last_updated TEXT NOT NULL,
    UNIQUE (player_id, season)
);
CREATE INDEX IF NOT EXISTS idx_player_stats_player ON player_stats (player_id);
"
    )
}

/// Create `players` and `player_stats` if absent.
pub(crate) fn ensure_data_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_PLAYERS)?;
    conn.execute_batch(&create_player_stats())
}

/// Create `etl_runs` if absent.
pub(crate) fn ensure_run_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CREATE_RUNS)
}
