//! `SQLite` persistence: schema, the load stage, run history, and read-back.

pub mod loader;
pub mod read;
pub mod runs;
mod schema;

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

pub use loader::{LoadSummary, Loader};
pub use read::{StoredPlayer, StoredSeasonStat, read_players, read_runs, read_season_stats};
pub use runs::{EtlRun, RunHandle, RunRecorder, RunStatus};

pub(crate) enum ConnectError {
    Io(std::io::Error),
    Sqlite(rusqlite::Error),
}

/// Open a connection to the database file, creating its directory when needed.
pub(crate) fn connect(path: &Path) -> Result<Connection, ConnectError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(ConnectError::Io)?;
    }
    let conn = Connection::open(path).map_err(ConnectError::Sqlite)?;
    conn.busy_timeout(Duration::from_secs(5))
        .map_err(ConnectError::Sqlite)?;
    conn.pragma_update(None, "foreign_keys", true)
        .map_err(ConnectError::Sqlite)?;
    Ok(conn)
}
