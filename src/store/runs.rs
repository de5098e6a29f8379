//! Run history: one `etl_runs` row per pipeline invocation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::{Clock, to_store_text};
use crate::error::{RecorderError, RecorderResult};

use super::schema;

/// Final status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failure,
}

/// Status text of a run that has begun but not completed.
pub(crate) const RUNNING: &str = "running";

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failure" => Ok(Self::Failure),
            other => Err(format!("unknown run status '{other}'")),
        }
    }
}

/// A persisted run record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EtlRun {
    pub id: i64,
    pub start_time: DateTime<Utc>,
    /// `None` while the run is in flight.
    pub end_time: Option<DateTime<Utc>>,
    /// `None` while the run is in flight.
    pub status: Option<RunStatus>,
    pub records_processed: u64,
    pub error_message: Option<String>,
}

/// Proof that a run row was inserted. Consumed by [`RunRecorder::complete`].
#[derive(Debug)]
pub struct RunHandle {
    id: i64,
    started_at: DateTime<Utc>,
}

impl RunHandle {
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Start time of the run; also the `last_updated` stamp for the run's rows.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

/// Inserts and finalizes run records in the store at `db_path`.
#[derive(Clone)]
pub struct RunRecorder {
    db_path: PathBuf,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for RunRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunRecorder")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl RunRecorder {
    pub fn new(db_path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            db_path: db_path.into(),
            clock,
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn open(&self) -> RecorderResult<Connection> {
        let conn = super::connect(&self.db_path).map_err(|e| match e {
            super::ConnectError::Io(source) => RecorderError::Io {
                path: self.db_path.clone(),
                source,
            },
            super::ConnectError::Sqlite(e) => RecorderError::Sqlite(e),
        })?;
        schema::ensure_run_table(&conn)?;
        Ok(conn)
    }

    /// Insert a run row with a start time and no end time.
    pub fn begin(&self) -> RecorderResult<RunHandle> {
        let conn = self.open()?;
        let started_at = self.clock.now();
        conn.execute(
            "INSERT INTO etl_runs (start_time, status, records_processed) VALUES (?1, ?2, 0)",
            params![to_store_text(started_at), RUNNING],
        )?;
        let id = conn.last_insert_rowid();
        info!(run_id = id, "etl run started");
        Ok(RunHandle { id, started_at })
    }

    /// Finalize the run behind `handle` with an end time and final status.
    ///
    /// Only a row that is still in flight is updated; finalized rows are never touched again.
    pub fn complete(
        &self,
        handle: RunHandle,
        status: RunStatus,
        records_processed: usize,
        error_message: Option<&str>,
    ) -> RecorderResult<EtlRun> {
        let conn = self.open()?;
        let end_time = self.clock.now();
        let records = i64::try_from(records_processed).unwrap_or(i64::MAX);
        let updated = conn.execute(
            "UPDATE etl_runs SET end_time = ?1, status = ?2, records_processed = ?3, error_message = ?4 \
             WHERE id = ?5 AND end_time IS NULL",
            params![
                to_store_text(end_time),
                status.as_str(),
                records,
                error_message,
                handle.id
            ],
        )?;
        if updated == 0 {
            return Err(RecorderError::AlreadyFinalized { run_id: handle.id });
        }
        info!(
            run_id = handle.id,
            %status,
            records_processed,
            "etl run logged"
        );
        Ok(EtlRun {
            id: handle.id,
            start_time: handle.started_at,
            end_time: Some(end_time),
            status: Some(status),
            records_processed: records_processed as u64,
            error_message: error_message.map(str::to_owned),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    fn recorder(dir: &tempfile::TempDir) -> RunRecorder {
        let ts = Utc.with_ymd_and_hms(2025, 1, 1, 2, 0, 0).unwrap();
        RunRecorder::new(dir.path().join("runs.db"), Arc::new(FixedClock(ts)))
    }

    #[test]
    fn begin_then_complete_success() {
        let dir = tempfile::tempdir().unwrap();
        let rec = recorder(&dir);
        let handle = rec.begin().unwrap();
        let id = handle.id();

        let in_flight = super::super::read_runs(rec.db_path()).unwrap();
        assert_eq!(in_flight.len(), 1);
        assert_eq!(in_flight[0].end_time, None);
        assert_eq!(in_flight[0].status, None);

        let run = rec.complete(handle, RunStatus::Success, 42, None).unwrap();
        assert_eq!(run.id, id);
        assert_eq!(run.status, Some(RunStatus::Success));

        let stored = super::super::read_runs(rec.db_path()).unwrap();
        assert_eq!(stored, vec![run]);
    }

    #[test]
    fn finalized_row_is_never_updated_again() {
        let dir = tempfile::tempdir().unwrap();
        let rec = recorder(&dir);
        let handle = rec.begin().unwrap();
        let id = handle.id();
        rec.complete(handle, RunStatus::Failure, 0, Some("boom")).unwrap();

        // A forged handle for the same id cannot rewrite history.
        let forged = RunHandle {
            id,
            started_at: Utc::now(),
        };
        let err = rec.complete(forged, RunStatus::Success, 9, None).unwrap_err();
        assert!(matches!(err, RecorderError::AlreadyFinalized { run_id } if run_id == id));

        let stored = super::super::read_runs(rec.db_path()).unwrap();
        assert_eq!(stored[0].status, Some(RunStatus::Failure));
        assert_eq!(stored[0].error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn run_ids_are_append_only() {
        let dir = tempfile::tempdir().unwrap();
        let rec = recorder(&dir);
        let a = rec.begin().unwrap();
        let b = rec.begin().unwrap();
        assert!(b.id() > a.id());
    }

    #[test]
    fn status_text_roundtrips() {
        for s in [RunStatus::Success, RunStatus::Failure] {
            assert_eq!(s.as_str().parse::<RunStatus>().unwrap(), s);
        }
        assert!("running".parse::<RunStatus>().is_err());
    }
}
