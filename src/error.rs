use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for extraction.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Convenience result type for transformation.
pub type TransformationResult<T> = Result<T, TransformationError>;

/// Convenience result type for loading.
pub type LoadResult<T> = Result<T, LoadError>;

/// Convenience result type for run bookkeeping.
pub type RecorderResult<T> = Result<T, RecorderError>;

/// Error returned by the extract stage.
///
/// The source was missing, unreadable, undecodable, or structurally empty.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Neither the primary source nor the pre-staged fallback exists.
    #[error("source not found: primary '{}' (fallback: {})", primary.display(), fallback_label(fallback))]
    SourceMissing {
        primary: PathBuf,
        fallback: Option<PathBuf>,
    },

    /// Underlying I/O error other than a missing primary (e.g. permission denied).
    #[error("io error reading '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The bytes could not be decoded into text.
    #[error("failed to decode '{}': {message}", path.display())]
    Decode { path: PathBuf, message: String },

    /// Delimited-text parse error (e.g. a row with a different width than the header).
    #[error("csv error in '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The source has no header row or no data rows.
    #[error("source '{}' is empty: {reason}", path.display())]
    Empty { path: PathBuf, reason: String },
}

fn fallback_label(fallback: &Option<PathBuf>) -> String {
    match fallback {
        Some(p) => format!("'{}'", p.display()),
        None => "none configured".to_string(),
    }
}

/// Error returned by the transform stage.
///
/// Any failing row aborts the whole transform; there is no partial output.
#[derive(Debug, Error)]
pub enum TransformationError {
    /// A required identity or statistical column is not in the normalized header.
    #[error("missing required column '{column}' (accepted headers: {accepted:?}). headers={headers:?}")]
    MissingColumn {
        column: String,
        accepted: Vec<String>,
        headers: Vec<String>,
    },

    /// Two source headers normalize onto the same column.
    #[error("duplicate column '{column}': headers '{first}' and '{second}' both map to it")]
    DuplicateColumn {
        column: String,
        first: String,
        second: String,
    },

    /// A required value is null after sentinel handling.
    #[error("missing value at row {row} column '{column}'")]
    MissingValue { row: usize, column: String },

    /// A value could not be coerced into its expected type.
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// The same natural key appeared with different identity attributes.
    #[error(
        "conflicting identity for player '{player}' at row {row}: {column} is {second:?} but row {first_row} has {first:?}"
    )]
    ConflictingIdentity {
        player: String,
        column: String,
        first_row: usize,
        first: Option<String>,
        row: usize,
        second: Option<String>,
    },

    /// A player has more than one statistical row for the same season.
    #[error("duplicate season stat for player '{player}' season '{season}': rows {first_row} and {row}")]
    DuplicateSeasonStat {
        player: String,
        season: String,
        first_row: usize,
        row: usize,
    },
}

/// Error returned by the load stage. The transaction is rolled back whenever one is returned.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Creating the database directory failed.
    #[error("io error preparing store '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Opening the store failed.
    #[error("failed to open store '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Creating the schema failed.
    #[error("failed to ensure schema: {0}")]
    Schema(#[source] rusqlite::Error),

    /// A statement inside the load transaction failed (constraint violation, I/O, ...).
    #[error("{context}: {source}")]
    Sql {
        context: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// The batch carries two players with the same key.
    #[error("player key {player_key} appears more than once in the batch")]
    DuplicatePlayerKey { player_key: u32 },

    /// A season stat row references a player that was not written in this transaction.
    #[error("season stat references player key {player_key} which was not loaded in this batch")]
    DanglingReference { player_key: u32 },
}

impl LoadError {
    pub(crate) fn sql(context: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Self::Sql { context, source }
    }
}

/// Error returned by run bookkeeping. Never replaces the error of the run being recorded.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// Creating the database directory failed.
    #[error("io error preparing run history '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Underlying `SQLite` failure.
    #[error("run history sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The run row does not exist or already has an end time.
    #[error("run {run_id} is unknown or already finalized")]
    AlreadyFinalized { run_id: i64 },
}

/// Error returned while loading or validating [`crate::config::EtlConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading the configuration file failed.
    #[error("io error reading config '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for [`crate::config::EtlConfig`].
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value is out of range.
    #[error("invalid config: {message}")]
    Invalid { message: String },
}

/// Umbrella error covering every pipeline stage.
#[derive(Debug, Error)]
pub enum EtlError {
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("transformation failed: {0}")]
    Transformation(#[from] TransformationError),

    #[error("load failed: {0}")]
    Load(#[from] LoadError),

    #[error("run bookkeeping failed: {0}")]
    Recorder(#[from] RecorderError),
}
