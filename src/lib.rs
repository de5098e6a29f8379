//! `nba-stats-etl` loads per-player season statistics from a delimited text file into a `SQLite`
//! store and records every run in an audit table.
//!
//! A run has three stages:
//!
//! - **Extract** ([`ingestion::extract`]): read the source (or its pre-staged fallback), decode
//!   the bytes, and parse the header and rows into a raw [`types::DataSet`].
//! - **Transform** ([`processing::transform`]): normalize headers, turn sentinel tokens into
//!   nulls, coerce types, and derive one [`model::Player`] per natural key plus one
//!   [`model::SeasonStat`] per input row.
//! - **Load** ([`store::Loader`]): replace the `players` and `player_stats` tables in a single
//!   transaction.
//!
//! [`pipeline::Pipeline`] drives the stages and brackets them with an `etl_runs` record
//! ([`store::RunRecorder`]). It always returns a [`pipeline::RunOutcome`]; stage errors are
//! captured in the outcome and in the run record, never raised.
//!
//! ## Quick example
//!
//! ```no_run
//! use nba_stats_etl::config::EtlConfig;
//! use nba_stats_etl::pipeline::Pipeline;
//!
//! # fn main() -> Result<(), nba_stats_etl::error::ConfigError> {
//! let config = EtlConfig::from_path("etl.json")?;
//! let pipeline = Pipeline::from_config(&config)?;
//! let outcome = pipeline.run(&config.source_location());
//! println!("{}", serde_json::to_string(&outcome)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: source resolution, decoding and delimited-text parsing
//! - [`processing`]: column catalog, null sentinels, coercion and player keys
//! - [`store`]: schema, the loader, run history and read-back
//! - [`pipeline`]: orchestration, outcomes and observer hooks
//! - [`config`]: JSON configuration
//! - [`error`]: error types for every stage

pub mod clock;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod model;
pub mod pipeline;
pub mod processing;
pub mod store;
pub mod types;

pub use error::{
    ConfigError, EtlError, ExtractionError, LoadError, RecorderError, TransformationError,
};
pub use pipeline::{Pipeline, PipelineOptions, RunOutcome};
