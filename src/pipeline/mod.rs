//! Orchestrator: one run of extract, transform and load, bracketed by a run record.
//!
//! [`Pipeline::run`] never returns an error and never panics on bad input. Every invocation
//! yields a [`RunOutcome`], and every invocation that got a run record finalizes it exactly once.
//!
//! ```no_run
//! use nba_stats_etl::ingestion::SourceLocation;
//! use nba_stats_etl::pipeline::{Pipeline, PipelineOptions};
//!
//! let pipeline = Pipeline::new("nba_stats.db", PipelineOptions::default());
//! let outcome = pipeline.run(&SourceLocation::new("nba_player_stats.csv").with_fallback("paste.txt"));
//! if !outcome.is_success() {
//!     eprintln!("run failed: {:?}", outcome.error_message);
//! }
//! ```

pub mod observer;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::clock::{Clock, SystemClock};
use crate::config::EtlConfig;
use crate::error::{
    ConfigError, EtlError, ExtractionError, LoadError, RecorderError, TransformationError,
};
use crate::ingestion::{self, ExtractOptions, SourceLocation};
use crate::model::TransformOutput;
use crate::processing::{self, TransformOptions};
use crate::store::{Loader, RunRecorder, RunStatus};
use crate::types::DataSet;

pub use observer::{
    CompositeObserver, PipelineEvent, PipelineObserver, Severity, Stage, TracingObserver,
};

/// Options for every stage of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub extract: ExtractOptions,
    pub transform: TransformOptions,
    /// Failures at or above this severity are also reported through
    /// [`PipelineObserver::on_alert`].
    pub alert_at_or_above: Severity,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            extract: ExtractOptions::default(),
            transform: TransformOptions::default(),
            alert_at_or_above: Severity::Critical,
        }
    }
}

/// What one invocation of [`Pipeline::run`] produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    /// `None` when the run record could not be created.
    pub run_id: Option<i64>,
    pub status: RunStatus,
    /// Players plus season stats written; 0 on failure.
    pub records_processed: usize,
    pub error_message: Option<String>,
    /// Stage whose error failed the run. `None` on success or when bookkeeping failed first.
    pub failed_stage: Option<Stage>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// Where a run currently is.
enum RunState {
    Extracting,
    Transforming(DataSet),
    Loading(TransformOutput),
    Finalizing(Result<usize, StageFailure>),
}

struct StageFailure {
    stage: Stage,
    message: String,
}

/// Runs the ETL stages against one store.
pub struct Pipeline {
    loader: Loader,
    recorder: RunRecorder,
    options: PipelineOptions,
    observer: Arc<dyn PipelineObserver>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("db_path", &self.loader.db_path())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Pipeline over the store at `db_path` using the wall clock and [`TracingObserver`].
    pub fn new(db_path: impl Into<PathBuf>, options: PipelineOptions) -> Self {
        let db_path = db_path.into();
        Self {
            recorder: RunRecorder::new(db_path.clone(), Arc::new(SystemClock)),
            loader: Loader::new(db_path),
            options,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Validate `config` and build a pipeline from it.
    ///
    /// Run it against the configured source with `pipeline.run(&config.source_location())`.
    pub fn from_config(config: &EtlConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            config.database_path.clone(),
            config.pipeline_options(),
        ))
    }

    /// Replace the time source for run records and `last_updated` stamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.recorder = RunRecorder::new(self.loader.db_path().to_path_buf(), clock);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn db_path(&self) -> &Path {
        self.loader.db_path()
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Execute one run against `source`.
    pub fn run(&self, source: &SourceLocation) -> RunOutcome {
        let handle = match self.recorder.begin() {
            Ok(handle) => handle,
            Err(err) => {
                let message = EtlError::from(err).to_string();
                self.emit(&PipelineEvent::RecorderFailed {
                    message: message.clone(),
                });
                let outcome = RunOutcome {
                    run_id: None,
                    status: RunStatus::Failure,
                    records_processed: 0,
                    error_message: Some(message),
                    failed_stage: None,
                };
                self.emit(&PipelineEvent::RunCompleted {
                    outcome: outcome.clone(),
                });
                return outcome;
            }
        };
        let run_id = handle.id();
        let stamped_at = handle.started_at();
        self.emit(&PipelineEvent::RunStarted {
            run_id,
            source: source.primary.clone(),
        });

        let mut state = RunState::Extracting;
        let result = loop {
            state = match state {
                RunState::Extracting => {
                    self.enter(Stage::Extract);
                    match ingestion::extract(source, &self.options.extract) {
                        Ok(extraction) => {
                            self.completed(Stage::Extract, extraction.dataset.row_count());
                            RunState::Transforming(extraction.dataset)
                        }
                        Err(err) => RunState::Finalizing(Err(self.fail(Stage::Extract, err.into()))),
                    }
                }
                RunState::Transforming(dataset) => {
                    self.enter(Stage::Transform);
                    match processing::transform(&dataset, &self.options.transform, stamped_at) {
                        Ok(output) => {
                            self.completed(Stage::Transform, output.record_count());
                            RunState::Loading(output)
                        }
                        Err(err) => {
                            RunState::Finalizing(Err(self.fail(Stage::Transform, err.into())))
                        }
                    }
                }
                RunState::Loading(output) => {
                    self.enter(Stage::Load);
                    match self.loader.load(&output) {
                        Ok(summary) => {
                            let records = summary.records_written();
                            self.completed(Stage::Load, records);
                            RunState::Finalizing(Ok(records))
                        }
                        Err(err) => RunState::Finalizing(Err(self.fail(Stage::Load, err.into()))),
                    }
                }
                RunState::Finalizing(result) => break result,
            };
        };

        let outcome = match result {
            Ok(records) => RunOutcome {
                run_id: Some(run_id),
                status: RunStatus::Success,
                records_processed: records,
                error_message: None,
                failed_stage: None,
            },
            Err(failure) => RunOutcome {
                run_id: Some(run_id),
                status: RunStatus::Failure,
                records_processed: 0,
                error_message: Some(failure.message),
                failed_stage: Some(failure.stage),
            },
        };

        if let Err(err) = self.recorder.complete(
            handle,
            outcome.status,
            outcome.records_processed,
            outcome.error_message.as_deref(),
        ) {
            self.emit(&PipelineEvent::RecorderFailed {
                message: EtlError::from(err).to_string(),
            });
        }

        self.emit(&PipelineEvent::RunCompleted {
            outcome: outcome.clone(),
        });
        outcome
    }

    fn enter(&self, stage: Stage) {
        self.emit(&PipelineEvent::StageEntered { stage });
    }

    fn completed(&self, stage: Stage, records: usize) {
        self.emit(&PipelineEvent::StageCompleted { stage, records });
    }

    fn fail(&self, stage: Stage, err: EtlError) -> StageFailure {
        let message = err.to_string();
        self.emit(&PipelineEvent::StageFailed {
            stage,
            severity: err.severity(),
            message: message.clone(),
        });
        StageFailure { stage, message }
    }

    fn emit(&self, event: &PipelineEvent) {
        self.observer.on_event(event);
        if !matches!(event, PipelineEvent::RunCompleted { .. })
            && event.severity() >= self.options.alert_at_or_above
        {
            self.observer.on_alert(event);
        }
    }
}

/// Maps an error onto the severity reported to observers.
trait Classify {
    fn severity(&self) -> Severity;
}

impl Classify for ExtractionError {
    fn severity(&self) -> Severity {
        match self {
            Self::SourceMissing { .. } | Self::Io { .. } => Severity::Critical,
            Self::Decode { .. } | Self::Csv { .. } | Self::Empty { .. } => Severity::Error,
        }
    }
}

impl Classify for TransformationError {
    fn severity(&self) -> Severity {
        Severity::Error
    }
}

impl Classify for LoadError {
    fn severity(&self) -> Severity {
        match self {
            Self::Io { .. } | Self::Open { .. } | Self::Schema(_) | Self::Sql { .. } => {
                Severity::Critical
            }
            Self::DuplicatePlayerKey { .. } | Self::DanglingReference { .. } => Severity::Error,
        }
    }
}

impl Classify for RecorderError {
    fn severity(&self) -> Severity {
        Severity::Critical
    }
}

impl Classify for EtlError {
    fn severity(&self) -> Severity {
        match self {
            Self::Extraction(e) => e.severity(),
            Self::Transformation(e) => e.severity(),
            Self::Load(e) => e.severity(),
            Self::Recorder(e) => e.severity(),
        }
    }
}
