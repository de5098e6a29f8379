use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::RunOutcome;

/// Severity classification used for stage failures and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal).
    Warning,
    /// Error-level event (the run failed on its data).
    Error,
    /// Critical error (I/O, missing source, or an unusable store).
    Critical,
}

/// Pipeline stage a run is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Extract,
    Transform,
    Load,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Extract => "extract",
            Self::Transform => "transform",
            Self::Load => "load",
        })
    }
}

/// Events emitted by [`super::Pipeline::run`].
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    RunStarted { run_id: i64, source: PathBuf },
    StageEntered { stage: Stage },
    StageCompleted { stage: Stage, records: usize },
    StageFailed {
        stage: Stage,
        severity: Severity,
        message: String,
    },
    /// Run bookkeeping failed; the run outcome is unaffected.
    RecorderFailed { message: String },
    RunCompleted { outcome: RunOutcome },
}

impl PipelineEvent {
    /// Severity of this event.
    pub fn severity(&self) -> Severity {
        match self {
            Self::StageFailed { severity, .. } => *severity,
            Self::RecorderFailed { .. } => Severity::Critical,
            Self::RunCompleted { outcome } if !outcome.is_success() => Severity::Error,
            _ => Severity::Info,
        }
    }
}

/// Observer interface for pipeline runs.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait PipelineObserver: Send + Sync {
    fn on_event(&self, _event: &PipelineEvent) {}

    /// Called when an event meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_event`].
    fn on_alert(&self, event: &PipelineEvent) {
        self.on_event(event)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn PipelineObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn PipelineObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl PipelineObserver for CompositeObserver {
    fn on_event(&self, event: &PipelineEvent) {
        for o in &self.observers {
            o.on_event(event);
        }
    }

    fn on_alert(&self, event: &PipelineEvent) {
        for o in &self.observers {
            o.on_alert(event);
        }
    }
}

/// Emits pipeline events as `tracing` records. The default observer.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::RunStarted { run_id, source } => {
                info!(run_id, source = %source.display(), "run started");
            }
            PipelineEvent::StageEntered { stage } => debug!(%stage, "stage entered"),
            PipelineEvent::StageCompleted { stage, records } => {
                info!(%stage, records, "stage completed");
            }
            PipelineEvent::StageFailed {
                stage,
                severity,
                message,
            } => error!(%stage, ?severity, %message, "stage failed"),
            PipelineEvent::RecorderFailed { message } => {
                warn!(%message, "run bookkeeping failed");
            }
            PipelineEvent::RunCompleted { outcome } => {
                if outcome.is_success() {
                    info!(
                        run_id = outcome.run_id,
                        records_processed = outcome.records_processed,
                        "run succeeded"
                    );
                } else {
                    error!(
                        run_id = outcome.run_id,
                        error = outcome.error_message.as_deref().unwrap_or(""),
                        "run failed"
                    );
                }
            }
        }
    }

    fn on_alert(&self, event: &PipelineEvent) {
        error!(severity = ?event.severity(), ?event, "ALERT");
    }
}
