//! Source resolution: primary file, then the pre-staged fallback payload.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{ExtractionError, ExtractionResult};

/// Where to read the source from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// The delimited file normally read on every run.
    pub primary: PathBuf,
    /// A previously uploaded payload read once when `primary` does not exist.
    pub fallback: Option<PathBuf>,
}

impl SourceLocation {
    /// A location without a fallback.
    pub fn new(primary: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            fallback: None,
        }
    }

    /// Attach a fallback payload path.
    pub fn with_fallback(mut self, fallback: impl Into<PathBuf>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }
}

/// Which path the bytes actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    Primary,
    Fallback,
}

pub(crate) struct ResolvedSource {
    pub path: PathBuf,
    pub origin: SourceOrigin,
    pub bytes: Vec<u8>,
}

/// Read the primary source, or the fallback when the primary is missing.
pub(crate) fn read_source(location: &SourceLocation) -> ExtractionResult<ResolvedSource> {
    match std::fs::read(&location.primary) {
        Ok(bytes) => {
            return Ok(ResolvedSource {
                path: location.primary.clone(),
                origin: SourceOrigin::Primary,
                bytes,
            });
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(source) => {
            return Err(ExtractionError::Io {
                path: location.primary.clone(),
                source,
            });
        }
    }

    let missing = || ExtractionError::SourceMissing {
        primary: location.primary.clone(),
        fallback: location.fallback.clone(),
    };
    let fallback = location.fallback.as_ref().ok_or_else(missing)?;

    info!(
        primary = %location.primary.display(),
        fallback = %fallback.display(),
        "primary source not found, loading pre-staged payload"
    );
    match std::fs::read(fallback) {
        Ok(bytes) => Ok(ResolvedSource {
            path: fallback.clone(),
            origin: SourceOrigin::Fallback,
            bytes,
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(missing()),
        Err(source) => Err(ExtractionError::Io {
            path: fallback.clone(),
            source,
        }),
    }
}

/// Stage the fallback payload at the primary path so later runs read it directly.
///
/// The original bytes are written unchanged, so the configured encoding decodes them the same way
/// on every later run. Best effort: a failed write is logged and otherwise ignored.
pub(crate) fn persist_fallback(primary: &Path, bytes: &[u8]) {
    let result = primary
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or(Ok(()), std::fs::create_dir_all)
        .and_then(|()| std::fs::write(primary, bytes));
    match result {
        Ok(()) => info!(path = %primary.display(), "saved fallback payload as primary source"),
        Err(e) => warn!(path = %primary.display(), error = %e, "could not save fallback payload"),
    }
}
