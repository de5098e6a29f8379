//! Extract stage: read the source file into a raw [`crate::types::DataSet`].
//!
//! Most callers should use [`extract`], which:
//!
//! - reads the primary source, or the pre-staged fallback payload when the primary is missing
//! - decodes the bytes per [`TextEncoding`]
//! - parses the delimited text (see [`csv`])
//!
//! ```no_run
//! use nba_stats_etl::ingestion::{extract, ExtractOptions, SourceLocation};
//!
//! # fn main() -> Result<(), nba_stats_etl::error::ExtractionError> {
//! let location = SourceLocation::new("nba_player_stats.csv").with_fallback("paste.txt");
//! let extraction = extract(&location, &ExtractOptions::default())?;
//! println!("rows={}", extraction.dataset.row_count());
//! # Ok(())
//! # }
//! ```

pub mod csv;
pub mod encoding;
pub mod source;

use std::path::PathBuf;

use tracing::info;

use crate::error::{ExtractionError, ExtractionResult};
use crate::types::DataSet;

pub use encoding::TextEncoding;
pub use source::{SourceLocation, SourceOrigin};

/// Options controlling extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
    pub encoding: TextEncoding,
    /// After reading the fallback payload, write it to the primary path.
    pub persist_fallback: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            encoding: TextEncoding::Auto,
            persist_fallback: true,
        }
    }
}

/// Result of a successful extraction.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub dataset: DataSet,
    /// Path the bytes were read from.
    pub path: PathBuf,
    pub origin: SourceOrigin,
}

/// Read, decode and parse the source at `location`.
///
/// Fails with [`ExtractionError`] when the source is missing (both primary and fallback),
/// unreadable, undecodable, or has no header / no data rows.
pub fn extract(location: &SourceLocation, options: &ExtractOptions) -> ExtractionResult<Extraction> {
    let resolved = source::read_source(location)?;
    let text = encoding::decode(&resolved.bytes, options.encoding).map_err(|message| {
        ExtractionError::Decode {
            path: resolved.path.clone(),
            message,
        }
    })?;

    let dataset = csv::parse_delimited(&text, options.delimiter, &resolved.path)?;

    if resolved.origin == SourceOrigin::Fallback && options.persist_fallback {
        source::persist_fallback(&location.primary, &resolved.bytes);
    }

    info!(
        path = %resolved.path.display(),
        origin = ?resolved.origin,
        rows = dataset.row_count(),
        columns = dataset.schema.fields.len(),
        "extracted source rows"
    );

    Ok(Extraction {
        dataset,
        path: resolved.path,
        origin: resolved.origin,
    })
}
