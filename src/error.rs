//! Error types for the splitter.
//!
//! Every fatal condition of a run surfaces as one of these variants. A page
//! that yields no identifier is not an error; it is recorded as `None` on the
//! [`PageRecord`](crate::extract::PageRecord).

use std::path::PathBuf;

/// Result type alias for splitter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during a split run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No source document or reference table could be located
    #[error("Input discovery failed: {0}")]
    Discovery(String),

    /// Reference table is missing required column headers
    #[error("Reference table is missing required columns: {}", missing.join(", "))]
    Schema {
        /// Header names that were not found
        missing: Vec<String>,
    },

    /// Same policy identifier mapped to two different producers
    #[error("Policy identifier {identifier} maps to both '{first}' and '{second}'")]
    AmbiguousIdentifier {
        /// Normalized policy identifier
        identifier: String,
        /// Producer of the first record in load order
        first: String,
        /// Producer of the conflicting record
        second: String,
    },

    /// Workbook could not be opened or read
    #[error("Workbook error: {0}")]
    Workbook(String),

    /// Source document could not be parsed or rendered
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Output artifact could not be written
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        /// Path that was being written
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Report or bundle archive could not be assembled
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Segmentation does not partition the page range
    #[error("Page partition violated: {0}")]
    Partition(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap an IO error raised while producing `path`.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}
