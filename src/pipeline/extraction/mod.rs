pub mod types;
pub mod format;
pub mod sanitize;
pub mod numeric;
pub mod pdf;
pub mod line_reconstruct;
pub mod table;
pub mod header_detect;
pub mod classify;
pub mod pdf_rows;
pub mod generic;
pub mod hierarchy;
pub mod orchestrator;

pub use types::*;
pub use format::*;
pub use numeric::*;
pub use pdf::*;
pub use orchestrator::*;

use thiserror::Error;

/// Conditions that stop a document from yielding any reviewable rows.
/// All of them are user-facing and recoverable; none panics.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Document contains no extractable lines or rows")]
    EmptyDocument,

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("PDF parsing failed: {0}")]
    MalformedPdf(String),

    #[error("Spreadsheet parsing failed: {0}")]
    MalformedSpreadsheet(String),

    #[error("File too large: {size_bytes} bytes exceeds {max_bytes} byte limit")]
    FileTooLarge { size_bytes: u64, max_bytes: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
