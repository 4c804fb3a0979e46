//! CSV output
//!
//! Output path derivation and the scoped append writer. Files are append-only;
//! reruns against the same path keep appending rows (duplicates are allowed by
//! contract) and the header is written only when the file is empty.

use chrono::NaiveDate;
use std::path::PathBuf;

pub mod csv;

/// Output writer errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// CSV write error
    #[error("CSV error: {0}")]
    Csv(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Derive the output CSV path for a run.
///
/// An explicit base name gets `.csv` appended; otherwise the file is named
/// `{origin}_{destination}_{today}.csv`. The date is passed in by the caller
/// rather than read here.
pub fn derive_output_path(
    base: Option<&str>,
    origin: &str,
    destination: &str,
    today: NaiveDate,
) -> PathBuf {
    match base {
        Some(base) => PathBuf::from(format!("{base}.csv")),
        None => PathBuf::from(format!("{origin}_{destination}_{today}.csv")),
    }
}
