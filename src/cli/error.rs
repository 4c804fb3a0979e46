//! CLI error types and conversions

use crate::dates::DateRangeError;
use crate::enrich::EnrichError;
use crate::fetcher::FetchError;
use crate::output::OutputError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Date argument or range error
    #[error("date error: {0}")]
    Date(#[from] DateRangeError),

    /// Enrichment precondition failed (rate or distance unavailable)
    #[error("enrichment error: {0}")]
    Enrich(#[from] EnrichError),

    /// Fetcher error
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// Output error
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),
}
