//! Fare fetchers
//!
//! Fetchers drive the booking site's JSON search endpoints and append
//! normalized rows to the output CSV. Failures inside a single date or
//! cabin-type iteration are reported and that iteration is skipped; the run
//! continues with the next one.

pub mod domestic;
pub mod http;
pub mod international;

pub use domestic::DomesticFareFetcher;
pub use international::InternationalFareFetcher;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Non-success status from an upstream call
    #[error("HTTP error: {0}")]
    Http(String),

    /// Request never completed
    #[error("network error: {0}")]
    Network(String),

    /// Expected field or structure absent from a response
    #[error("parse error: {0}")]
    Parse(String),

    /// CSV output failure
    #[error("output error: {0}")]
    Output(#[from] crate::output::OutputError),
}

/// Result type for fetcher operations
pub type FetchResult<T> = Result<T, FetchError>;
