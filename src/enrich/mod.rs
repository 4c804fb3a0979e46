//! Listing enrichment helpers
//!
//! Computed fields attached to every fare row: flight distance, USD exchange
//! rate, UTC-normalized timestamps and Jalali calendar display strings. The
//! distance and rate lookups talk to public web pages and extract a single
//! value by pattern match; they are fetched once per run and applied uniformly
//! to all rows.

pub mod distance;
pub mod jalali;
pub mod rates;
pub mod timezone;

pub use timezone::{TimeZoneResolver, ZonedTime};

/// Enrichment errors
#[derive(Debug, thiserror::Error)]
pub enum EnrichError {
    /// HTTP request failed or returned a non-success status
    #[error("HTTP error: {0}")]
    Http(String),

    /// Expected pattern or field absent from the response body
    #[error("pattern not found: {0}")]
    Pattern(String),

    /// City could not be resolved to coordinates
    #[error("geocoding failed: {0}")]
    Geocoding(String),

    /// Extracted exchange rate is unusable for cost computation
    #[error("invalid exchange rate: {0}")]
    InvalidRate(String),
}

/// Result type for enrichment operations
pub type EnrichResult<T> = Result<T, EnrichError>;
