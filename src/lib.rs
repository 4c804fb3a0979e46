//! # Fare Miner Library
//!
//! Core library for mining airline fare listings from a booking site and
//! appending normalized rows to per-route CSV files.
//!
//! ## Features
//!
//! - **Domestic search**: single-call availability endpoint, one row per itinerary
//! - **International search**: three-stage protocol (initiate, poll providers,
//!   paginate by stop count), one row per flight and cabin-type/stop combination
//! - **Enrichment**: flight distance lookup, live USD exchange rate, UTC-normalized
//!   timestamps, Jalali calendar display strings
//! - **Append-only CSV**: header written once per file, reruns keep appending
//!
//! ## Architecture
//!
//! The library is organized into several core modules:
//!
//! - [`dates`] - Expansion of a start/end pair into the per-day query sequence
//! - [`enrich`] - Distance, exchange rate, timezone and calendar helpers
//! - [`fetcher`] - Fare fetchers for the booking site's search endpoints
//! - [`output`] - CSV output path derivation and scoped append writer
//! - [`cli`] - Command-line interface and run loop

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::NaiveDate;

/// CLI command implementation
pub mod cli;

/// Date range expansion
pub mod dates;

/// Listing enrichment helpers
pub mod enrich;

/// Fare fetchers
pub mod fetcher;

/// CSV output
pub mod output;

/// Cabin fare class selector, encoded as the upstream API's numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CabinType {
    /// Economy class (code "1")
    Economy,
    /// Business class (code "3")
    Business,
    /// First class (code "5")
    First,
}

impl CabinType {
    /// Every cabin type queried by the international flow, in query order.
    pub const ALL: [CabinType; 3] = [CabinType::Economy, CabinType::Business, CabinType::First];

    /// Upstream API code for this cabin type.
    pub fn code(&self) -> &'static str {
        match self {
            CabinType::Economy => "1",
            CabinType::Business => "3",
            CabinType::First => "5",
        }
    }
}

impl std::fmt::Display for CabinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CabinType::Economy => "economy",
            CabinType::Business => "business",
            CabinType::First => "first",
        };
        write!(f, "{s}")
    }
}

/// Outbound stop-count filter for international pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopFilter {
    /// Direct flights only (code "0")
    Direct,
    /// Exactly one intermediate stop (code "1")
    OneStop,
}

impl StopFilter {
    /// Every stop filter queried by the international flow, in query order.
    pub const ALL: [StopFilter; 2] = [StopFilter::Direct, StopFilter::OneStop];

    /// Upstream API code for this filter.
    pub fn code(&self) -> &'static str {
        match self {
            StopFilter::Direct => "0",
            StopFilter::OneStop => "1",
        }
    }
}

impl std::fmt::Display for StopFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StopFilter::Direct => "direct",
            StopFilter::OneStop => "one stop",
        };
        write!(f, "{s}")
    }
}

/// Immutable input to a single fare fetch: the route, the departure date, and
/// the enrichment values fetched once and applied uniformly to every row the
/// fetch produces.
#[derive(Debug, Clone)]
pub struct FareQuery {
    /// Departure location IATA code (e.g. "THR")
    pub origin: String,
    /// Arrival location IATA code (e.g. "IST")
    pub destination: String,
    /// Departure date to query
    pub date: NaiveDate,
    /// USD exchange rate in rials per dollar
    pub rate_irr: f64,
    /// Flight distance in kilometers
    pub distance_km: u32,
}

/// USD cost for a listing, formatted to two decimal places.
pub fn cost_usd(price_irr: f64, rate_irr: f64) -> String {
    format!("{:.2}", price_irr / rate_irr)
}

/// Toman cost for a listing. Prices arrive in rials; one toman is ten rials.
pub fn cost_toman(price_irr: f64) -> f64 {
    price_irr / 10.0
}
