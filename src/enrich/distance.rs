//! Flight distance lookup
//!
//! Fetches the public airport distance calculator page for a route and extracts
//! the kilometer figure by pattern match. No retry and no caching: each fetch
//! call re-issues the lookup.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use tracing::debug;

use super::{EnrichError, EnrichResult};

const BASE_URL: &str = "https://www.airportdistancecalculator.com";

static KILOMETERS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+) kilometers").expect("valid kilometers regex"));

/// Fetch the flight distance between two airports, in kilometers.
pub async fn flight_distance_km(
    client: &Client,
    origin: &str,
    destination: &str,
) -> EnrichResult<u32> {
    let url = format!("{BASE_URL}/flight-{origin}-to-{destination}.html");
    debug!("fetching flight distance from {url}");

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| EnrichError::Http(format!("distance lookup failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(EnrichError::Http(format!(
            "distance lookup returned {status} for {origin} -> {destination}"
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| EnrichError::Http(format!("failed to read distance page: {e}")))?;

    parse_distance_km(&body)
}

/// Extract the first `<n> kilometers` figure from a distance page body.
pub fn parse_distance_km(html: &str) -> EnrichResult<u32> {
    let caps = KILOMETERS_RE.captures(html).ok_or_else(|| {
        EnrichError::Pattern("no 'N kilometers' marker in distance page".to_string())
    })?;

    caps[1]
        .parse::<u32>()
        .map_err(|_| EnrichError::Pattern(format!("kilometer figure out of range: {}", &caps[1])))
}
