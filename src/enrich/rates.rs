//! USD exchange rate lookup
//!
//! The rate page embeds its chart data as a JSON array-of-arrays inside a
//! script tag; the latest rate is the last element of the last row. An
//! unusable rate is a fatal precondition for the whole run, so every failure
//! shape gets a distinct error instead of a silent empty result.

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{EnrichError, EnrichResult};

const RATE_URL: &str = "https://tgju.org/profile/price_dollar_rl";

static CHART_DATA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"chartData:\s*(\[\[.*?\]\])").expect("valid chartData regex"));

/// Fetch the current USD exchange rate in rials per dollar.
pub async fn usd_rate_irr(client: &Client) -> EnrichResult<f64> {
    debug!("fetching USD exchange rate from {RATE_URL}");

    let response = client
        .get(RATE_URL)
        .send()
        .await
        .map_err(|e| EnrichError::Http(format!("rate lookup failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(EnrichError::Http(format!("rate page returned {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| EnrichError::Http(format!("failed to read rate page: {e}")))?;

    parse_rate(&body)
}

/// Extract the latest rate point from a rate page body.
///
/// Rate points may be JSON numbers or numeric strings (with thousands
/// separators); anything else, and any non-positive value, is rejected.
pub fn parse_rate(html: &str) -> EnrichResult<f64> {
    let caps = CHART_DATA_RE
        .captures(html)
        .ok_or_else(|| EnrichError::Pattern("no chartData block in rate page".to_string()))?;

    let rows: Value = serde_json::from_str(&caps[1])
        .map_err(|e| EnrichError::Pattern(format!("chartData is not valid JSON: {e}")))?;

    let point = rows
        .as_array()
        .and_then(|rows| rows.last())
        .and_then(|row| row.as_array())
        .and_then(|row| row.last())
        .ok_or_else(|| EnrichError::Pattern("chartData has no rate points".to_string()))?;

    let rate = match point {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.replace(',', "").parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| EnrichError::InvalidRate(format!("unreadable rate point: {point}")))?;

    if rate <= 0.0 {
        return Err(EnrichError::InvalidRate(format!(
            "non-positive rate: {rate}"
        )));
    }

    Ok(rate)
}
