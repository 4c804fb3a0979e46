//! City timezone resolution and UTC normalization
//!
//! International fare timestamps arrive as naive local times tagged only by a
//! city name. Resolution runs city -> coordinates (Nominatim) -> IANA zone
//! (offline polygon lookup) -> UTC. A failure at any step degrades to an
//! explicit [`ZonedTime::Unresolved`] carrying the reason, so a bad city name
//! never aborts a row batch.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use tzf_rs::DefaultFinder;

use super::{EnrichError, EnrichResult};

const GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/search";

/// A local timestamp after timezone normalization: either a UTC instant or an
/// explicit reason why the zone could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZonedTime {
    /// Timestamp normalized to UTC
    Resolved(DateTime<Utc>),
    /// Resolution failed; the reason stands in for the timestamp in output
    Unresolved(String),
}

impl std::fmt::Display for ZonedTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ZonedTime::Resolved(dt) => write!(f, "{} (UTC)", dt.format("%Y-%m-%d %H:%M")),
            ZonedTime::Unresolved(reason) => write!(f, "{reason}"),
        }
    }
}

/// One geocoder hit; Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct GeocodeHit {
    lat: String,
    lon: String,
}

/// Resolves city names to timezones and normalizes local timestamps to UTC.
pub struct TimeZoneResolver {
    client: Client,
    finder: DefaultFinder,
}

impl TimeZoneResolver {
    /// Create a resolver over an injected HTTP client. Building the polygon
    /// index is not free, so construct once per run and reuse.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            finder: DefaultFinder::new(),
        }
    }

    /// Normalize a naive local timestamp in the named city to UTC.
    pub async fn to_utc(&self, city: &str, local: NaiveDateTime) -> ZonedTime {
        let (lat, lon) = match self.geocode(city).await {
            Ok(coords) => coords,
            Err(e) => return ZonedTime::Unresolved(e.to_string()),
        };

        let zone_name = self.finder.get_tz_name(lon, lat);
        if zone_name.is_empty() {
            return ZonedTime::Unresolved(format!("no time zone found at {lat},{lon}"));
        }
        debug!("resolved {city} to zone {zone_name}");

        in_zone(zone_name, local)
    }

    /// Geocode a city name to `(lat, lon)` via the first search hit.
    async fn geocode(&self, city: &str) -> EnrichResult<(f64, f64)> {
        let response = self
            .client
            .get(GEOCODE_URL)
            .query(&[("q", city), ("format", "json"), ("limit", "1")])
            .send()
            .await
            .map_err(|e| EnrichError::Geocoding(format!("geocoding '{city}' failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EnrichError::Geocoding(format!(
                "geocoder returned {status} for '{city}'"
            )));
        }

        let hits: Vec<GeocodeHit> = response.json().await.map_err(|e| {
            EnrichError::Geocoding(format!("unreadable geocoder response for '{city}': {e}"))
        })?;

        let hit = hits
            .first()
            .ok_or_else(|| EnrichError::Geocoding(format!("no geocoder match for '{city}'")))?;

        let lat = hit
            .lat
            .parse::<f64>()
            .map_err(|_| EnrichError::Geocoding(format!("bad latitude '{}'", hit.lat)))?;
        let lon = hit
            .lon
            .parse::<f64>()
            .map_err(|_| EnrichError::Geocoding(format!("bad longitude '{}'", hit.lon)))?;

        Ok((lat, lon))
    }
}

/// Interpret a naive local timestamp in the named IANA zone and convert to UTC.
///
/// An unknown zone name or a timestamp that falls into a DST gap degrades to
/// [`ZonedTime::Unresolved`].
pub fn in_zone(zone_name: &str, local: NaiveDateTime) -> ZonedTime {
    let tz: Tz = match zone_name.parse() {
        Ok(tz) => tz,
        Err(_) => return ZonedTime::Unresolved(format!("unknown time zone '{zone_name}'")),
    };

    match tz.from_local_datetime(&local).earliest() {
        Some(dt) => ZonedTime::Resolved(dt.with_timezone(&Utc)),
        None => ZonedTime::Unresolved(format!("{local} does not exist in {zone_name}")),
    }
}
