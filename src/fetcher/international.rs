//! International fare fetcher
//!
//! Drives the three-stage search protocol per (date, cabin type) pair:
//! initiate a one-way search to obtain a `search_id`, poll each of the twelve
//! fare providers against it, then paginate by stop count and normalize the
//! first route option of every flight into a CSV row.
//!
//! The original flow discarded every provider poll response except the last;
//! here each poll is checked individually and pagination proceeds once at
//! least one provider reported in.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use tracing::{info, warn};

use super::http::JsonClient;
use super::{FetchError, FetchResult};
use crate::enrich::{TimeZoneResolver, ZonedTime};
use crate::output;
use crate::{cost_toman, cost_usd, CabinType, FareQuery, StopFilter};

const DEFAULT_BASE_URL: &str = "https://respina24.ir";

/// Provider identifiers polled in stage two.
const PROVIDER_IDS: std::ops::RangeInclusive<u8> = 1..=12;

/// Column set for international fare rows.
pub const INTERNATIONAL_HEADER: [&str; 14] = [
    "From",
    "Stop",
    "To",
    "Total Time",
    "Total Distance (km)",
    "Class",
    "Departure Date and Time (GMT)",
    "Arrival Date and Time (GMT)",
    "Aircraft",
    "Airline",
    "Flight Number",
    "Cost (Toman)",
    "Cost (USD)",
    "USD to Toman Rate",
];

/// Stage-one response: the opaque token correlating the later stages.
#[derive(Debug, Deserialize)]
pub struct SearchHandle {
    /// Search token; number or string depending on the upstream, passed
    /// through untouched
    pub search_id: Value,
}

/// Stage-three response.
///
/// Flight records are kept as raw JSON and converted one at a time, so a
/// single malformed record cannot sink the whole page.
#[derive(Debug, Deserialize)]
pub struct PaginationResponse {
    /// Raw flight records matching the requested stop filter
    #[serde(default)]
    pub flights: Vec<Value>,
}

/// One priced flight record. Only the first route option is used; alternative
/// routings within the same record are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct InternationalFlight {
    /// Route options ("masir" is the upstream API's field name)
    #[serde(default)]
    pub masir: Vec<RouteOption>,
    /// Intermediate landing count for the outbound route
    #[serde(rename = "outboundStops", default)]
    pub outbound_stops: i64,
    /// Adult fare in rials
    #[serde(rename = "adultPrice")]
    pub adult_price: f64,
}

/// One routing for a flight record, made of one or more legs.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteOption {
    /// Flight segments in order
    #[serde(default)]
    pub legs: Vec<RouteLeg>,
    /// Operating airline display name
    #[serde(rename = "AirlineName", default)]
    pub airline_name: String,
    /// End-to-end journey duration
    #[serde(rename = "JourneyDuration", default)]
    pub journey_duration: String,
    /// Flight numbers; string or list depending on the upstream
    #[serde(rename = "flightNumbers", default)]
    pub flight_numbers: Value,
    /// Departure city display name
    #[serde(rename = "fromCityName", default)]
    pub from_city_name: String,
    /// Departure airport code
    #[serde(default)]
    pub from: String,
    /// Departure timestamp, naive local ISO
    #[serde(rename = "DepartureDateTime", default)]
    pub departure_date_time: String,
    /// Arrival city display name
    #[serde(rename = "toCityName", default)]
    pub to_city_name: String,
    /// Arrival airport code
    #[serde(default)]
    pub to: String,
    /// Arrival timestamp, naive local ISO
    #[serde(rename = "ArrivalDateTime", default)]
    pub arrival_date_time: String,
}

/// One flight segment within a route option.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteLeg {
    /// Cabin class display value for this leg
    #[serde(rename = "cabinTypeValue", default)]
    pub cabin_type_value: String,
    /// Segment arrival city display name
    #[serde(rename = "toCityName", default)]
    pub to_city_name: String,
    /// Segment arrival airport code
    #[serde(default)]
    pub to: String,
}

/// Flattened CSV row for one international flight. Field order matches
/// [`INTERNATIONAL_HEADER`].
#[derive(Debug, Serialize)]
pub struct InternationalFareRow {
    from: String,
    stop: String,
    to: String,
    total_time: String,
    distance_km: u32,
    class: String,
    departure: String,
    arrival: String,
    aircraft: String,
    airline: String,
    flight_number: String,
    cost_toman: f64,
    cost_usd: String,
    rate_toman: f64,
}

/// Fetches international fares through the three-stage protocol and appends
/// them to the output CSV.
pub struct InternationalFareFetcher<'a> {
    http: &'a JsonClient,
    timezones: &'a TimeZoneResolver,
    base_url: String,
}

impl<'a> InternationalFareFetcher<'a> {
    /// Create a fetcher against the production endpoints.
    pub fn new(http: &'a JsonClient, timezones: &'a TimeZoneResolver) -> Self {
        Self::with_base_url(http, timezones, DEFAULT_BASE_URL)
    }

    /// Create a fetcher against an alternate base URL.
    pub fn with_base_url(
        http: &'a JsonClient,
        timezones: &'a TimeZoneResolver,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            timezones,
            base_url: base_url.into(),
        }
    }

    /// Run the full protocol for every cabin type on the query date.
    ///
    /// A failed cabin-type iteration is logged and skipped; the remaining
    /// cabin types still run. Returns the total number of rows written.
    pub async fn fetch(&self, query: &FareQuery, output_path: &Path) -> FetchResult<usize> {
        info!(
            "getting international fares for {} => {} on {}",
            query.origin, query.destination, query.date
        );
        info!("press Ctrl+C to stop once you are happy with the results");

        let mut total = 0;
        for cabin in CabinType::ALL {
            match self.fetch_cabin(query, cabin, output_path).await {
                Ok(written) => total += written,
                Err(e) => warn!("skipping {cabin} cabin: {e}"),
            }
        }
        Ok(total)
    }

    async fn fetch_cabin(
        &self,
        query: &FareQuery,
        cabin: CabinType,
        output_path: &Path,
    ) -> FetchResult<usize> {
        let handle = self.initiate(query, cabin).await?;

        let healthy = self.poll_providers(&handle).await;
        if healthy == 0 {
            return Err(FetchError::Http(
                "all provider polls failed for this search".to_string(),
            ));
        }

        let mut written = 0;
        for stops in StopFilter::ALL {
            let flights = self.page(&handle, stops).await?;
            let rows = self.build_rows(query, &flights).await;
            written += output::csv::append_rows(output_path, &INTERNATIONAL_HEADER, &rows)?;
            info!(
                "appended {} rows for {cabin} cabin, {stops} flights",
                rows.len()
            );
        }
        Ok(written)
    }

    /// Stage one: submit a one-way, one-adult search and obtain the token.
    async fn initiate(&self, query: &FareQuery, cabin: CabinType) -> FetchResult<SearchHandle> {
        let payload = json!({
            "adult": "1",
            "child": "0",
            "infant": "0",
            "cabinType": cabin.code(),
            "tripType": "1",
            "itineries": [{
                "from": query.origin,
                "to": query.destination,
                "date": query.date.to_string(),
                "fromIsCity": 1,
                "toIsCity": 1,
            }],
            "cache": "1",
            "indexFlight": 0,
            "searchId": 0,
        });

        let url = format!("{}/internationalflight/getFlightAjax", self.base_url);
        self.http.post_json(&url, &payload).await
    }

    /// Stage two: poll each provider once, sequentially. Individual failures
    /// are logged per provider; returns how many polls succeeded.
    async fn poll_providers(&self, handle: &SearchHandle) -> usize {
        let url = format!("{}/internationalflight/getFlightAjax2", self.base_url);
        let mut healthy = 0;

        for provider_id in PROVIDER_IDS {
            let payload = json!({
                "api_id": provider_id.to_string(),
                "api_name": "api",
                "search_id": handle.search_id,
            });
            match self.http.post_json::<Value, _>(&url, &payload).await {
                Ok(_) => healthy += 1,
                Err(e) => warn!("provider {provider_id} poll failed: {e}"),
            }
        }
        healthy
    }

    /// Stage three: request page 1 filtered by stop count.
    async fn page(
        &self,
        handle: &SearchHandle,
        stops: StopFilter,
    ) -> FetchResult<Vec<Value>> {
        let payload = json!({
            "searchId": handle.search_id,
            "page": 1,
            "filter": { "outboundStops": [stops.code()] },
        });

        let url = format!(
            "{}/internationalflight/getFlightAjaxPagination",
            self.base_url
        );
        let response: PaginationResponse = self.http.post_json(&url, &payload).await?;
        Ok(response.flights)
    }

    /// Normalize raw flight records into CSV rows, skipping malformed records.
    async fn build_rows(
        &self,
        query: &FareQuery,
        records: &[Value],
    ) -> Vec<InternationalFareRow> {
        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            let flight = match parse_flight(record) {
                Ok(flight) => flight,
                Err(e) => {
                    warn!("skipping malformed flight record: {e}");
                    continue;
                }
            };
            let Some(route) = flight.masir.first() else {
                warn!("skipping flight record with no route options");
                continue;
            };
            let departure = self
                .zoned(&route.from_city_name, &route.departure_date_time)
                .await;
            let arrival = self
                .zoned(&route.to_city_name, &route.arrival_date_time)
                .await;
            match row_for(query, &flight, departure, arrival) {
                Ok(row) => rows.push(row),
                Err(e) => warn!("skipping malformed flight record: {e}"),
            }
        }
        rows
    }

    /// Resolve a naive upstream timestamp in the named city to UTC.
    async fn zoned(&self, city: &str, stamp: &str) -> ZonedTime {
        match parse_upstream_datetime(stamp) {
            Some(local) => self.timezones.to_utc(city, local).await,
            None => ZonedTime::Unresolved(format!("unparseable timestamp '{stamp}'")),
        }
    }
}

fn parse_flight(record: &Value) -> FetchResult<InternationalFlight> {
    serde_json::from_value(record.clone())
        .map_err(|e| FetchError::Parse(format!("bad flight record: {e}")))
}

/// Parse the upstream's naive ISO timestamps, with or without seconds.
fn parse_upstream_datetime(stamp: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(stamp, format).ok())
}

/// Build the CSV row for a flight's first route option with pre-resolved
/// endpoint timestamps.
pub fn row_for(
    query: &FareQuery,
    flight: &InternationalFlight,
    departure: ZonedTime,
    arrival: ZonedTime,
) -> FetchResult<InternationalFareRow> {
    let route = flight
        .masir
        .first()
        .ok_or_else(|| FetchError::Parse("flight record has no route options".to_string()))?;
    let first_leg = route
        .legs
        .first()
        .ok_or_else(|| FetchError::Parse("route option has no legs".to_string()))?;

    // Exactly one stop means the first leg lands at the stopover.
    let stop = if flight.outbound_stops == 1 {
        format!("{}({})", first_leg.to_city_name, first_leg.to)
    } else {
        String::new()
    };

    Ok(InternationalFareRow {
        from: format!("{}({})", route.from_city_name, route.from),
        stop,
        to: format!("{}({})", route.to_city_name, route.to),
        total_time: route.journey_duration.clone(),
        distance_km: query.distance_km,
        class: first_leg.cabin_type_value.clone(),
        departure: departure.to_string(),
        arrival: arrival.to_string(),
        // The pagination endpoint does not report aircraft models.
        aircraft: String::new(),
        airline: route.airline_name.clone(),
        flight_number: flight_numbers_display(&route.flight_numbers),
        cost_toman: cost_toman(flight.adult_price),
        cost_usd: cost_usd(flight.adult_price, query.rate_irr),
        rate_toman: query.rate_irr / 10.0,
    })
}

/// Render the upstream's flight-number field, whatever shape it arrives in.
fn flight_numbers_display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
