//! Domestic fare fetcher
//!
//! One availability call per date; every itinerary in the response becomes one
//! CSV row. Timestamps are same-day local times rendered in the Jalali
//! calendar. A malformed itinerary is skipped with a warning; the rest of the
//! batch still writes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use tracing::{info, warn};

use super::http::JsonClient;
use super::{FetchError, FetchResult};
use crate::enrich::jalali;
use crate::output;
use crate::{cost_toman, cost_usd, FareQuery};

const DEFAULT_BASE_URL: &str = "https://respina24.ir";

/// Column set for domestic fare rows.
pub const DOMESTIC_HEADER: [&str; 12] = [
    "From",
    "To",
    "Total Time",
    "Total Distance (km)",
    "Class",
    "Departure Date and Time",
    "Arrival Date and Time",
    "Aircraft",
    "Airline",
    "Cost (Toman)",
    "Cost (USD)",
    "USD to Toman Rate",
];

/// Availability endpoint response.
///
/// Itinerary records are kept as raw JSON and converted one at a time in
/// [`build_rows`], so a single malformed record cannot sink the whole batch.
#[derive(Debug, Deserialize)]
pub struct AvailabilityResponse {
    /// Raw priced itinerary records for the queried route and date
    #[serde(default)]
    pub list: Vec<Value>,
}

/// One priced itinerary from the availability endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomesticItinerary {
    /// Adult fare in rials
    pub adult_price: f64,
    /// Operating airline display name
    pub airline_name: String,
    /// Aircraft model, when the airline reports one
    #[serde(default)]
    pub aircraft: String,
    /// Cabin description ("cobin" is the upstream API's own spelling)
    #[serde(default)]
    pub cobin: String,
    /// Booking class letter
    #[serde(rename = "class", default)]
    pub booking_class: String,
    /// Departure date, `YYYY-MM-DD`
    pub departure_date: String,
    /// Departure time, `HH:MM` local
    pub departure_time: String,
    /// Arrival time, `HH:MM` local, same calendar day as departure
    pub arrival_time: String,
    /// Total flight duration as reported upstream
    #[serde(default)]
    pub flight_duration: String,
}

/// Flattened CSV row for one domestic itinerary. Field order matches
/// [`DOMESTIC_HEADER`].
#[derive(Debug, Serialize)]
pub struct DomesticFareRow {
    from: String,
    to: String,
    total_time: String,
    distance_km: u32,
    class: String,
    departure: String,
    arrival: String,
    aircraft: String,
    airline: String,
    cost_toman: f64,
    cost_usd: String,
    rate_toman: f64,
}

/// Fetches domestic fares and appends them to the output CSV.
pub struct DomesticFareFetcher<'a> {
    http: &'a JsonClient,
    base_url: String,
}

impl<'a> DomesticFareFetcher<'a> {
    /// Create a fetcher against the production endpoint.
    pub fn new(http: &'a JsonClient) -> Self {
        Self::with_base_url(http, DEFAULT_BASE_URL)
    }

    /// Create a fetcher against an alternate base URL.
    pub fn with_base_url(http: &'a JsonClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Run one availability search and append one row per itinerary.
    ///
    /// Returns the number of rows written. A non-success response writes
    /// nothing and surfaces the error to the per-date loop.
    pub async fn fetch(&self, query: &FareQuery, output_path: &Path) -> FetchResult<usize> {
        info!(
            "getting domestic fares for {} => {} on {}",
            query.origin, query.destination, query.date
        );

        let payload = json!({
            "from": query.origin,
            "to": query.destination,
            "departureDate": query.date.to_string(),
        });

        let url = format!("{}/flight/availability", self.base_url);
        let response: AvailabilityResponse = self.http.post_json(&url, &payload).await?;

        let rows = build_rows(query, &response.list);
        let written = output::csv::append_rows(output_path, &DOMESTIC_HEADER, &rows)?;
        info!(
            "appended {written} domestic rows to {}",
            output_path.display()
        );
        Ok(written)
    }
}

/// Normalize raw itinerary records into CSV rows, skipping malformed records.
pub fn build_rows(query: &FareQuery, records: &[Value]) -> Vec<DomesticFareRow> {
    records
        .iter()
        .filter_map(|record| match parse_itinerary(record).and_then(|i| row_for(query, &i)) {
            Ok(row) => Some(row),
            Err(e) => {
                warn!("skipping malformed itinerary: {e}");
                None
            }
        })
        .collect()
}

fn parse_itinerary(record: &Value) -> FetchResult<DomesticItinerary> {
    serde_json::from_value(record.clone())
        .map_err(|e| FetchError::Parse(format!("bad itinerary record: {e}")))
}

fn row_for(query: &FareQuery, itinerary: &DomesticItinerary) -> FetchResult<DomesticFareRow> {
    let departure = parse_local(&itinerary.departure_date, &itinerary.departure_time)?;
    // Same-day contract: arrival shares the departure date.
    let arrival = parse_local(&itinerary.departure_date, &itinerary.arrival_time)?;

    Ok(DomesticFareRow {
        from: query.origin.clone(),
        to: query.destination.clone(),
        total_time: itinerary.flight_duration.clone(),
        distance_km: query.distance_km,
        class: format!("{} {}", itinerary.cobin, itinerary.booking_class),
        departure: jalali::to_jalali(departure),
        arrival: jalali::to_jalali(arrival),
        aircraft: itinerary.aircraft.clone(),
        airline: itinerary.airline_name.clone(),
        cost_toman: cost_toman(itinerary.adult_price),
        cost_usd: cost_usd(itinerary.adult_price, query.rate_irr),
        rate_toman: query.rate_irr / 10.0,
    })
}

fn parse_local(date: &str, time: &str) -> FetchResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M")
        .map_err(|e| FetchError::Parse(format!("bad timestamp '{date} {time}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn query() -> FareQuery {
        FareQuery {
            origin: "THR".to_string(),
            destination: "MHD".to_string(),
            date: NaiveDate::from_ymd_opt(2023, 10, 18).unwrap(),
            rate_irr: 50_000.0,
            distance_km: 1500,
        }
    }

    fn canned_response() -> AvailabilityResponse {
        serde_json::from_str(
            r#"{
                "list": [
                    {
                        "adultPrice": 7500000,
                        "airlineName": "Mahan Air",
                        "aircraft": "A310",
                        "cobin": "Economy",
                        "class": "Y",
                        "departureDate": "2023-10-18",
                        "departureTime": "07:30",
                        "arrivalTime": "09:00",
                        "flightDuration": "01:30"
                    },
                    {
                        "adultPrice": 9100000,
                        "airlineName": "Iran Air",
                        "aircraft": "MD-80",
                        "cobin": "Business",
                        "class": "C",
                        "departureDate": "2023-10-18",
                        "departureTime": "18:45",
                        "arrivalTime": "20:10",
                        "flightDuration": "01:25"
                    }
                ]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_response_deserialization() {
        let response = canned_response();
        assert_eq!(response.list.len(), 2);

        let first = parse_itinerary(&response.list[0]).unwrap();
        assert_eq!(first.airline_name, "Mahan Air");
        assert_eq!(first.booking_class, "Y");
        let second = parse_itinerary(&response.list[1]).unwrap();
        assert_eq!(second.cobin, "Business");
    }

    #[test]
    fn test_missing_list_deserializes_empty() {
        let response: AvailabilityResponse = serde_json::from_str("{}").unwrap();
        assert!(response.list.is_empty());
    }

    #[test]
    fn test_two_itineraries_make_two_rows() {
        let rows = build_rows(&query(), &canned_response().list);
        assert_eq!(rows.len(), 2);
        for row in &rows {
            assert_eq!(row.distance_km, 1500);
            assert_eq!(row.rate_toman, 5000.0);
        }
        assert_eq!(rows[0].cost_toman, 750_000.0);
        assert_eq!(rows[0].cost_usd, "150.00");
        assert_eq!(rows[0].class, "Economy Y");
        assert_eq!(rows[0].departure, "1402/07/26 07:30");
        assert_eq!(rows[0].arrival, "1402/07/26 09:00");
        assert_eq!(rows[1].cost_usd, "182.00");
    }

    #[test]
    fn test_malformed_timestamp_is_skipped() {
        let mut records = canned_response().list;
        records[0]["departureTime"] = serde_json::json!("late morning");

        let rows = build_rows(&query(), &records);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].airline, "Iran Air");
    }

    #[test]
    fn test_record_missing_price_is_skipped_not_the_batch() {
        let payload = r#"{
            "list": [
                {
                    "airlineName": "Mahan Air",
                    "cobin": "Economy",
                    "class": "Y",
                    "departureDate": "2023-10-18",
                    "departureTime": "07:30",
                    "arrivalTime": "09:00"
                },
                {
                    "adultPrice": 9100000,
                    "airlineName": "Iran Air",
                    "cobin": "Business",
                    "class": "C",
                    "departureDate": "2023-10-18",
                    "departureTime": "18:45",
                    "arrivalTime": "20:10"
                }
            ]
        }"#;
        // The response itself still deserializes with a field missing.
        let response: AvailabilityResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(response.list.len(), 2);

        // Only the record without a price is dropped.
        let rows = build_rows(&query(), &response.list);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].airline, "Iran Air");
    }

    #[test]
    fn test_row_field_order_matches_header() {
        let rows = build_rows(&query(), &canned_response().list[..1]);
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(vec![]);
        writer.serialize(&rows[0]).unwrap();
        let line = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let fields: Vec<&str> = line.trim_end().split(',').collect();
        assert_eq!(fields.len(), DOMESTIC_HEADER.len());
        assert_eq!(fields[0], "THR");
        assert_eq!(fields[3], "1500");
        assert_eq!(fields[11], "5000.0");
    }
}
