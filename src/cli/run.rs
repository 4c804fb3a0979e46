//! Fare mining run loop
//!
//! Parses arguments, checks the run preconditions (exchange rate and flight
//! distance must both resolve before any fare row can be computed), expands
//! the date range and invokes the selected fetcher once per date. A failed
//! date is logged and the loop continues with the next one.

use chrono::Local;
use clap::Parser;
use reqwest::Client;
use tracing::{error, info};

use super::CliError;
use crate::enrich::{distance, rates, TimeZoneResolver};
use crate::fetcher::http::JsonClient;
use crate::fetcher::{DomesticFareFetcher, InternationalFareFetcher};
use crate::{dates, output, FareQuery};

const USER_AGENT: &str = concat!("fareminer/", env!("CARGO_PKG_VERSION"));

/// Fare Miner CLI
#[derive(Parser, Debug)]
#[command(name = "fareminer")]
#[command(about = "Mine airline fare listings into per-route CSV files", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Departure location IATA code (e.g. THR, TBZ)
    pub origin: String,

    /// Arrival location IATA code (e.g. THR, TBZ)
    pub destination: String,

    /// Get fares for domestic flights
    #[arg(short, long, group = "mode")]
    pub domestic: bool,

    /// Get fares for international flights
    #[arg(short, long, group = "mode")]
    pub international: bool,

    /// Date range start, YYYY-MM-DD (default: today)
    #[arg(short, long)]
    pub start: Option<String>,

    /// Date range end, YYYY-MM-DD inclusive (omit to query only the start date)
    #[arg(short, long)]
    pub end: Option<String>,

    /// Output base name; ".csv" is appended (default: ORIGIN_DESTINATION_TODAY.csv)
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Execute a fare mining run.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    if !cli.domestic && !cli.international {
        println!("Determine your flight type (--domestic or --international)");
        return Ok(());
    }

    let today = Local::now().date_naive();
    let start = match &cli.start {
        Some(start) => dates::parse_date(start)?,
        None => today,
    };
    let end = cli.end.as_deref().map(dates::parse_date).transpose()?;
    let query_dates = dates::expand(start, end)?;

    let client = Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| CliError::Configuration(format!("failed to build HTTP client: {e}")))?;

    // Both enrichment values are run preconditions: without a usable rate no
    // USD cost can be computed, and every row carries the route distance.
    let rate_irr = rates::usd_rate_irr(&client).await?;
    info!("USD exchange rate: {rate_irr} IRR");

    let distance_km = distance::flight_distance_km(&client, &cli.origin, &cli.destination).await?;
    info!("flight distance {} => {}: {distance_km} km", cli.origin, cli.destination);

    let output_path =
        output::derive_output_path(cli.output.as_deref(), &cli.origin, &cli.destination, today);
    let http = JsonClient::new(client.clone());

    if cli.domestic {
        let fetcher = DomesticFareFetcher::new(&http);
        for date in query_dates {
            let query = fare_query(&cli, date, rate_irr, distance_km);
            if let Err(e) = fetcher.fetch(&query, &output_path).await {
                error!("domestic fetch failed for {date}: {e}");
            }
        }
    } else {
        let timezones = TimeZoneResolver::new(client);
        let fetcher = InternationalFareFetcher::new(&http, &timezones);
        for date in query_dates {
            let query = fare_query(&cli, date, rate_irr, distance_km);
            if let Err(e) = fetcher.fetch(&query, &output_path).await {
                error!("international fetch failed for {date}: {e}");
            }
        }
    }

    Ok(())
}

fn fare_query(cli: &Cli, date: chrono::NaiveDate, rate_irr: f64, distance_km: u32) -> FareQuery {
    FareQuery {
        origin: cli.origin.clone(),
        destination: cli.destination.clone(),
        date,
        rate_irr,
        distance_km,
    }
}
