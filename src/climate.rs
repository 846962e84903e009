//! Daily climate observations from the Open-Meteo archive API.
//!
//! Unlike the air-quality path this is a single unpartitioned GET per city:
//! the archive endpoint returns the full date range in one response, needs
//! no credential, and gets no retry. A failed city is logged and skipped.

use anyhow::{Context, Result, bail};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info};

use crate::config::City;
use crate::fetch::{HttpClient, fetch_bytes};

const ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// Historical period covered by the climate download, inclusive.
pub const CLIMATE_START_DATE: &str = "2015-01-01";
pub const CLIMATE_END_DATE: &str = "2024-12-31";

/// Daily metrics requested from the archive, in output column order.
const DAILY_METRICS: &[&str] = &[
    "temperature_2m_max",
    "temperature_2m_min",
    "temperature_2m_mean",
    "precipitation_sum",
    "rain_sum",
    "windspeed_10m_max",
    "relative_humidity_2m_mean",
];

const TIMEZONE: &str = "Europe/Berlin";

/// The `daily` object of an archive response: parallel arrays keyed by
/// metric, all the same length as `time`.
#[derive(Debug, Deserialize)]
struct DailySeries {
    time: Vec<String>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    temperature_2m_mean: Vec<Option<f64>>,
    precipitation_sum: Vec<Option<f64>>,
    rain_sum: Vec<Option<f64>>,
    windspeed_10m_max: Vec<Option<f64>>,
    relative_humidity_2m_mean: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: DailySeries,
}

/// One day of climate observations for one city. Metrics the archive has
/// no value for stay empty in the output table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClimateDay {
    pub date: String,
    pub city: String,
    pub temp_max: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_mean: Option<f64>,
    pub precipitation: Option<f64>,
    pub rain: Option<f64>,
    pub wind_speed_max: Option<f64>,
    pub humidity_mean: Option<f64>,
}

/// Fetches the full historical daily series for one city.
pub async fn fetch_city_daily<C: HttpClient>(client: &C, city: &City) -> Result<Vec<ClimateDay>> {
    let url = Url::parse_with_params(
        ARCHIVE_URL,
        &[
            ("latitude", city.lat.to_string()),
            ("longitude", city.lon.to_string()),
            ("start_date", CLIMATE_START_DATE.to_string()),
            ("end_date", CLIMATE_END_DATE.to_string()),
            ("daily", DAILY_METRICS.join(",")),
            ("timezone", TIMEZONE.to_string()),
        ],
    )
    .context("invalid archive URL")?;

    let bytes = fetch_bytes(client, url.as_str())
        .await
        .with_context(|| format!("climate fetch failed for {}", city.name))?;

    let response: serde_json::Result<ArchiveResponse> = serde_json::from_slice(&bytes);
    let response = response.with_context(|| format!("malformed archive body for {}", city.name))?;

    rows_from_response(city.name, response)
}

/// Converts the parallel-array response into per-day rows, refusing
/// responses whose series lengths disagree.
fn rows_from_response(city: &str, response: ArchiveResponse) -> Result<Vec<ClimateDay>> {
    let d = response.daily;
    let days = d.time.len();

    check_len("temperature_2m_max", d.temperature_2m_max.len(), days)?;
    check_len("temperature_2m_min", d.temperature_2m_min.len(), days)?;
    check_len("temperature_2m_mean", d.temperature_2m_mean.len(), days)?;
    check_len("precipitation_sum", d.precipitation_sum.len(), days)?;
    check_len("rain_sum", d.rain_sum.len(), days)?;
    check_len("windspeed_10m_max", d.windspeed_10m_max.len(), days)?;
    check_len(
        "relative_humidity_2m_mean",
        d.relative_humidity_2m_mean.len(),
        days,
    )?;

    let rows = (0..days)
        .map(|i| ClimateDay {
            date: d.time[i].clone(),
            city: city.to_string(),
            temp_max: d.temperature_2m_max[i],
            temp_min: d.temperature_2m_min[i],
            temp_mean: d.temperature_2m_mean[i],
            precipitation: d.precipitation_sum[i],
            rain: d.rain_sum[i],
            wind_speed_max: d.windspeed_10m_max[i],
            humidity_mean: d.relative_humidity_2m_mean[i],
        })
        .collect();

    Ok(rows)
}

fn check_len(name: &str, len: usize, expected: usize) -> Result<()> {
    if len != expected {
        bail!("daily series '{name}' has {len} entries, expected {expected}");
    }
    Ok(())
}

/// Downloads climate data for every city, skipping cities whose fetch or
/// parse fails.
pub async fn download_all<C: HttpClient>(client: &C, cities: &[City]) -> Vec<ClimateDay> {
    let mut all = Vec::new();

    for city in cities {
        info!(city = city.name, "downloading climate data");
        match fetch_city_daily(client, city).await {
            Ok(rows) => {
                info!(city = city.name, records = rows.len(), "climate data downloaded");
                all.extend(rows);
            }
            Err(e) => {
                error!(city = city.name, error = %e, "climate download failed, skipping city");
            }
        }
    }

    all
}

/// Prints the end-of-run summary to stdout: totals, date range, and
/// per-city record counts.
pub fn print_report(rows: &[ClimateDay], output_path: &str) {
    if rows.is_empty() {
        println!("\nNo climate data could be downloaded.");
        return;
    }

    let mut per_city: BTreeMap<&str, usize> = BTreeMap::new();
    for row in rows {
        *per_city.entry(row.city.as_str()).or_default() += 1;
    }

    // ISO dates sort lexicographically.
    let first = rows.iter().map(|r| r.date.as_str()).min().unwrap_or("-");
    let last = rows.iter().map(|r| r.date.as_str()).max().unwrap_or("-");

    println!("\nClimate data saved to: {output_path}");
    println!("Total records: {}", rows.len());
    println!("Date range: {first} to {last}");
    println!("Cities included ({}):", per_city.len());
    for (city, count) in &per_city {
        println!("  - {city}: {count} records");
    }
}
