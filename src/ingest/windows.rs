//! Windowed measurement fetching.
//!
//! The measurement API caps results per request and throttles aggressively,
//! so a full year is extracted as four fixed calendar quarters with a pacing
//! pause after each request. A failed quarter contributes zero records and
//! is never retried.

use tracing::{debug, error};

use crate::config::Pacing;
use crate::ingest::sensors::Sensor;
use crate::record::NormalizedRecord;
use crate::services::measurement_api::MeasurementApi;

/// Result cap for one quarterly request.
const QUARTER_RESULT_LIMIT: usize = 1000;

/// A closed UTC timestamp interval covering one calendar quarter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuarterWindow {
    pub datetime_from: String,
    pub datetime_to: String,
}

/// Partitions `year` into its four fixed calendar quarters.
pub fn quarter_windows(year: i32) -> [QuarterWindow; 4] {
    [
        ("01-01", "03-31"),
        ("04-01", "06-30"),
        ("07-01", "09-30"),
        ("10-01", "12-31"),
    ]
    .map(|(from, to)| QuarterWindow {
        datetime_from: format!("{year}-{from}T00:00:00Z"),
        datetime_to: format!("{year}-{to}T23:59:59Z"),
    })
}

/// Fetches and normalizes a full year of measurements for one sensor.
///
/// Each quarter issues one bounded request; every raw result goes through
/// the normalizer and malformed elements are dropped individually. A
/// quarter-level failure is logged and skipped, so records only ever
/// accumulate from attempted windows.
pub async fn fetch_sensor_year<A: MeasurementApi>(
    api: &A,
    sensor: &Sensor,
    city: &str,
    year: i32,
    pacing: &Pacing,
) -> Vec<NormalizedRecord> {
    let mut records = Vec::new();

    for (idx, window) in quarter_windows(year).iter().enumerate() {
        let quarter = idx + 1;

        match api
            .fetch_measurements(
                sensor.id,
                &window.datetime_from,
                &window.datetime_to,
                QUARTER_RESULT_LIMIT,
            )
            .await
        {
            Ok(results) => {
                let before = records.len();
                records.extend(
                    results
                        .iter()
                        .filter_map(|raw| NormalizedRecord::from_raw(raw, sensor, city)),
                );
                debug!(
                    year,
                    quarter,
                    sensor_id = sensor.id,
                    raw = results.len(),
                    normalized = records.len() - before,
                    "quarter fetched"
                );
            }
            Err(e) => {
                error!(
                    year,
                    quarter,
                    sensor_id = sensor.id,
                    error = %e,
                    "quarter fetch failed, skipping"
                );
            }
        }

        pacing.after_quarter().await;
    }

    records
}
