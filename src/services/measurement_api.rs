//! Trait and types for interacting with an air-quality measurement service.

use anyhow::Result;
use serde_json::Value;

/// A monitoring station returned by a station search.
///
/// Read-only once built; never persisted. Ordering within a search response
/// is the service's own (closest-first for proximity searches).
#[derive(Debug, Clone)]
pub struct Station {
    pub id: i64,
    pub name: String,
    /// Metres from the query point. Only present on proximity searches.
    pub distance: Option<f64>,
    pub sensors: Vec<StationSensor>,
}

/// A sensor as reported on a station, before pollutant selection.
#[derive(Debug, Clone)]
pub struct StationSensor {
    pub id: i64,
    /// Parameter name as reported by the service (e.g. `"pm25"`, `"o3"`).
    pub parameter: String,
    pub units: String,
}

/// Abstraction over a measurement service (e.g., OpenAQ v3).
///
/// The pipeline only ever talks to the service through this trait, so tests
/// substitute canned implementations. Raw measurements stay
/// `serde_json::Value`: the service does not guarantee field presence, and
/// extraction belongs to the normalizer, not the transport.
#[async_trait::async_trait]
pub trait MeasurementApi: Send + Sync {
    /// Stations within `radius_m` metres of a point, closest first.
    async fn search_stations_by_location(
        &self,
        lat: f64,
        lon: f64,
        radius_m: u32,
        limit: usize,
    ) -> Result<Vec<Station>>;

    /// Stations anywhere in a country, service-ordered.
    async fn search_stations_by_country(&self, country: &str, limit: usize)
    -> Result<Vec<Station>>;

    /// Measurements for one sensor within a closed UTC interval
    /// (ISO-8601 bounds), capped at `limit` results.
    async fn fetch_measurements(
        &self,
        sensor_id: i64,
        datetime_from: &str,
        datetime_to: &str,
        limit: usize,
    ) -> Result<Vec<Value>>;
}
