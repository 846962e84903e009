//! Fixed run configuration: the city registry, target years, ingestion
//! caps, and the pacing policy applied between external calls.

use chrono::NaiveDate;
use std::time::Duration;

/// A monitored city. Static configuration; immutable for a run.
#[derive(Debug, Clone, Copy)]
pub struct City {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
    /// ISO 3166-1 alpha-2 country code, used for the country-wide
    /// station fallback search.
    pub country: &'static str,
}

/// All cities covered by the climate download.
pub static CITIES: &[City] = &[
    City { name: "Madrid", lat: 40.4168, lon: -3.7038, country: "ES" },
    City { name: "Barcelona", lat: 41.3851, lon: 2.1734, country: "ES" },
    City { name: "Paris", lat: 48.8566, lon: 2.3522, country: "FR" },
    City { name: "London", lat: 51.5074, lon: -0.1278, country: "GB" },
    City { name: "Berlin", lat: 52.5200, lon: 13.4050, country: "DE" },
    City { name: "Rome", lat: 41.9028, lon: 12.4964, country: "IT" },
    City { name: "Amsterdam", lat: 52.3676, lon: 4.9041, country: "NL" },
    City { name: "Warsaw", lat: 52.2297, lon: 21.0122, country: "PL" },
];

/// Subset of [`CITIES`] covered by the air-quality download.
pub static AIR_QUALITY_CITY_NAMES: &[&str] = &["Madrid", "Barcelona", "Paris", "London"];

/// Years of historical air-quality data to ingest.
pub static TARGET_YEARS: &[i32] = &[2020, 2021, 2022, 2023, 2024];

/// Looks up a city by name (case-insensitive). Returns `None` if not configured.
pub fn find_city(name: &str) -> Option<&'static City> {
    CITIES.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// The cities the air-quality path ingests, in registry order.
pub fn air_quality_cities() -> Vec<&'static City> {
    CITIES
        .iter()
        .filter(|c| AIR_QUALITY_CITY_NAMES.contains(&c.name))
        .collect()
}

/// Inclusive date range accepted by the aggregation stage, derived from
/// [`TARGET_YEARS`] so the two cannot drift apart.
pub fn valid_date_range() -> (NaiveDate, NaiveDate) {
    let first = *TARGET_YEARS.first().expect("TARGET_YEARS must not be empty");
    let last = *TARGET_YEARS.last().expect("TARGET_YEARS must not be empty");
    (
        NaiveDate::from_ymd_opt(first, 1, 1).expect("valid start date"),
        NaiveDate::from_ymd_opt(last, 12, 31).expect("valid end date"),
    )
}

/// How many stations and sensors a run actually drains per city.
///
/// The resolver may return more candidates than `stations_per_city`; the
/// orchestrator only fetches from the first N to keep request volume down.
#[derive(Debug, Clone, Copy)]
pub struct IngestLimits {
    pub stations_per_city: usize,
    pub sensors_per_station: usize,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            stations_per_city: 1,
            sensors_per_station: 2,
        }
    }
}

/// Fixed-duration pauses inserted between external calls, per call class.
///
/// The measurement API enforces per-request caps and throughput limits, so
/// the pipeline paces itself instead of retrying. `Pacing::none()` turns
/// every pause off for tests.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub quarter: Duration,
    pub sensor: Duration,
    pub station: Duration,
    pub year: Duration,
    pub city: Duration,
}

impl Pacing {
    /// Production delays.
    pub fn standard() -> Self {
        Self {
            quarter: Duration::from_secs(1),
            sensor: Duration::from_millis(1500),
            station: Duration::from_secs(3),
            year: Duration::from_secs(2),
            city: Duration::from_secs(5),
        }
    }

    /// No pauses at all.
    pub fn none() -> Self {
        Self {
            quarter: Duration::ZERO,
            sensor: Duration::ZERO,
            station: Duration::ZERO,
            year: Duration::ZERO,
            city: Duration::ZERO,
        }
    }

    pub async fn after_quarter(&self) {
        pause(self.quarter).await;
    }

    pub async fn between_sensors(&self) {
        pause(self.sensor).await;
    }

    pub async fn between_stations(&self) {
        pause(self.station).await;
    }

    pub async fn between_years(&self) {
        pause(self.year).await;
    }

    pub async fn between_cities(&self) {
        pause(self.city).await;
    }
}

async fn pause(d: Duration) {
    if !d.is_zero() {
        tokio::time::sleep(d).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_duplicate_city_names() {
        let mut seen = std::collections::HashSet::new();
        for city in CITIES {
            assert!(seen.insert(city.name), "duplicate city '{}'", city.name);
        }
    }

    #[test]
    fn test_city_coordinates_in_range() {
        for city in CITIES {
            assert!(
                (-90.0..=90.0).contains(&city.lat),
                "latitude out of range for '{}'",
                city.name
            );
            assert!(
                (-180.0..=180.0).contains(&city.lon),
                "longitude out of range for '{}'",
                city.name
            );
            assert_eq!(
                city.country.len(),
                2,
                "country code for '{}' should be alpha-2",
                city.name
            );
        }
    }

    #[test]
    fn test_air_quality_subset_is_in_registry() {
        for name in AIR_QUALITY_CITY_NAMES {
            assert!(
                find_city(name).is_some(),
                "air-quality city '{}' missing from registry",
                name
            );
        }
        assert_eq!(air_quality_cities().len(), AIR_QUALITY_CITY_NAMES.len());
    }

    #[test]
    fn test_find_city_is_case_insensitive() {
        assert!(find_city("madrid").is_some());
        assert!(find_city("MADRID").is_some());
        assert!(find_city("Atlantis").is_none());
    }

    #[test]
    fn test_valid_date_range_spans_target_years() {
        let (start, end) = valid_date_range();
        assert_eq!(start, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());
        assert!(start < end);
    }

    #[test]
    fn test_target_years_are_sorted_and_contiguous() {
        for pair in TARGET_YEARS.windows(2) {
            assert_eq!(pair[1], pair[0] + 1);
        }
    }

    #[test]
    fn test_pacing_none_is_all_zero() {
        let p = Pacing::none();
        assert!(p.quarter.is_zero());
        assert!(p.sensor.is_zero());
        assert!(p.station.is_zero());
        assert!(p.year.is_zero());
        assert!(p.city.is_zero());
    }
}
