//! Station resolution: proximity search with a country-wide fallback.

use tracing::{error, info, warn};

use crate::config::City;
use crate::services::measurement_api::{MeasurementApi, Station};

/// Proximity search radius around a city's coordinates, in metres.
const PROXIMITY_RADIUS_M: u32 = 25_000;
/// Result cap for the proximity search.
const PROXIMITY_LIMIT: usize = 50;
/// How many nearby candidates a resolution keeps (closest first).
const PROXIMITY_TAKE: usize = 2;
/// Result cap for the country-wide fallback search.
const COUNTRY_LIMIT: usize = 10;
/// How many fallback candidates a resolution keeps.
const COUNTRY_TAKE: usize = 1;
/// City-name prefix length used by the fallback name filter. A known
/// heuristic: short city names can match unrelated stations.
const NAME_PREFIX_LEN: usize = 4;

/// Finds candidate monitoring stations for `city`, returning at most two.
///
/// Any transport error is logged and treated as zero results for that
/// attempt: resolution degrades to an empty list instead of propagating,
/// and the orchestrator treats that as "no data available for this city".
pub async fn resolve_stations<A: MeasurementApi>(api: &A, city: &City) -> Vec<Station> {
    info!(city = city.name, "searching stations near city");

    match api
        .search_stations_by_location(city.lat, city.lon, PROXIMITY_RADIUS_M, PROXIMITY_LIMIT)
        .await
    {
        Ok(stations) if !stations.is_empty() => {
            info!(city = city.name, found = stations.len(), "stations found near city");
            for (rank, station) in stations.iter().take(3).enumerate() {
                info!(
                    rank = rank + 1,
                    station = %station.name,
                    distance_m = station.distance,
                    "candidate station"
                );
            }
            let mut stations = stations;
            stations.truncate(PROXIMITY_TAKE);
            stations
        }
        Ok(_) => {
            warn!(city = city.name, "no stations near city, falling back to country search");
            resolve_by_country(api, city).await
        }
        Err(e) => {
            error!(city = city.name, error = %e, "station search failed");
            Vec::new()
        }
    }
}

/// Country-wide fallback: filter by city-name substring (full name or its
/// first [`NAME_PREFIX_LEN`] characters, case-insensitive); if nothing
/// matches, keep one unfiltered station as a last resort.
async fn resolve_by_country<A: MeasurementApi>(api: &A, city: &City) -> Vec<Station> {
    match api.search_stations_by_country(city.country, COUNTRY_LIMIT).await {
        Ok(stations) => {
            if stations.is_empty() {
                return Vec::new();
            }
            info!(
                country = city.country,
                found = stations.len(),
                "stations found in country"
            );

            let needle = city.name.to_lowercase();
            let prefix: String = needle.chars().take(NAME_PREFIX_LEN).collect();

            let matches: Vec<Station> = stations
                .iter()
                .filter(|s| {
                    let name = s.name.to_lowercase();
                    name.contains(&needle) || name.contains(&prefix)
                })
                .cloned()
                .collect();

            if matches.is_empty() {
                info!(city = city.name, "no name matches, using generic country station");
                stations.into_iter().take(COUNTRY_TAKE).collect()
            } else {
                info!(
                    city = city.name,
                    matched = matches.len(),
                    "stations filtered by city name"
                );
                matches.into_iter().take(COUNTRY_TAKE).collect()
            }
        }
        Err(e) => {
            error!(country = city.country, error = %e, "country station search failed");
            Vec::new()
        }
    }
}
