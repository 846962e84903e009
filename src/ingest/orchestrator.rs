//! Ingestion orchestration: drives resolution, selection, and windowed
//! fetching across the configured cities and years, accumulating every
//! normalized record.

use tracing::{info, warn};

use crate::config::{City, IngestLimits, Pacing};
use crate::ingest::resolver::resolve_stations;
use crate::ingest::sensors::select_sensors;
use crate::ingest::windows::fetch_sensor_year;
use crate::record::{NormalizedRecord, Pollutant};
use crate::services::measurement_api::MeasurementApi;

/// Runs the full city × year × station × sensor loop.
///
/// Stations are resolved once per city; a city with no stations is skipped
/// with a warning. Only the first `limits.stations_per_city` stations and
/// `limits.sensors_per_station` sensors are drained, with pacing pauses
/// between every external step. An empty return value means the run
/// obtained no data at all.
pub async fn collect_all<A: MeasurementApi>(
    api: &A,
    cities: &[&City],
    years: &[i32],
    limits: IngestLimits,
    pacing: &Pacing,
) -> Vec<NormalizedRecord> {
    let mut all = Vec::new();

    for city in cities {
        info!(city = city.name, "processing city");

        let stations = resolve_stations(api, city).await;
        if stations.is_empty() {
            warn!(city = city.name, "no stations found, skipping city");
            continue;
        }

        for &year in years {
            info!(city = city.name, year, "downloading year");
            let year_start = all.len();

            for station in stations.iter().take(limits.stations_per_city) {
                let sensors = select_sensors(station, Pollutant::all());
                if sensors.is_empty() {
                    warn!(
                        station = %station.name,
                        "no sensors matching target parameters, skipping station"
                    );
                    continue;
                }
                info!(
                    station = %station.name,
                    sensors = sensors.len(),
                    "sensors matching target parameters"
                );

                for sensor in sensors.iter().take(limits.sensors_per_station) {
                    let records = fetch_sensor_year(api, sensor, city.name, year, pacing).await;
                    info!(
                        city = city.name,
                        year,
                        parameter = %sensor.parameter,
                        records = records.len(),
                        "sensor year complete"
                    );
                    all.extend(records);

                    pacing.between_sensors().await;
                }

                pacing.between_stations().await;
            }

            info!(
                city = city.name,
                year,
                records = all.len() - year_start,
                "year complete"
            );
            pacing.between_years().await;
        }

        pacing.between_cities().await;
    }

    all
}
