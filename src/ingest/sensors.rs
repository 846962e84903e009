//! Sensor selection: filters a station's sensor collection down to the
//! target pollutant set.

use crate::record::Pollutant;
use crate::services::measurement_api::Station;

/// A sensor selected for ingestion, carrying its owning station's identity
/// so downstream records stay attributable. Exists only during a fetch.
#[derive(Debug, Clone)]
pub struct Sensor {
    pub id: i64,
    pub parameter: Pollutant,
    pub unit: String,
    pub station_id: i64,
    pub station_name: String,
}

/// Returns `station`'s sensors measuring one of `targets`, in the station's
/// native sensor order. Sensors whose parameter does not resolve are
/// skipped. No side effects; callers log the outcome.
pub fn select_sensors(station: &Station, targets: &[Pollutant]) -> Vec<Sensor> {
    station
        .sensors
        .iter()
        .filter_map(|s| {
            let parameter = Pollutant::from_name(&s.parameter)?;
            if !targets.contains(&parameter) {
                return None;
            }
            Some(Sensor {
                id: s.id,
                parameter,
                unit: s.units.clone(),
                station_id: station.id,
                station_name: station.name.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::measurement_api::StationSensor;

    fn station_with(sensors: Vec<StationSensor>) -> Station {
        Station {
            id: 77,
            name: "Paris Centre".to_string(),
            distance: Some(1200.0),
            sensors,
        }
    }

    fn raw_sensor(id: i64, parameter: &str) -> StationSensor {
        StationSensor {
            id,
            parameter: parameter.to_string(),
            units: "µg/m³".to_string(),
        }
    }

    #[test]
    fn test_select_filters_to_targets() {
        let station = station_with(vec![
            raw_sensor(1, "pm25"),
            raw_sensor(2, "so2"),
            raw_sensor(3, "o3"),
        ]);

        let selected = select_sensors(&station, Pollutant::all());
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].parameter, Pollutant::Pm25);
        assert_eq!(selected[1].parameter, Pollutant::O3);
    }

    #[test]
    fn test_select_respects_narrower_target_set() {
        let station = station_with(vec![raw_sensor(1, "pm25"), raw_sensor(2, "o3")]);

        let selected = select_sensors(&station, &[Pollutant::O3]);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, 2);
    }

    #[test]
    fn test_select_is_case_insensitive_on_parameter_names() {
        let station = station_with(vec![raw_sensor(1, "PM25"), raw_sensor(2, "No2")]);

        let selected = select_sensors(&station, Pollutant::all());
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_select_preserves_station_order() {
        let station = station_with(vec![
            raw_sensor(9, "o3"),
            raw_sensor(3, "pm10"),
            raw_sensor(5, "pm25"),
        ]);

        let ids: Vec<i64> = select_sensors(&station, Pollutant::all())
            .iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec![9, 3, 5]);
    }

    #[test]
    fn test_selected_sensor_carries_station_identity() {
        let station = station_with(vec![raw_sensor(1, "no2")]);

        let selected = select_sensors(&station, Pollutant::all());
        assert_eq!(selected[0].station_id, 77);
        assert_eq!(selected[0].station_name, "Paris Centre");
    }

    #[test]
    fn test_select_empty_station() {
        let station = station_with(vec![]);
        assert!(select_sensors(&station, Pollutant::all()).is_empty());
    }
}
