//! Canonical record shapes: the normalized measurement row, the daily
//! aggregate row, and the pollutant parameter set.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::ingest::sensors::Sensor;

/// Provenance tag stamped on every normalized record.
pub const SOURCE_TAG: &str = "openaq_v3";

/// The fixed pollutant parameter set this pipeline ingests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    Pm25,
    Pm10,
    No2,
    O3,
}

impl Pollutant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "pm25",
            Pollutant::Pm10 => "pm10",
            Pollutant::No2 => "no2",
            Pollutant::O3 => "o3",
        }
    }

    pub const fn all() -> &'static [Pollutant] {
        &[Pollutant::Pm25, Pollutant::Pm10, Pollutant::No2, Pollutant::O3]
    }

    /// Resolves a service-reported parameter name, case-insensitively.
    /// Returns `None` for parameters outside the target set.
    pub fn from_name(name: &str) -> Option<Pollutant> {
        match name.to_lowercase().as_str() {
            "pm25" => Some(Pollutant::Pm25),
            "pm10" => Some(Pollutant::Pm10),
            "no2" => Some(Pollutant::No2),
            "o3" => Some(Pollutant::O3),
            _ => None,
        }
    }
}

impl std::fmt::Display for Pollutant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized measurement. The canonical unit of the pipeline.
///
/// Invariants: `value` is finite, `date` is the calendar-day prefix of
/// `datetime`, and the (city, parameter, sensor, datetime) combination
/// uniquely attributes the record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub date: String,
    pub datetime: String,
    pub city: String,
    pub parameter: Pollutant,
    pub value: f64,
    pub unit: String,
    pub station_name: String,
    pub station_id: i64,
    pub sensor_id: i64,
    pub source: String,
}

impl NormalizedRecord {
    /// Normalizes one raw measurement payload, or returns `None` when the
    /// payload has no usable timestamp or value.
    ///
    /// Field presence is not guaranteed by the service, so every extraction
    /// is optional; a malformed element never aborts a batch.
    pub fn from_raw(raw: &Value, sensor: &Sensor, city: &str) -> Option<NormalizedRecord> {
        let datetime = match extract_timestamp(raw) {
            Some(ts) => ts,
            None => {
                debug!(sensor_id = sensor.id, "measurement has no timestamp, dropping");
                return None;
            }
        };

        let value = match coerce_value(raw) {
            Some(v) => v,
            None => {
                debug!(sensor_id = sensor.id, "measurement has no numeric value, dropping");
                return None;
            }
        };

        // Day-granularity date: the part of the timestamp before the
        // date/time separator.
        let date = datetime.split('T').next().unwrap_or(&datetime).to_string();

        Some(NormalizedRecord {
            date,
            datetime,
            city: city.to_string(),
            parameter: sensor.parameter,
            value,
            unit: sensor.unit.clone(),
            station_name: sensor.station_name.clone(),
            station_id: sensor.station_id,
            sensor_id: sensor.id,
            source: SOURCE_TAG.to_string(),
        })
    }
}

/// Pulls the measurement timestamp out of a raw payload.
///
/// Preference order: the nested period start (`period.datetimeFrom.utc`,
/// tolerating the snake_case spelling), then the flat `datetime`, `date`,
/// and `timestamp` fields. Non-string representations are rendered to text
/// rather than rejected.
fn extract_timestamp(raw: &Value) -> Option<String> {
    for key in ["datetimeFrom", "datetime_from"] {
        let ts = &raw["period"][key]["utc"];
        if !ts.is_null() {
            return Some(render_timestamp(ts));
        }
    }

    for field in ["datetime", "date", "timestamp"] {
        let ts = &raw[field];
        if !ts.is_null() {
            return Some(render_timestamp(ts));
        }
    }

    None
}

fn render_timestamp(ts: &Value) -> String {
    match ts {
        Value::String(s) => s.clone(),
        // Some response shapes nest the instant one level deeper.
        Value::Object(_) if ts["utc"].is_string() => ts["utc"].as_str().unwrap_or("").to_string(),
        other => other.to_string(),
    }
}

/// Coerces the raw `value` field to a finite float. Numeric strings are
/// accepted; anything else is rejected.
fn coerce_value(raw: &Value) -> Option<f64> {
    let value = match &raw["value"] {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

/// One output row: the mean of all same-day, same-city, same-parameter
/// measurements. Exactly one row exists per key triple.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub city: String,
    pub parameter: Pollutant,
    pub value: f64,
    pub unit: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_sensor() -> Sensor {
        Sensor {
            id: 4242,
            parameter: Pollutant::Pm25,
            unit: "µg/m³".to_string(),
            station_id: 2178,
            station_name: "Madrid - Plaza del Carmen".to_string(),
        }
    }

    #[test]
    fn test_from_raw_nested_period_timestamp() {
        let raw = json!({
            "period": {"datetimeFrom": {"utc": "2022-03-05T14:00:00Z", "local": "2022-03-05T15:00:00+01:00"}},
            "value": 17.5
        });

        let record = NormalizedRecord::from_raw(&raw, &test_sensor(), "Madrid").unwrap();
        assert_eq!(record.date, "2022-03-05");
        assert_eq!(record.datetime, "2022-03-05T14:00:00Z");
        assert_eq!(record.value, 17.5);
        assert_eq!(record.city, "Madrid");
        assert_eq!(record.parameter, Pollutant::Pm25);
        assert_eq!(record.unit, "µg/m³");
        assert_eq!(record.station_id, 2178);
        assert_eq!(record.sensor_id, 4242);
        assert_eq!(record.source, SOURCE_TAG);
    }

    #[test]
    fn test_from_raw_snake_case_period_timestamp() {
        let raw = json!({
            "period": {"datetime_from": {"utc": "2021-11-30T23:00:00Z"}},
            "value": 3
        });

        let record = NormalizedRecord::from_raw(&raw, &test_sensor(), "Madrid").unwrap();
        assert_eq!(record.date, "2021-11-30");
        assert_eq!(record.value, 3.0);
    }

    #[test]
    fn test_from_raw_flat_fallback_fields() {
        for field in ["datetime", "date", "timestamp"] {
            let raw = json!({field: "2020-07-01T06:30:00Z", "value": 1.25});
            let record = NormalizedRecord::from_raw(&raw, &test_sensor(), "Paris").unwrap();
            assert_eq!(record.date, "2020-07-01", "field {field}");
        }
    }

    #[test]
    fn test_from_raw_prefers_nested_over_flat() {
        let raw = json!({
            "period": {"datetimeFrom": {"utc": "2022-01-01T00:00:00Z"}},
            "datetime": "2099-12-31T00:00:00Z",
            "value": 5.0
        });

        let record = NormalizedRecord::from_raw(&raw, &test_sensor(), "Madrid").unwrap();
        assert_eq!(record.date, "2022-01-01");
    }

    #[test]
    fn test_from_raw_missing_every_timestamp_field() {
        let raw = json!({"value": 10.0, "flags": ["valid"]});
        assert!(NormalizedRecord::from_raw(&raw, &test_sensor(), "Madrid").is_none());
    }

    #[test]
    fn test_from_raw_non_numeric_value() {
        let raw = json!({
            "period": {"datetimeFrom": {"utc": "2022-01-01T00:00:00Z"}},
            "value": "not-a-number"
        });
        assert!(NormalizedRecord::from_raw(&raw, &test_sensor(), "Madrid").is_none());
    }

    #[test]
    fn test_from_raw_missing_value() {
        let raw = json!({"period": {"datetimeFrom": {"utc": "2022-01-01T00:00:00Z"}}});
        assert!(NormalizedRecord::from_raw(&raw, &test_sensor(), "Madrid").is_none());
    }

    #[test]
    fn test_from_raw_numeric_string_value() {
        let raw = json!({
            "period": {"datetimeFrom": {"utc": "2022-01-01T00:00:00Z"}},
            "value": " 42.5 "
        });
        let record = NormalizedRecord::from_raw(&raw, &test_sensor(), "Madrid").unwrap();
        assert_eq!(record.value, 42.5);
    }

    #[test]
    fn test_from_raw_rejects_non_finite_value() {
        let raw = json!({
            "period": {"datetimeFrom": {"utc": "2022-01-01T00:00:00Z"}},
            "value": "NaN"
        });
        assert!(NormalizedRecord::from_raw(&raw, &test_sensor(), "Madrid").is_none());
    }

    #[test]
    fn test_from_raw_non_string_timestamp() {
        // A bare epoch number has no 'T' separator; the whole rendering
        // becomes the date rather than producing a panic.
        let raw = json!({"timestamp": 1640995200, "value": 8.0});
        let record = NormalizedRecord::from_raw(&raw, &test_sensor(), "Madrid").unwrap();
        assert_eq!(record.datetime, "1640995200");
        assert_eq!(record.date, "1640995200");
    }

    #[test]
    fn test_from_raw_object_flat_datetime() {
        let raw = json!({
            "datetime": {"utc": "2023-05-05T10:00:00Z", "local": "2023-05-05T12:00:00+02:00"},
            "value": 12.0
        });
        let record = NormalizedRecord::from_raw(&raw, &test_sensor(), "Madrid").unwrap();
        assert_eq!(record.date, "2023-05-05");
    }

    #[test]
    fn test_pollutant_from_name() {
        assert_eq!(Pollutant::from_name("pm25"), Some(Pollutant::Pm25));
        assert_eq!(Pollutant::from_name("PM10"), Some(Pollutant::Pm10));
        assert_eq!(Pollutant::from_name("No2"), Some(Pollutant::No2));
        assert_eq!(Pollutant::from_name("o3"), Some(Pollutant::O3));
        assert_eq!(Pollutant::from_name("so2"), None);
        assert_eq!(Pollutant::from_name(""), None);
    }

    #[test]
    fn test_pollutant_name_roundtrip() {
        for p in Pollutant::all() {
            assert_eq!(Pollutant::from_name(p.as_str()), Some(*p));
        }
    }
}
