//! Scripted fake of [`MeasurementApi`] for unit tests.

use anyhow::{Result, anyhow};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::services::measurement_api::{MeasurementApi, Station, StationSensor};

/// Replays queued responses in call order; once a queue is drained, further
/// calls return empty result sets.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    location_responses: Mutex<VecDeque<Result<Vec<Station>>>>,
    country_responses: Mutex<VecDeque<Result<Vec<Station>>>>,
    measurement_responses: Mutex<VecDeque<Result<Vec<Value>>>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_location(self, response: Result<Vec<Station>>) -> Self {
        self.location_responses.lock().unwrap().push_back(response);
        self
    }

    pub fn on_country(self, response: Result<Vec<Station>>) -> Self {
        self.country_responses.lock().unwrap().push_back(response);
        self
    }

    pub fn on_measurements(self, response: Result<Vec<Value>>) -> Self {
        self.measurement_responses.lock().unwrap().push_back(response);
        self
    }

    pub fn transport_error() -> anyhow::Error {
        anyhow!("connection reset by peer")
    }
}

#[async_trait::async_trait]
impl MeasurementApi for ScriptedApi {
    async fn search_stations_by_location(
        &self,
        _lat: f64,
        _lon: f64,
        _radius_m: u32,
        _limit: usize,
    ) -> Result<Vec<Station>> {
        self.location_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn search_stations_by_country(
        &self,
        _country: &str,
        _limit: usize,
    ) -> Result<Vec<Station>> {
        self.country_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn fetch_measurements(
        &self,
        _sensor_id: i64,
        _datetime_from: &str,
        _datetime_to: &str,
        _limit: usize,
    ) -> Result<Vec<Value>> {
        self.measurement_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// A station with a single pm25 sensor, enough for most pipeline tests.
pub(crate) fn station(id: i64, name: &str) -> Station {
    Station {
        id,
        name: name.to_string(),
        distance: None,
        sensors: vec![StationSensor {
            id: id * 10,
            parameter: "pm25".to_string(),
            units: "µg/m³".to_string(),
        }],
    }
}

/// A raw measurement payload in the service's nested-period shape.
pub(crate) fn raw_measurement(utc: &str, value: f64) -> Value {
    json!({
        "period": {"datetimeFrom": {"utc": utc}},
        "value": value
    })
}
