use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;

use crate::fetch::{BasicClient, HttpClient, auth::ApiKey};
use crate::services::measurement_api::{MeasurementApi, Station, StationSensor};

const OPENAQ_BASE_URL: &str = "https://api.openaq.org/v3";

/// OpenAQ v3 implementation of [`MeasurementApi`].
///
/// Responses are parsed as generic JSON and only the fields the pipeline
/// needs are extracted; entries missing a usable id are dropped rather than
/// failing the whole response.
pub struct OpenAqClient<C = BasicClient> {
    base_url: String,
    http: ApiKey<C>,
}

impl OpenAqClient<BasicClient> {
    /// Creates a client authenticating with the given API key.
    pub fn new(api_key: String) -> Self {
        Self::with_http(BasicClient::new(), api_key)
    }
}

impl<C: HttpClient> OpenAqClient<C> {
    /// Creates a client over an arbitrary transport. Used by tests.
    pub fn with_http(http: C, api_key: String) -> Self {
        Self {
            base_url: OPENAQ_BASE_URL.to_string(),
            http: ApiKey::openaq(http, api_key.trim().to_string()),
        }
    }

    /// GETs `url` and returns the `results` array of the response body.
    async fn get_results(&self, url: Url) -> Result<Vec<Value>> {
        let req = reqwest::Request::new(reqwest::Method::GET, url.clone());

        let response = self
            .http
            .execute(req)
            .await
            .with_context(|| format!("request to {} failed", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("API returned status {}: {}", status, body));
        }

        let json: Value = response
            .json()
            .await
            .context("failed to parse API response body")?;

        match json.get("results") {
            Some(Value::Array(results)) => Ok(results.clone()),
            _ => Ok(Vec::new()),
        }
    }

    fn locations_url(&self, params: &[(&str, String)]) -> Result<Url> {
        Url::parse_with_params(&format!("{}/locations", self.base_url), params)
            .context("invalid locations URL")
    }
}

/// Builds a [`Station`] from one entry of a `/locations` response.
/// Returns `None` when the entry has no usable id.
fn station_from_json(item: &Value) -> Option<Station> {
    let id = item["id"].as_i64()?;
    let name = item["name"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("Station {id}"));
    let distance = item["distance"].as_f64();

    let sensors = item["sensors"]
        .as_array()
        .map(|sensors| {
            sensors
                .iter()
                .filter_map(|s| {
                    Some(StationSensor {
                        id: s["id"].as_i64()?,
                        parameter: s["parameter"]["name"].as_str()?.to_string(),
                        units: s["parameter"]["units"].as_str().unwrap_or("").to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    Some(Station {
        id,
        name,
        distance,
        sensors,
    })
}

#[async_trait]
impl<C: HttpClient> MeasurementApi for OpenAqClient<C> {
    async fn search_stations_by_location(
        &self,
        lat: f64,
        lon: f64,
        radius_m: u32,
        limit: usize,
    ) -> Result<Vec<Station>> {
        let url = self.locations_url(&[
            ("coordinates", format!("{lat},{lon}")),
            ("radius", radius_m.to_string()),
            ("limit", limit.to_string()),
        ])?;

        let results = self.get_results(url).await?;
        Ok(results.iter().filter_map(station_from_json).collect())
    }

    async fn search_stations_by_country(
        &self,
        country: &str,
        limit: usize,
    ) -> Result<Vec<Station>> {
        let url = self.locations_url(&[
            ("iso", country.to_string()),
            ("limit", limit.to_string()),
        ])?;

        let results = self.get_results(url).await?;
        Ok(results.iter().filter_map(station_from_json).collect())
    }

    async fn fetch_measurements(
        &self,
        sensor_id: i64,
        datetime_from: &str,
        datetime_to: &str,
        limit: usize,
    ) -> Result<Vec<Value>> {
        let url = Url::parse_with_params(
            &format!("{}/sensors/{}/measurements", self.base_url, sensor_id),
            &[
                ("datetime_from", datetime_from.to_string()),
                ("datetime_to", datetime_to.to_string()),
                ("limit", limit.to_string()),
            ],
        )
        .context("invalid measurements URL")?;

        self.get_results(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_station_from_json_full_entry() {
        let item = json!({
            "id": 2178,
            "name": "Madrid - Plaza del Carmen",
            "distance": 812.4,
            "sensors": [
                {"id": 1, "parameter": {"name": "pm25", "units": "µg/m³"}},
                {"id": 2, "parameter": {"name": "o3", "units": "µg/m³"}}
            ]
        });

        let station = station_from_json(&item).unwrap();
        assert_eq!(station.id, 2178);
        assert_eq!(station.name, "Madrid - Plaza del Carmen");
        assert_eq!(station.distance, Some(812.4));
        assert_eq!(station.sensors.len(), 2);
        assert_eq!(station.sensors[0].parameter, "pm25");
    }

    #[test]
    fn test_station_from_json_missing_id_is_dropped() {
        let item = json!({"name": "anonymous"});
        assert!(station_from_json(&item).is_none());
    }

    #[test]
    fn test_station_from_json_tolerates_missing_name_and_sensors() {
        let item = json!({"id": 9});
        let station = station_from_json(&item).unwrap();
        assert_eq!(station.name, "Station 9");
        assert!(station.distance.is_none());
        assert!(station.sensors.is_empty());
    }

    #[test]
    fn test_station_from_json_skips_malformed_sensors() {
        let item = json!({
            "id": 9,
            "sensors": [
                {"id": 1, "parameter": {"name": "no2", "units": "µg/m³"}},
                {"parameter": {"name": "pm10"}},
                {"id": 3}
            ]
        });
        let station = station_from_json(&item).unwrap();
        assert_eq!(station.sensors.len(), 1);
        assert_eq!(station.sensors[0].parameter, "no2");
    }
}
