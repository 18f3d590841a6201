//! Weather Tool
//!
//! Queries the Bright Sky API (DWD data) and returns the hourly record
//! closest to the current time.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use nano_core::{ParamSpec, Tool, ToolDescriptor, ToolError, ToolParams};
use serde::Deserialize;
use serde_json::{Value, json};

use super::{check_status, opt_str, req_number};
use crate::error::TravelError;

const DEFAULT_BASE_URL: &str = "https://api.brightsky.dev";

/// Tool for current weather conditions
pub struct WeatherTool {
    client: reqwest::Client,
    base_url: String,
}

impl WeatherTool {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.into(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    weather: Vec<Value>,
}

/// Entry whose `timestamp` is nearest to `now`
fn closest_entry(entries: Vec<Value>, now: DateTime<Utc>) -> Option<Value> {
    entries
        .into_iter()
        .filter_map(|entry| {
            let stamp = entry.get("timestamp")?.as_str()?;
            let at = DateTime::parse_from_rfc3339(stamp).ok()?;
            let distance = (at.with_timezone(&Utc) - now).num_seconds().abs();
            Some((distance, entry))
        })
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, entry)| entry)
}

#[async_trait]
impl Tool for WeatherTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("weather", "Get the weather for a given location")
            .param("lat", ParamSpec::required("Latitude", "number"))
            .param("lon", ParamSpec::required("Longitude", "number"))
            .param(
                "date",
                ParamSpec::optional(
                    "Date in YYYY-MM-DD format. If not provided, the current date is used.",
                    "string",
                ),
            )
            .returns(json!({
                "type": "json",
                "columns": ["timestamp", "temperature", "precipitation", "condition"]
            }))
    }

    async fn execute(&self, params: &ToolParams) -> Result<String, ToolError> {
        let lat = req_number(params, "lat")?;
        let lon = req_number(params, "lon")?;

        let now = Utc::now();
        let date = match opt_str(params, "date")? {
            Some(d) => NaiveDate::parse_from_str(d, "%Y-%m-%d").map_err(|e| {
                ToolError::InvalidParam {
                    name: "date".into(),
                    reason: e.to_string(),
                }
            })?,
            None => now.date_naive(),
        };

        tracing::debug!(lat, lon, %date, "Fetching weather");

        let response = self
            .client
            .get(format!("{}/weather", self.base_url))
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("date", date.format("%Y-%m-%d").to_string()),
            ])
            .send()
            .await
            .map_err(TravelError::from)?;

        let data: WeatherResponse = check_status("Bright Sky", response)?
            .json()
            .await
            .map_err(TravelError::from)?;

        match closest_entry(data.weather, now) {
            Some(entry) => Ok(json!({ "weather": [entry] }).to_string()),
            None => Ok("No weather data available".into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closest_entry() {
        let now = DateTime::parse_from_rfc3339("2024-05-01T12:20:00+00:00")
            .unwrap()
            .with_timezone(&Utc);
        let entries = vec![
            json!({"timestamp": "2024-05-01T11:00:00+00:00", "temperature": 14.0}),
            json!({"timestamp": "2024-05-01T14:00:00+02:00", "temperature": 16.5}),
            json!({"timestamp": "garbage", "temperature": 99.0}),
            json!({"temperature": 0.0}),
        ];

        let entry = closest_entry(entries, now).unwrap();
        assert_eq!(entry["temperature"], 16.5);
    }

    #[test]
    fn test_no_entries() {
        assert!(closest_entry(Vec::new(), Utc::now()).is_none());
    }

    #[tokio::test]
    async fn test_rejects_bad_date_before_request() {
        let tool = WeatherTool::new(reqwest::Client::new()).with_base_url("http://127.0.0.1:9");
        let params: ToolParams =
            serde_json::from_value(json!({"lat": 52.5, "lon": 13.4, "date": "tomorrow"})).unwrap();

        let err = tool.execute(&params).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidParam { ref name, .. } if name == "date"));
    }

    #[tokio::test]
    async fn test_missing_coordinates() {
        let tool = WeatherTool::new(reqwest::Client::new());
        let params: ToolParams = serde_json::from_value(json!({"lat": 52.5})).unwrap();

        let err = tool.execute(&params).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingParam(ref name) if name == "lon"));
    }
}
