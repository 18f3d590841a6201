//! Map Search Tool
//!
//! Geocodes a place name with the Photon API (OpenStreetMap data).

use async_trait::async_trait;
use nano_core::{ParamSpec, Tool, ToolDescriptor, ToolError, ToolParams};
use serde::Deserialize;
use serde_json::json;

use super::{check_status, req_str};
use crate::error::TravelError;
use crate::model::Place;

const DEFAULT_BASE_URL: &str = "https://photon.komoot.io";
const RESULT_LIMIT: &str = "3";

/// Tool for locating places
pub struct MapSearchTool {
    client: reqwest::Client,
    base_url: String,
}

impl MapSearchTool {
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
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    geometry: Geometry,
    #[serde(default)]
    properties: Properties,
}

#[derive(Deserialize)]
struct Geometry {
    /// GeoJSON order: longitude, latitude
    coordinates: Vec<f64>,
}

#[derive(Default, Deserialize)]
struct Properties {
    name: Option<String>,
    city: Option<String>,
    country: Option<String>,
}

impl Feature {
    fn into_place(self) -> Option<Place> {
        let &[longitude, latitude, ..] = self.geometry.coordinates.as_slice() else {
            return None;
        };

        let Properties { name, city, country } = self.properties;
        let mut parts: Vec<String> = Vec::with_capacity(3);
        for part in [name, city, country].into_iter().flatten() {
            if !parts.contains(&part) {
                parts.push(part);
            }
        }

        Some(Place {
            place_name: parts.join(", "),
            latitude,
            longitude,
        })
    }
}

fn to_places(collection: FeatureCollection) -> Vec<Place> {
    collection
        .features
        .into_iter()
        .filter_map(Feature::into_place)
        .collect()
}

#[async_trait]
impl Tool for MapSearchTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("map_search", "Search for a place on a map")
            .param("place", ParamSpec::required("Place name to search for", "string"))
            .returns(json!({
                "type": "json",
                "columns": ["place_name", "latitude", "longitude"]
            }))
    }

    async fn execute(&self, params: &ToolParams) -> Result<String, ToolError> {
        let place = req_str(params, "place")?.to_lowercase();
        tracing::debug!(place = %place, "Searching map");

        let response = self
            .client
            .get(format!("{}/api/", self.base_url))
            .query(&[("q", place.as_str()), ("limit", RESULT_LIMIT)])
            .send()
            .await
            .map_err(TravelError::from)?;

        let collection: FeatureCollection = check_status("Photon", response)?
            .json()
            .await
            .map_err(TravelError::from)?;

        Ok(json!({ "places": to_places(collection) }).to_string())
    }
}
