//! Hotel Tool
//!
//! Lists hotels in a city as CSV, optionally narrowed by type and stars.

use std::sync::Arc;

use async_trait::async_trait;
use nano_core::{ParamSpec, Tool, ToolDescriptor, ToolError, ToolParams};
use serde_json::json;

use super::{opt_str, opt_u8, req_str};
use crate::catalog::TravelCatalog;
use crate::model::{HotelQuery, to_csv};

/// Tool for looking up hotels
pub struct HotelTool {
    catalog: Arc<dyn TravelCatalog>,
}

impl HotelTool {
    pub fn new(catalog: Arc<dyn TravelCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for HotelTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("hotel", "Get hotel information for a given city")
            .param("city", ParamSpec::required("City name to get hotel for", "string"))
            .param("type", ParamSpec::optional("Type of hotel", "string"))
            .param("stars", ParamSpec::optional("Number of stars of the hotel", "integer"))
            .returns(json!({
                "type": "csv",
                "columns": ["hotel_name", "city", "type", "stars", "price", "availability"]
            }))
    }

    async fn execute(&self, params: &ToolParams) -> Result<String, ToolError> {
        let query = HotelQuery {
            city: req_str(params, "city")?.to_owned(),
            kind: opt_str(params, "type")?.map(str::to_owned),
            stars: opt_u8(params, "stars")?,
        };

        let hotels = self.catalog.hotels(&query).await?;
        tracing::debug!(city = %query.city, matches = hotels.len(), catalog = self.catalog.name(), "Hotel lookup");

        if hotels.is_empty() {
            return Ok("No hotel found for the given city".into());
        }
        Ok(to_csv(&hotels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;

    fn tool() -> HotelTool {
        HotelTool::new(Arc::new(InMemoryCatalog::default()))
    }

    fn params(value: serde_json::Value) -> ToolParams {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_csv_for_city() {
        let out = tool()
            .execute(&params(json!({"city": "Hamburg", "type": "boutique"})))
            .await
            .unwrap();
        assert_eq!(
            out,
            "hotel_name,city,type,stars,price,availability\n\
             25hours Hotel HafenCity,Hamburg,boutique,4,150,fully booked\n"
        );
    }

    #[tokio::test]
    async fn test_no_match_message() {
        let out = tool()
            .execute(&params(json!({"city": "Hamburg", "stars": 1})))
            .await
            .unwrap();
        assert_eq!(out, "No hotel found for the given city");
    }

    #[tokio::test]
    async fn test_invalid_stars() {
        let err = tool()
            .execute(&params(json!({"city": "Berlin", "stars": "five"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParam { ref name, .. } if name == "stars"));
    }

    #[test]
    fn test_descriptor() {
        let descriptor = tool().descriptor();
        assert_eq!(descriptor.name, "hotel");
        assert!(!descriptor.params["city"].optional);
        assert!(descriptor.params["stars"].optional);
    }
}
