//! Sightseeing Tool

use std::sync::Arc;

use async_trait::async_trait;
use nano_core::{ParamSpec, Tool, ToolDescriptor, ToolError, ToolParams};
use serde_json::json;

use super::{opt_str, req_str};
use crate::catalog::TravelCatalog;
use crate::model::{SightQuery, to_csv};

/// Tool for looking up attractions
pub struct SightseeingTool {
    catalog: Arc<dyn TravelCatalog>,
}

impl SightseeingTool {
    pub fn new(catalog: Arc<dyn TravelCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for SightseeingTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new("sightseeing", "Get sightseeing information for a given city")
            .param("city", ParamSpec::required("City name to get sightseeing for", "string"))
            .param("type", ParamSpec::optional("Type of sightseeing", "string"))
            .returns(json!({
                "type": "csv",
                "columns": ["sightseeing_name", "city", "type", "price", "availability"]
            }))
    }

    async fn execute(&self, params: &ToolParams) -> Result<String, ToolError> {
        let query = SightQuery {
            city: req_str(params, "city")?.to_owned(),
            kind: opt_str(params, "type")?.map(str::to_owned),
        };

        let sights = self.catalog.sights(&query).await?;
        tracing::debug!(city = %query.city, matches = sights.len(), "Sightseeing lookup");

        if sights.is_empty() {
            return Ok("No sightseeing found for the given city".into());
        }
        Ok(to_csv(&sights))
    }
}
