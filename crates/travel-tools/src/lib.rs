//! # travel-tools
//!
//! Tools and widgets for a travel assistant built on nano-core.
//!
//! | tool | source | output |
//! |---|---|---|
//! | `weather` | Bright Sky API | JSON, record closest to now |
//! | `map_search` | Photon geocoder | JSON, up to three places |
//! | `wiki` | DBpedia lookup | JSON, up to three articles |
//! | `hotel` | [`catalog::TravelCatalog`] | CSV |
//! | `sightseeing` | [`catalog::TravelCatalog`] | CSV |
//!
//! Widgets: `map` (latitude/longitude lists) and `metric` (name/value lists).

pub mod catalog;
pub mod error;
pub mod model;
pub mod tools;
pub mod widgets;

use std::sync::Arc;

use nano_core::Tool;

pub use catalog::{InMemoryCatalog, TravelCatalog};
pub use error::{Result, TravelError};
pub use tools::{HotelTool, MapSearchTool, SightseeingTool, WeatherTool, WikiTool};
pub use widgets::default_widgets;

/// All travel tools, sharing one HTTP client and the given catalog
pub fn default_tools(catalog: Arc<dyn TravelCatalog>) -> Result<Vec<Arc<dyn Tool>>> {
    let client = tools::http_client()?;

    let tools: Vec<Arc<dyn Tool>> = vec![
        Arc::new(WeatherTool::new(client.clone())),
        Arc::new(HotelTool::new(Arc::clone(&catalog))),
        Arc::new(SightseeingTool::new(catalog)),
        Arc::new(MapSearchTool::new(client.clone())),
        Arc::new(WikiTool::new(client)),
    ];
    Ok(tools)
}

/// Extra instructions appended to the protocol prompt
pub const TRAVEL_INSTRUCTIONS: &str = "You are a travel assistant. \
Use map_search to find coordinates before asking for the weather of a place. \
When an answer involves locations, add a map widget with their coordinates. \
When it involves measurements such as temperature, add a metric widget.";
