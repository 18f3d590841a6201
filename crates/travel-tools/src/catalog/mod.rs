//! Travel Catalog
//!
//! Source of hotel and sightseeing listings behind the `hotel` and
//! `sightseeing` tools.

mod memory;

pub use memory::InMemoryCatalog;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Hotel, HotelQuery, Sight, SightQuery};

/// Catalog backend (Strategy pattern)
///
/// Implement this for a booking API or database.
#[async_trait]
pub trait TravelCatalog: Send + Sync {
    /// Hotels matching every set filter
    async fn hotels(&self, query: &HotelQuery) -> Result<Vec<Hotel>>;

    /// Attractions matching every set filter
    async fn sights(&self, query: &SightQuery) -> Result<Vec<Sight>>;

    /// Catalog name
    fn name(&self) -> &str;
}
