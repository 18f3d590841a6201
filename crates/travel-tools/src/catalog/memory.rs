//! In-Memory Catalog
//!
//! Static listings for demos and tests. City and type filters ignore case.

use async_trait::async_trait;

use super::TravelCatalog;
use crate::error::Result;
use crate::model::{Hotel, HotelQuery, Sight, SightQuery};

/// Catalog backed by fixed listings
pub struct InMemoryCatalog {
    hotels: Vec<Hotel>,
    sights: Vec<Sight>,
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new(default_hotels(), default_sights())
    }
}

impl InMemoryCatalog {
    pub const fn new(hotels: Vec<Hotel>, sights: Vec<Sight>) -> Self {
        Self { hotels, sights }
    }
}

fn same(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[async_trait]
impl TravelCatalog for InMemoryCatalog {
    async fn hotels(&self, query: &HotelQuery) -> Result<Vec<Hotel>> {
        Ok(self
            .hotels
            .iter()
            .filter(|h| same(&h.city, &query.city))
            .filter(|h| query.kind.as_deref().is_none_or(|k| same(&h.kind, k)))
            .filter(|h| query.stars.is_none_or(|s| h.stars == s))
            .cloned()
            .collect())
    }

    async fn sights(&self, query: &SightQuery) -> Result<Vec<Sight>> {
        Ok(self
            .sights
            .iter()
            .filter(|s| same(&s.city, &query.city))
            .filter(|s| query.kind.as_deref().is_none_or(|k| same(&s.kind, k)))
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "InMemoryCatalog"
    }
}

fn hotel(name: &str, city: &str, kind: &str, stars: u8, price: u32, availability: &str) -> Hotel {
    Hotel {
        hotel_name: name.into(),
        city: city.into(),
        kind: kind.into(),
        stars,
        price,
        availability: availability.into(),
    }
}

fn sight(name: &str, city: &str, kind: &str, price: u32, availability: &str) -> Sight {
    Sight {
        sightseeing_name: name.into(),
        city: city.into(),
        kind: kind.into(),
        price,
        availability: availability.into(),
    }
}

fn default_hotels() -> Vec<Hotel> {
    vec![
        hotel("Hotel Adlon Kempinski", "Berlin", "luxury", 5, 420, "available"),
        hotel("Michelberger Hotel", "Berlin", "boutique", 3, 120, "available"),
        hotel("Generator Berlin Mitte", "Berlin", "hostel", 2, 45, "limited"),
        hotel("Bayerischer Hof", "Munich", "luxury", 5, 390, "limited"),
        hotel("Hotel Torbräu", "Munich", "business", 4, 180, "available"),
        hotel("Wombat's City Hostel", "Munich", "hostel", 2, 40, "available"),
        hotel("Fontenay", "Hamburg", "luxury", 5, 350, "available"),
        hotel("25hours Hotel HafenCity", "Hamburg", "boutique", 4, 150, "fully booked"),
        hotel("Hotel Sacher", "Vienna", "luxury", 5, 450, "limited"),
        hotel("Hotel Daniel", "Vienna", "boutique", 4, 130, "available"),
    ]
}

fn default_sights() -> Vec<Sight> {
    vec![
        sight("Brandenburg Gate", "Berlin", "landmark", 0, "daily"),
        sight("Pergamon Museum", "Berlin", "museum", 14, "closed for renovation"),
        sight("Tiergarten", "Berlin", "park", 0, "daily"),
        sight("Deutsches Museum", "Munich", "museum", 15, "daily"),
        sight("English Garden", "Munich", "park", 0, "daily"),
        sight("Nymphenburg Palace", "Munich", "landmark", 10, "daily"),
        sight("Elbphilharmonie Plaza", "Hamburg", "landmark", 0, "daily"),
        sight("Miniatur Wunderland", "Hamburg", "museum", 20, "booking required"),
        sight("Schönbrunn Palace", "Vienna", "landmark", 24, "daily"),
        sight("Kunsthistorisches Museum", "Vienna", "museum", 21, "closed mondays"),
    ]
}
