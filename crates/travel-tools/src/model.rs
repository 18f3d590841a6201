//! Domain Models
//!
//! Records returned by the travel tools. Catalog rows are rendered as CSV,
//! remote lookups as JSON.

use serde::{Deserialize, Serialize};

/// A bookable hotel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotel {
    pub hotel_name: String,
    pub city: String,

    /// Category, e.g. "boutique", "business", "hostel"
    #[serde(rename = "type")]
    pub kind: String,

    pub stars: u8,

    /// Nightly rate in EUR
    pub price: u32,

    pub availability: String,
}

/// A sightseeing attraction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sight {
    pub sightseeing_name: String,
    pub city: String,

    /// Category, e.g. "museum", "landmark", "park"
    #[serde(rename = "type")]
    pub kind: String,

    /// Entry fee in EUR, 0 when free
    pub price: u32,

    pub availability: String,
}

/// Hotel search filter
#[derive(Clone, Debug, Default)]
pub struct HotelQuery {
    pub city: String,
    pub kind: Option<String>,
    pub stars: Option<u8>,
}

/// Sightseeing search filter
#[derive(Clone, Debug, Default)]
pub struct SightQuery {
    pub city: String,
    pub kind: Option<String>,
}

/// Geocoding hit
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub place_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Encyclopedia lookup hit
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiEntry {
    pub label: String,
    pub wikipedia_url: String,
    pub description: String,
    pub categories: Vec<String>,
}

/// Rows that can be rendered as CSV
pub trait CsvRecord {
    const HEADER: &'static [&'static str];

    fn fields(&self) -> Vec<String>;
}

impl CsvRecord for Hotel {
    const HEADER: &'static [&'static str] =
        &["hotel_name", "city", "type", "stars", "price", "availability"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.hotel_name.clone(),
            self.city.clone(),
            self.kind.clone(),
            self.stars.to_string(),
            self.price.to_string(),
            self.availability.clone(),
        ]
    }
}

impl CsvRecord for Sight {
    const HEADER: &'static [&'static str] =
        &["sightseeing_name", "city", "type", "price", "availability"];

    fn fields(&self) -> Vec<String> {
        vec![
            self.sightseeing_name.clone(),
            self.city.clone(),
            self.kind.clone(),
            self.price.to_string(),
            self.availability.clone(),
        ]
    }
}

/// Render rows with a header line
pub fn to_csv<R: CsvRecord>(rows: &[R]) -> String {
    let mut out = R::HEADER.join(",");
    out.push('\n');
    for row in rows {
        let line: Vec<String> = row.fields().iter().map(|f| escape_csv(f)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_escaping() {
        let sight = Sight {
            sightseeing_name: "Museum \"Island\", North".into(),
            city: "Berlin".into(),
            kind: "museum".into(),
            price: 19,
            availability: "daily".into(),
        };

        let csv = to_csv(&[sight]);
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("sightseeing_name,city,type,price,availability"));
        assert_eq!(
            lines.next(),
            Some("\"Museum \"\"Island\"\", North\",Berlin,museum,19,daily")
        );
        assert_eq!(lines.next(), None);
    }
}
