//! Error Types for Travel Tools

use nano_core::ToolError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TravelError>;

#[derive(Error, Debug)]
pub enum TravelError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{service} responded with status {status}")]
    Status { service: &'static str, status: u16 },

    #[error("Unexpected {service} response: {reason}")]
    Parse { service: &'static str, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl From<TravelError> for ToolError {
    fn from(err: TravelError) -> Self {
        match err {
            TravelError::Serialization(e) => Self::Json(e),
            other => Self::Upstream(other.to_string()),
        }
    }
}
