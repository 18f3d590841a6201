//! Travel Tools
//!
//! Implementations of [`nano_core::Tool`] for the travel assistant.

mod hotel;
mod map_search;
mod sightseeing;
mod weather;
mod wiki;

pub use hotel::HotelTool;
pub use map_search::MapSearchTool;
pub use sightseeing::SightseeingTool;
pub use weather::WeatherTool;
pub use wiki::WikiTool;

use std::time::Duration;

use nano_core::{ToolError, ToolParams};
use serde_json::Value;

use crate::error::{Result, TravelError};

/// Shared HTTP client for the remote lookups
pub fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("nano-agent/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Fail on non-success status, otherwise hand back the response
pub(crate) fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        tracing::warn!(service, status = status.as_u16(), "Lookup failed");
        Err(TravelError::Status {
            service,
            status: status.as_u16(),
        })
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> ToolError {
    ToolError::InvalidParam {
        name: name.to_owned(),
        reason: reason.into(),
    }
}

/// Non-empty string parameter, `None` when absent, null or blank
pub(crate) fn opt_str<'a>(
    params: &'a ToolParams,
    name: &str,
) -> std::result::Result<Option<&'a str>, ToolError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim()).filter(|s| !s.is_empty())),
        Some(other) => Err(invalid(name, format!("expected a string, got {other}"))),
    }
}

pub(crate) fn req_str<'a>(
    params: &'a ToolParams,
    name: &str,
) -> std::result::Result<&'a str, ToolError> {
    opt_str(params, name)?.ok_or_else(|| ToolError::MissingParam(name.to_owned()))
}

/// Numeric parameter; numeric strings are accepted since models often quote numbers
pub(crate) fn opt_number(
    params: &ToolParams,
    name: &str,
) -> std::result::Result<Option<f64>, ToolError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .map(Some)
            .ok_or_else(|| invalid(name, "not a finite number")),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(name, format!("expected a number, got {s:?}"))),
        Some(other) => Err(invalid(name, format!("expected a number, got {other}"))),
    }
}

pub(crate) fn req_number(params: &ToolParams, name: &str) -> std::result::Result<f64, ToolError> {
    opt_number(params, name)?.ok_or_else(|| ToolError::MissingParam(name.to_owned()))
}

/// Small non-negative integer parameter
pub(crate) fn opt_u8(params: &ToolParams, name: &str) -> std::result::Result<Option<u8>, ToolError> {
    let Some(value) = opt_number(params, name)? else {
        return Ok(None);
    };
    if value.fract() != 0.0 || !(0.0..=f64::from(u8::MAX)).contains(&value) {
        return Err(invalid(name, format!("expected a small whole number, got {value}")));
    }
    // Range checked above
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(Some(value as u8))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> ToolParams {
        match value {
            Value::Object(map) => map,
            _ => panic!("params must be an object"),
        }
    }

    #[test]
    fn test_string_params() {
        let p = params(json!({"city": " Berlin ", "type": "", "stars": 4}));
        assert_eq!(req_str(&p, "city").unwrap(), "Berlin");
        assert_eq!(opt_str(&p, "type").unwrap(), None);
        assert!(matches!(req_str(&p, "missing"), Err(ToolError::MissingParam(_))));
        assert!(matches!(opt_str(&p, "stars"), Err(ToolError::InvalidParam { .. })));
    }

    #[test]
    fn test_number_params() {
        let p = params(json!({"lat": 52.52, "lon": "13.40", "bad": "north", "none": null}));
        assert!((req_number(&p, "lat").unwrap() - 52.52).abs() < f64::EPSILON);
        assert!((req_number(&p, "lon").unwrap() - 13.40).abs() < f64::EPSILON);
        assert!(matches!(req_number(&p, "bad"), Err(ToolError::InvalidParam { .. })));
        assert!(matches!(req_number(&p, "none"), Err(ToolError::MissingParam(_))));
    }

    #[test]
    fn test_u8_params() {
        let p = params(json!({"stars": 4, "quoted": "3", "half": 3.5, "huge": 1000}));
        assert_eq!(opt_u8(&p, "stars").unwrap(), Some(4));
        assert_eq!(opt_u8(&p, "quoted").unwrap(), Some(3));
        assert_eq!(opt_u8(&p, "absent").unwrap(), None);
        assert!(opt_u8(&p, "half").is_err());
        assert!(opt_u8(&p, "huge").is_err());
    }
}
