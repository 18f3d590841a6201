//! Shared plumbing for the HTTP-based providers

use std::time::Duration;

use nano_core::error::{AgentError, Result};
use reqwest::StatusCode;

/// Default request timeout for hosted APIs
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub fn client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| AgentError::Config(format!("Failed to create HTTP client: {e}")))
}

/// Classify a transport-level failure
pub fn transport_error(provider: &str, err: &reqwest::Error) -> AgentError {
    if err.is_connect() || err.is_timeout() {
        AgentError::ProviderUnavailable(format!("{provider}: {err}"))
    } else {
        AgentError::Provider(format!("{provider}: {err}"))
    }
}

/// Map a non-success status to the error taxonomy
pub fn status_error(provider: &str, status: StatusCode, body: &str) -> AgentError {
    match status.as_u16() {
        401 | 403 => AgentError::Auth(format!("Invalid {provider} API key")),
        429 => AgentError::RateLimited(format!("{provider} rate limit exceeded")),
        code => AgentError::Provider(format!("{provider} returned {code}: {body}")),
    }
}

/// Send a prepared request and decode a successful JSON body
pub async fn send_json<T>(provider: &str, request: reqwest::RequestBuilder) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let response = request
        .send()
        .await
        .map_err(|e| transport_error(provider, &e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(provider, status = status.as_u16(), body = %body, "Provider API error");
        return Err(status_error(provider, status, &body));
    }

    response
        .json()
        .await
        .map_err(|e| AgentError::Provider(format!("Failed to parse {provider} response: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error("openai", StatusCode::UNAUTHORIZED, ""),
            AgentError::Auth(_)
        ));
        assert!(matches!(
            status_error("openai", StatusCode::FORBIDDEN, ""),
            AgentError::Auth(_)
        ));
        assert!(matches!(
            status_error("anthropic", StatusCode::TOO_MANY_REQUESTS, ""),
            AgentError::RateLimited(_)
        ));

        let err = status_error("anthropic", StatusCode::INTERNAL_SERVER_ERROR, "overloaded");
        match err {
            AgentError::Provider(msg) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("overloaded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_client_builds() {
        assert!(client(DEFAULT_TIMEOUT_SECS).is_ok());
    }
}
