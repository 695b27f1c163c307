//! Signed HTTP client for the provider cloud API

use std::time::Duration;

use reqwest::{Method, StatusCode};

use super::auth::Credentials;
use super::types::{CommandRequest, DeviceListBody, Envelope, STATUS_SUCCESS};
use crate::{Error, Result};

/// Client for the provider's REST API
///
/// Stateless beyond configuration: every call signs itself with a fresh
/// timestamp and nonce, and failures map into the engine's closed error
/// taxonomy so the retry controller can classify them.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl ApiClient {
    /// Create a client with the given base URL, credentials, and per-call
    /// timeout
    ///
    /// # Errors
    ///
    /// Returns error if the underlying HTTP client cannot be constructed
    pub fn new(base_url: &str, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Perform a signed request and return the envelope body
    ///
    /// Success requires both layers to agree: a 2xx transport status and a
    /// logical `statusCode` of 100 inside the envelope.
    ///
    /// # Errors
    ///
    /// Returns the taxonomy error for the failing layer; see [`Error`]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let url = format!("{}{path}", self.base_url);
        let auth = self.credentials.sign_request();

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .header("Authorization", &auth.authorization)
            .header("sign", &auth.sign)
            .header("t", &auth.timestamp)
            .header("nonce", &auth.nonce)
            .header("Content-Type", "application/json");

        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout
            } else {
                Error::Network(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout
            } else {
                Error::Network(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        let envelope: Envelope = serde_json::from_str(&text)
            .map_err(|e| Error::MalformedResponse(format!("{method} {path}: {e}")))?;

        if envelope.status_code != STATUS_SUCCESS {
            return Err(Error::Api(format!(
                "provider status {}: {}",
                envelope.status_code, envelope.message
            )));
        }

        tracing::trace!(%method, path, "provider call succeeded");
        Ok(envelope.body)
    }

    /// Fetch the full device list (physical and infrared)
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a device list
    pub async fn list_devices(&self) -> Result<DeviceListBody> {
        let body = self.request(Method::GET, "/devices", None).await?;
        serde_json::from_value(body)
            .map_err(|e| Error::MalformedResponse(format!("device list: {e}")))
    }

    /// Fetch the current status fields of one physical device
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the body is not a JSON object
    pub async fn device_status(
        &self,
        device_id: &str,
    ) -> Result<serde_json::Map<String, serde_json::Value>> {
        let path = format!("/devices/{device_id}/status");
        let body = self.request(Method::GET, &path, None).await?;

        match body {
            serde_json::Value::Object(map) => Ok(map),
            other => Err(Error::MalformedResponse(format!(
                "status for {device_id}: expected object, got {other}"
            ))),
        }
    }

    /// Send a command to a device
    ///
    /// # Errors
    ///
    /// Returns error if the request fails on either status layer
    pub async fn send_command(&self, device_id: &str, command: &CommandRequest) -> Result<()> {
        let path = format!("/devices/{device_id}/commands");
        let body = serde_json::to_value(command)
            .map_err(|e| Error::InvalidRequest(format!("command encode: {e}")))?;

        self.request(Method::POST, &path, Some(&body)).await?;
        Ok(())
    }
}

/// Map a non-2xx transport status into the error taxonomy
fn classify_status(status: StatusCode, body: &str) -> Error {
    match status {
        StatusCode::UNAUTHORIZED => Error::AuthFailed(provider_message(body)),
        StatusCode::FORBIDDEN => Error::Forbidden(provider_message(body)),
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited,
        StatusCode::UNPROCESSABLE_ENTITY => Error::InvalidRequest(provider_message(body)),
        _ => Error::Api(format!("HTTP {}: {}", status.as_u16(), provider_message(body))),
    }
}

/// Pull the provider's message out of an error body, falling back to the
/// raw text
fn provider_message(body: &str) -> String {
    serde_json::from_str::<Envelope>(body)
        .ok()
        .filter(|e| !e.message.is_empty())
        .map_or_else(|| body.trim().to_string(), |e| e.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- classify_status ------------------------------------------------------

    #[test]
    fn unauthorized_maps_to_auth_failed() {
        let err = classify_status(StatusCode::UNAUTHORIZED, "");
        assert!(matches!(err, Error::AuthFailed(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn forbidden_maps_to_forbidden() {
        let err = classify_status(StatusCode::FORBIDDEN, "");
        assert!(matches!(err, Error::Forbidden(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn too_many_requests_maps_to_rate_limited() {
        let err = classify_status(StatusCode::TOO_MANY_REQUESTS, "");
        assert!(matches!(err, Error::RateLimited));
        assert!(err.is_retryable());
    }

    #[test]
    fn unprocessable_maps_to_invalid_request() {
        let err = classify_status(StatusCode::UNPROCESSABLE_ENTITY, "");
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn server_error_maps_to_retryable_api_error() {
        let err = classify_status(StatusCode::INTERNAL_SERVER_ERROR, "boom");
        assert!(matches!(err, Error::Api(_)));
        assert!(err.is_retryable());
    }

    // -- provider_message -----------------------------------------------------

    #[test]
    fn extracts_envelope_message() {
        let body = r#"{"statusCode": 190, "message": "device offline"}"#;
        assert_eq!(provider_message(body), "device offline");
    }

    #[test]
    fn falls_back_to_raw_text() {
        assert_eq!(provider_message("  gateway timeout "), "gateway timeout");
    }
}
