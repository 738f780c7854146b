use airgate_core::Device;
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::SensorApi;
use crate::config::ApiConfig;
use crate::error::{AuthError, FetchError};

/// `reqwest`-backed implementation of [`SensorApi`].
///
/// The login request sends credentials form-encoded; the device fetch sends
/// the bearer token in the `Authorization` header (lower-case `bearer`, as
/// the upstream expects). Both share one pooled client with the configured
/// timeout.
pub struct HttpSensorApi {
    config: ApiConfig,
    client: Client,
}

impl HttpSensorApi {
    /// Build a client with the configured timeout.
    pub fn new(config: ApiConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("failed to build HTTP client");
        Self { config, client }
    }

    /// Use a caller-supplied `reqwest::Client`, e.g. to share a pool.
    pub fn with_client(config: ApiConfig, client: Client) -> Self {
        Self { config, client }
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DeviceListResponse {
    #[serde(default)]
    data: Vec<Device>,
}

#[async_trait]
impl SensorApi for HttpSensorApi {
    async fn authenticate(&self, email: &str, password: &str) -> Result<String, AuthError> {
        debug!(url = %self.config.login_url, email = %email, "requesting new token");

        let response = self
            .client
            .post(&self.config.login_url)
            .form(&[("email", email), ("password", password)])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuthError::Timeout
                } else {
                    AuthError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "login rejected");
            return Err(AuthError::Status(status.as_u16()));
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
        match body.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(AuthError::MissingToken),
        }
    }

    async fn fetch_devices(&self, token: &str) -> Result<Vec<Device>, FetchError> {
        debug!(url = %self.config.devices_url, "fetching device list");

        let response = self
            .client
            .get(&self.config.devices_url)
            .header(AUTHORIZATION, format!("bearer {token}"))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Transient("device fetch timed out".to_owned())
                } else {
                    FetchError::Unexpected(e.to_string())
                }
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED => Err(FetchError::Unauthorized),
            StatusCode::OK => {
                // A 200 with an undecodable body is treated as transient:
                // the token is fine, the payload was not.
                let body: DeviceListResponse = response
                    .json()
                    .await
                    .map_err(|e| FetchError::Transient(format!("malformed device list: {e}")))?;
                Ok(body.data)
            }
            other => Err(FetchError::Unexpected(format!(
                "device fetch returned status {other}"
            ))),
        }
    }
}
