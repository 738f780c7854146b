use airgate_core::Device;
use async_trait::async_trait;

use crate::error::{AuthError, FetchError};

/// Capability boundary to the upstream sensor-data API.
///
/// Object-safe so the job runner can hold it behind `Arc<dyn SensorApi>`
/// and tests can substitute scripted fakes.
#[async_trait]
pub trait SensorApi: Send + Sync {
    /// Exchange account credentials for a bearer token.
    async fn authenticate(&self, email: &str, password: &str) -> Result<String, AuthError>;

    /// Fetch the account's device list using the given bearer token.
    async fn fetch_devices(&self, token: &str) -> Result<Vec<Device>, FetchError>;
}
