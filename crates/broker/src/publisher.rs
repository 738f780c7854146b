use airgate_core::Destination;
use async_trait::async_trait;

use crate::error::PublishError;

/// Capability boundary for delivering one payload to one destination.
///
/// Each call is independent: a failure affects neither other destinations in
/// the same cycle nor any session state.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, payload: &str, destination: &Destination) -> Result<(), PublishError>;
}
