use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use airgate_core::Destination;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Outgoing, QoS};
use tracing::debug;

use crate::error::PublishError;
use crate::publisher::Publisher;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const KEEP_ALIVE: Duration = Duration::from_secs(30);

/// MQTT publisher that opens a fresh session per delivery.
///
/// Each publish connects to the destination broker, applies credentials when
/// both username and password are configured, sends one QoS 0 message, and
/// disconnects. No connection outlives a single delivery: isolation over
/// throughput, which bounds resource usage across many jobs and
/// destinations.
pub struct MqttPublisher {
    timeout: Duration,
    session_seq: AtomicU64,
}

impl MqttPublisher {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Bound the whole connect-publish-disconnect exchange by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            session_seq: AtomicU64::new(0),
        }
    }

    async fn publish_once(
        &self,
        payload: &str,
        destination: &Destination,
    ) -> Result<(), PublishError> {
        // Client ids must not collide across concurrent sessions.
        let client_id = format!(
            "airgate-{}",
            self.session_seq.fetch_add(1, Ordering::Relaxed)
        );
        let mut options = MqttOptions::new(client_id, &destination.host, destination.port);
        options.set_keep_alive(KEEP_ALIVE);
        if let (Some(username), Some(password)) = (&destination.username, &destination.password) {
            options.set_credentials(username, password);
        }

        let (client, mut event_loop) = AsyncClient::new(options, 8);
        client
            .publish(
                destination.topic.as_str(),
                QoS::AtMostOnce,
                false,
                payload.as_bytes().to_vec(),
            )
            .await
            .map_err(|e| PublishError::Rejected(e.to_string()))?;
        client
            .disconnect()
            .await
            .map_err(|e| PublishError::Rejected(e.to_string()))?;

        // The requests above only queue; polling the event loop performs the
        // connect, flushes the publish, and completes the disconnect.
        loop {
            match event_loop.poll().await {
                Ok(Event::Outgoing(Outgoing::Disconnect)) => {
                    debug!(destination = %destination, "payload delivered");
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => return Err(PublishError::Connection(e.to_string())),
            }
        }
    }
}

impl Default for MqttPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, payload: &str, destination: &Destination) -> Result<(), PublishError> {
        match tokio::time::timeout(self.timeout, self.publish_once(payload, destination)).await {
            Ok(result) => result,
            Err(_) => Err(PublishError::Timeout(self.timeout)),
        }
    }
}
