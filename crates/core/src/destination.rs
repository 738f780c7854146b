use std::fmt;

use serde::{Deserialize, Serialize};

/// Broker endpoint a formatted payload is delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// Broker hostname or address.
    pub host: String,

    /// Broker port. Defaults to the plain MQTT port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional broker username; credentials are only applied when both the
    /// username and password are present.
    #[serde(default)]
    pub username: Option<String>,

    /// Optional broker password.
    #[serde(default)]
    pub password: Option<String>,

    /// Topic the payload is published to.
    pub topic: String,
}

fn default_port() -> u16 {
    1883
}

impl Destination {
    pub fn new(host: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: default_port(),
            username: None,
            password: None,
            topic: topic.into(),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port, self.topic)
    }
}
