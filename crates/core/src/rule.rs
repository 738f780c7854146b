use serde::{Deserialize, Serialize};

use crate::destination::Destination;

/// One routing rule: a device keyword and the broker destination payloads
/// are delivered to when it fires.
///
/// Rules are ordered within a job and evaluated independently; a device may
/// satisfy several rules and every match publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRule {
    /// `"*"` matches every device; anything else is a case-sensitive
    /// substring match against the device name or serial.
    pub keyword: String,

    /// Where a matched device's payload goes.
    pub destination: Destination,
}

impl MatchRule {
    pub fn new(keyword: impl Into<String>, destination: Destination) -> Self {
        Self {
            keyword: keyword.into(),
            destination,
        }
    }
}
