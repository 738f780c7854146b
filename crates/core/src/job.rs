use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::rule::MatchRule;

/// Poll interval applied when a job does not configure one.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// API account credentials for one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Everything a job runner needs to poll one account. Produced by
/// configuration validation at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct JobDescriptor {
    /// Unique job name; doubles as the audit log partition key.
    pub name: String,

    /// Disabled jobs are configured but never started.
    pub enabled: bool,

    /// Target wall-clock cadence of the polling loop.
    pub poll_interval: Duration,

    /// Upstream account this job authenticates as.
    pub credentials: Credentials,

    /// Ordered routing rules. Every matching rule fires.
    pub rules: Vec<MatchRule>,
}

impl JobDescriptor {
    pub fn new(name: impl Into<String>, credentials: Credentials, rules: Vec<MatchRule>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            poll_interval: DEFAULT_POLL_INTERVAL,
            credentials,
            rules,
        }
    }
}
