//! TOML configuration loading and per-job validation.
//!
//! Job tables are deserialized leniently (every field optional) and
//! validated one at a time, so a single malformed job is skipped with a
//! diagnostic instead of taking the whole gateway down.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use airgate_audit::DEFAULT_MAX_LINES;
use airgate_client::{ApiConfig, DEFAULT_DEVICES_URL, DEFAULT_LOGIN_URL};
use airgate_core::{Credentials, Destination, JobDescriptor, MatchRule};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Configuration loading or validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    /// A job table did not deserialize at all.
    #[error("malformed job table: {0}")]
    Malformed(#[from] toml::de::Error),

    #[error("missing required field `{0}`")]
    Missing(String),

    #[error("invalid `{field}`: {reason}")]
    Invalid { field: String, reason: String },

    #[error("duplicate job name `{0}`")]
    DuplicateName(String),
}

/// Top-level gateway configuration, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct GatewayConfig {
    /// Audit log artifact configuration.
    #[serde(default)]
    pub audit: AuditSection,

    /// Upstream API endpoints.
    #[serde(default)]
    pub api: ApiSection,

    /// Raw job tables; each is validated individually via
    /// [`validated_jobs`](Self::validated_jobs).
    #[serde(default)]
    pub jobs: Vec<toml::Value>,
}

impl GatewayConfig {
    /// Load and parse the file, then check the non-job sections. A missing
    /// file is an error; missing sections fall back to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        if config.audit.max_lines == 0 {
            return Err(ConfigError::Invalid {
                field: "audit.max_lines".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(config)
    }

    /// Validate every job table. Invalid jobs are skipped with a warning;
    /// duplicate names lose to the earlier job.
    pub fn validated_jobs(&self) -> Vec<JobDescriptor> {
        let mut names: HashSet<String> = HashSet::new();
        let mut jobs = Vec::with_capacity(self.jobs.len());

        for (index, raw) in self.jobs.iter().enumerate() {
            match validate_job(raw).and_then(|job| {
                if names.insert(job.name.clone()) {
                    Ok(job)
                } else {
                    Err(ConfigError::DuplicateName(job.name))
                }
            }) {
                Ok(job) => jobs.push(job),
                Err(e) => warn!(job_index = index, error = %e, "skipping invalid job"),
            }
        }
        jobs
    }
}

/// Audit artifact settings.
#[derive(Debug, Deserialize)]
pub struct AuditSection {
    /// Directory the per-job `.log` files live in.
    #[serde(default = "default_audit_dir")]
    pub dir: PathBuf,

    /// Maximum retained physical lines per job file.
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
}

impl Default for AuditSection {
    fn default() -> Self {
        Self {
            dir: default_audit_dir(),
            max_lines: default_max_lines(),
        }
    }
}

fn default_audit_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_max_lines() -> usize {
    DEFAULT_MAX_LINES
}

/// Upstream API endpoints and timeout.
#[derive(Debug, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_login_url")]
    pub login_url: String,

    #[serde(default = "default_devices_url")]
    pub devices_url: String,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            devices_url: default_devices_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl ApiSection {
    pub fn to_api_config(&self) -> ApiConfig {
        ApiConfig {
            login_url: self.login_url.clone(),
            devices_url: self.devices_url.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

fn default_login_url() -> String {
    DEFAULT_LOGIN_URL.to_owned()
}

fn default_devices_url() -> String {
    DEFAULT_DEVICES_URL.to_owned()
}

fn default_timeout_seconds() -> u64 {
    15
}

/// One job table, parsed leniently before validation.
#[derive(Debug, Deserialize)]
struct JobSection {
    name: Option<String>,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_poll_seconds")]
    poll_interval_seconds: u64,
    api: Option<CredentialsSection>,
    #[serde(default)]
    rules: Vec<RuleSection>,
}

#[derive(Debug, Deserialize)]
struct CredentialsSection {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RuleSection {
    keyword: Option<String>,
    destination: Option<DestinationSection>,
}

#[derive(Debug, Deserialize)]
struct DestinationSection {
    host: Option<String>,
    #[serde(default = "default_port")]
    port: u16,
    username: Option<String>,
    password: Option<String>,
    topic: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_poll_seconds() -> u64 {
    10
}

fn default_port() -> u16 {
    1883
}

fn require(value: Option<String>, field: &str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(field.to_owned())),
    }
}

/// Check one raw job table and produce an immutable descriptor.
fn validate_job(raw: &toml::Value) -> Result<JobDescriptor, ConfigError> {
    let section: JobSection = raw.clone().try_into()?;

    let name = require(section.name, "name")?;
    if section.poll_interval_seconds == 0 {
        return Err(ConfigError::Invalid {
            field: "poll_interval_seconds".to_owned(),
            reason: "must be at least 1".to_owned(),
        });
    }

    let api = section.api.ok_or_else(|| ConfigError::Missing("api".to_owned()))?;
    let credentials = Credentials::new(
        require(api.email, "api.email")?,
        require(api.password, "api.password")?,
    );

    if section.rules.is_empty() {
        return Err(ConfigError::Missing("rules".to_owned()));
    }
    let mut rules = Vec::with_capacity(section.rules.len());
    for (index, rule) in section.rules.into_iter().enumerate() {
        let keyword = require(rule.keyword, &format!("rules[{index}].keyword"))?;
        let dest = rule
            .destination
            .ok_or_else(|| ConfigError::Missing(format!("rules[{index}].destination")))?;
        let destination = Destination {
            host: require(dest.host, &format!("rules[{index}].destination.host"))?,
            port: dest.port,
            username: dest.username,
            password: dest.password,
            topic: require(dest.topic, &format!("rules[{index}].destination.topic"))?,
        };
        rules.push(MatchRule::new(keyword, destination));
    }

    let mut job = JobDescriptor::new(name, credentials, rules);
    job.enabled = section.enabled;
    job.poll_interval = Duration::from_secs(section.poll_interval_seconds);
    Ok(job)
}
