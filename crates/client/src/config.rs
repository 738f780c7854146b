use std::time::Duration;

/// Default login endpoint.
pub const DEFAULT_LOGIN_URL: &str = "https://airquality.aqi.in/api/v1/login";

/// Default device-list endpoint.
pub const DEFAULT_DEVICES_URL: &str = "https://airquality.aqi.in/api/v1/GetAllUserDevices";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Upstream endpoints and the per-request timeout for the HTTP client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub login_url: String,
    pub devices_url: String,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            login_url: DEFAULT_LOGIN_URL.to_owned(),
            devices_url: DEFAULT_DEVICES_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ApiConfig {
    /// Point both endpoints at a different host, keeping the default paths'
    /// timeout. Mostly useful for tests and staging environments.
    pub fn with_urls(login_url: impl Into<String>, devices_url: impl Into<String>) -> Self {
        Self {
            login_url: login_url.into(),
            devices_url: devices_url.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_production_api() {
        let config = ApiConfig::default();
        assert!(config.login_url.ends_with("/login"));
        assert!(config.devices_url.ends_with("/GetAllUserDevices"));
        assert_eq!(config.timeout, Duration::from_secs(15));
    }
}
