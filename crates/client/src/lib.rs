//! The upstream API boundary: exchanging account credentials for a bearer
//! token and fetching the account's device list.
//!
//! The [`SensorApi`] trait is the capability the job runner depends on;
//! [`HttpSensorApi`] is its one real implementation, built on `reqwest`
//! against the AQI.in-shaped endpoints.

pub mod api;
pub mod config;
pub mod error;
pub mod http;

pub use api::SensorApi;
pub use config::{ApiConfig, DEFAULT_DEVICES_URL, DEFAULT_LOGIN_URL};
pub use error::{AuthError, FetchError};
pub use http::HttpSensorApi;
