use thiserror::Error;

/// Failure to exchange credentials for a bearer token.
///
/// Never fatal: the job runner stays in its token-acquisition state and
/// retries after a fixed backoff.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The login endpoint answered with a non-200 status.
    #[error("login rejected with status {0}")]
    Status(u16),

    /// A 200 response without a usable `token` field.
    #[error("login response carried no token")]
    MissingToken,

    /// The response body was not the expected JSON shape.
    #[error("malformed login response: {0}")]
    MalformedResponse(String),

    /// The login request did not complete in time.
    #[error("login timed out")]
    Timeout,

    /// Transport-level failure reaching the login endpoint.
    #[error("login connection error: {0}")]
    Connection(String),
}

/// Failure to fetch the device list, classified by its effect on the
/// session token.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The API rejected the bearer token (HTTP 401); re-authenticate.
    #[error("bearer token rejected by the API")]
    Unauthorized,

    /// Timeout or malformed body; the token is assumed still good.
    #[error("transient fetch failure: {0}")]
    Transient(String),

    /// Anything else; the token is discarded before the next cycle.
    #[error("unexpected fetch failure: {0}")]
    Unexpected(String),
}

impl FetchError {
    /// Whether the runner must drop its token before the next cycle.
    pub fn discards_token(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::Unexpected(_))
    }
}
