use std::fmt;

/// Kinds of externally visible actions recorded to a job's audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A login request is about to be sent.
    AuthAttempt,
    /// A bearer token was obtained.
    AuthOk,
    /// The login attempt failed; the runner backs off before retrying.
    AuthFailed,
    /// A device list was fetched successfully.
    FetchOk,
    /// The device fetch failed for a reason other than token rejection.
    FetchFailed,
    /// The API rejected the current bearer token (HTTP 401).
    TokenExpired,
    /// A payload was delivered to a destination.
    PublishOk,
    /// A delivery attempt failed.
    PublishFailed,
    /// A device produced nothing publishable this cycle.
    NoData,
    /// A job runner came up.
    JobStarted,
    /// A job runner shut down.
    JobStopped,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthAttempt => "AUTH_ATTEMPT",
            Self::AuthOk => "AUTH_OK",
            Self::AuthFailed => "AUTH_FAILED",
            Self::FetchOk => "FETCH_OK",
            Self::FetchFailed => "FETCH_FAILED",
            Self::TokenExpired => "API_TOKEN_EXPIRED",
            Self::PublishOk => "PUBLISH_OK",
            Self::PublishFailed => "PUBLISH_FAILED",
            Self::NoData => "NO_DATA",
            Self::JobStarted => "JOB_STARTED",
            Self::JobStopped => "JOB_STOPPED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
