use std::time::Duration;

use thiserror::Error;

/// Failure to deliver a payload to a broker destination.
///
/// Contained per destination: the job runner logs it and moves on to the
/// next delivery; token state is never affected.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Could not establish or keep the broker session (includes broker-side
    /// authentication rejections).
    #[error("broker connection failed: {0}")]
    Connection(String),

    /// The client rejected the publish or disconnect request locally.
    #[error("publish rejected: {0}")]
    Rejected(String),

    /// The whole connect-publish-disconnect exchange exceeded its deadline.
    #[error("publish timed out after {0:?}")]
    Timeout(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(
            PublishError::Connection("refused".into()).to_string(),
            "broker connection failed: refused"
        );
        assert_eq!(
            PublishError::Timeout(Duration::from_secs(15)).to_string(),
            "publish timed out after 15s"
        );
    }
}
