//! Error types for the integration crate.

use std::fmt;

/// Errors from delivering a push notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The HTTP client could not be constructed.
    ClientBuild { reason: String },
    /// The request never reached the endpoint.
    DeliveryFailed { reason: String },
    /// The endpoint answered with a non-success status.
    Rejected { status: u16, body: String },
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientBuild { reason } => {
                write!(f, "failed to build notification client: {reason}")
            }
            Self::DeliveryFailed { reason } => {
                write!(f, "notification delivery failed: {reason}")
            }
            Self::Rejected { status, body } => {
                write!(f, "notification rejected with status {status}: {body}")
            }
        }
    }
}

impl std::error::Error for NotifyError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_display_includes_status() {
        let err = NotifyError::Rejected {
            status: 400,
            body: "invalid token".to_string(),
        };
        assert!(err.to_string().contains("400"));
        assert!(err.to_string().contains("invalid token"));
    }
}
