//! Error types for dqueue.
//!
//! Lock conflicts are never errors: a pid that cannot be claimed or removed is
//! simply absent from the returned set. Errors are reserved for the store
//! being unreachable, the store answering with garbage, and bad caller input.

use crate::exit_codes;
use thiserror::Error;

/// Main error type for dqueue operations.
#[derive(Error, Debug)]
pub enum QueueError {
    /// The shared store cannot be reached, dropped the connection, or timed out.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The shared store returned data in an unexpected shape.
    #[error("Store protocol violation: {0}")]
    ProtocolViolation(String),

    /// The caller passed an argument the engine cannot act on.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration or CLI level problem.
    #[error("{0}")]
    UserError(String),
}

impl QueueError {
    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            QueueError::StoreUnavailable(_) => exit_codes::STORE_UNAVAILABLE,
            QueueError::ProtocolViolation(_) => exit_codes::PROTOCOL_VIOLATION,
            QueueError::InvalidArgument(_) => exit_codes::USER_ERROR,
            QueueError::UserError(_) => exit_codes::USER_ERROR,
        }
    }
}

impl From<redis::RedisError> for QueueError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_timeout()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
        {
            QueueError::StoreUnavailable(err.to_string())
        } else {
            QueueError::ProtocolViolation(err.to_string())
        }
    }
}

/// Result type alias for dqueue operations.
pub type Result<T> = std::result::Result<T, QueueError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_unavailable_has_correct_exit_code() {
        let err = QueueError::StoreUnavailable("connection refused".to_string());
        assert_eq!(err.exit_code(), exit_codes::STORE_UNAVAILABLE);
    }

    #[test]
    fn protocol_violation_has_correct_exit_code() {
        let err = QueueError::ProtocolViolation("bad owner".to_string());
        assert_eq!(err.exit_code(), exit_codes::PROTOCOL_VIOLATION);
    }

    #[test]
    fn caller_errors_map_to_user_error() {
        let err = QueueError::InvalidArgument("ttl must be positive".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);

        let err = QueueError::UserError("bad config".to_string());
        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
    }

    #[test]
    fn io_errors_become_store_unavailable() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err: QueueError = redis::RedisError::from(io).into();
        assert!(matches!(err, QueueError::StoreUnavailable(_)));
    }

    #[test]
    fn type_errors_become_protocol_violations() {
        let redis_err =
            redis::RedisError::from((redis::ErrorKind::TypeError, "unexpected reply"));
        let err: QueueError = redis_err.into();
        assert!(matches!(err, QueueError::ProtocolViolation(_)));
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = QueueError::StoreUnavailable("timed out".to_string());
        assert_eq!(err.to_string(), "Store unavailable: timed out");

        let err = QueueError::UserError("config missing".to_string());
        assert_eq!(err.to_string(), "config missing");
    }
}
