//! Error taxonomy for a lease cancellation run
//!
//! Every operation returns a [`CancellerError`]; the binary maps it to a
//! process exit code in exactly one place.

use thiserror::Error;

/// Exit code for invalid command-line parameters
pub const EXIT_INVALID_PARAMETERS: i32 = 2;

/// Exit code for operational failures
pub const EXIT_FAILURE: i32 = 70;

/// Exit code for user-requested termination
pub const EXIT_USER_TERMINATION: i32 = 130;

/// Errors produced while cancelling leases
#[derive(Debug, Error)]
pub enum CancellerError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Node unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Invalid key format: {0}")]
    InvalidKeyFormat(String),

    #[error("Signing failed: {0}")]
    SigningFailure(String),

    #[error("Broadcast failed: {0}")]
    BroadcastFailure(String),

    #[error("Terminated by user")]
    UserTermination,

    #[error("Operation failed: {0}")]
    OperationFailure(String),
}

impl CancellerError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CancellerError::InvalidParameters(_) => EXIT_INVALID_PARAMETERS,
            CancellerError::UserTermination => EXIT_USER_TERMINATION,
            _ => EXIT_FAILURE,
        }
    }

    /// Whether the usage text should accompany this error
    pub fn shows_usage(&self) -> bool {
        matches!(self, CancellerError::InvalidParameters(_))
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, CancellerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CancellerError::InvalidParameters("x".into()).exit_code(), 2);
        assert_eq!(CancellerError::UserTermination.exit_code(), 130);
        assert_eq!(CancellerError::NetworkUnavailable("x".into()).exit_code(), 70);
        assert_eq!(CancellerError::InvalidKeyFormat("x".into()).exit_code(), 70);
        assert_eq!(CancellerError::SigningFailure("x".into()).exit_code(), 70);
        assert_eq!(CancellerError::BroadcastFailure("x".into()).exit_code(), 70);
        assert_eq!(CancellerError::OperationFailure("x".into()).exit_code(), 70);
    }

    #[test]
    fn test_only_invalid_parameters_show_usage() {
        assert!(CancellerError::InvalidParameters("bad url".into()).shows_usage());
        assert!(!CancellerError::UserTermination.shows_usage());
        assert!(!CancellerError::BroadcastFailure("rejected".into()).shows_usage());
    }
}
