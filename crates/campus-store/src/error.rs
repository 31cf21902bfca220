use std::time::Duration;

use thiserror::Error;

/// Backend-neutral status codes, modelled on the codes managed document
/// stores report.  Callers classify failures by code, never by message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    PermissionDenied,
    Unauthenticated,
    FailedPrecondition,
    NotFound,
    InvalidArgument,
    DeadlineExceeded,
    Unavailable,
    Unknown,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission-denied",
            Self::Unauthenticated => "unauthenticated",
            Self::FailedPrecondition => "failed-precondition",
            Self::NotFound => "not-found",
            Self::InvalidArgument => "invalid-argument",
            Self::DeadlineExceeded => "deadline-exceeded",
            Self::Unavailable => "unavailable",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by a document store backend.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Rejected by the store's security rules.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// No signed-in principal was attached to the request.
    #[error("Unauthenticated request")]
    Unauthenticated,

    /// The backend cannot serve the request as deployed, typically a
    /// missing composite index.
    #[error("Failed precondition: {0}")]
    FailedPrecondition(String),

    /// `update` targeted a document that does not exist.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Malformed path, query or value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The call did not complete before its deadline.
    #[error("Deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// Network or service outage.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Anything the backend could not classify.
    #[error("Store error: {0}")]
    Unknown(String),
}

impl StoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::Unauthenticated => ErrorCode::Unauthenticated,
            Self::FailedPrecondition(_) => ErrorCode::FailedPrecondition,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::DeadlineExceeded(_) => ErrorCode::DeadlineExceeded,
            Self::Unavailable(_) => ErrorCode::Unavailable,
            Self::Unknown(_) => ErrorCode::Unknown,
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            StoreError::PermissionDenied("rules".into()).code(),
            ErrorCode::PermissionDenied
        );
        assert_eq!(
            StoreError::FailedPrecondition("index".into()).code().as_str(),
            "failed-precondition"
        );
        assert_eq!(
            StoreError::DeadlineExceeded(Duration::from_secs(1)).code(),
            ErrorCode::DeadlineExceeded
        );
    }
}
