use campus_store::{ErrorCode, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::RequestStatus;

/// Errors produced by the social layer.
///
/// Invariant violations get their own variants; store failures pass through
/// unchanged inside [`SocialError::Store`] and are classified by code.
#[derive(Error, Debug)]
pub enum SocialError {
    /// One or more caller-fixable rule violations, in field order.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Cannot send a friend request to yourself")]
    SelfFriendRequest,

    #[error("Friend request already exists")]
    RequestAlreadyExists,

    #[error("Already friends")]
    AlreadyFriends,

    #[error("Friend request not found: {0}")]
    RequestNotFound(String),

    #[error("Friend request is already {}", .0.as_str())]
    RequestNotPending(RequestStatus),

    #[error("Cannot notify yourself")]
    SelfNotification,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Sign in required")]
    Unauthenticated,

    #[error("Email address not verified")]
    EmailNotVerified,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// User-actionable classes of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Validation,
    PermissionDenied,
    Unauthenticated,
    FailedPrecondition,
    NotFound,
    Conflict,
    Unknown,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::PermissionDenied => "permission_denied",
            Self::Unauthenticated => "unauthenticated",
            Self::FailedPrecondition => "failed_precondition",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Unknown => "unknown",
        }
    }
}

impl SocialError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) | Self::SelfFriendRequest | Self::SelfNotification => {
                ErrorCategory::Validation
            }
            Self::RequestAlreadyExists | Self::AlreadyFriends | Self::RequestNotPending(_) => {
                ErrorCategory::Conflict
            }
            Self::RequestNotFound(_) | Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Forbidden(_) | Self::EmailNotVerified => ErrorCategory::PermissionDenied,
            Self::Unauthenticated => ErrorCategory::Unauthenticated,
            Self::Store(err) => match err.code() {
                ErrorCode::PermissionDenied => ErrorCategory::PermissionDenied,
                ErrorCode::Unauthenticated => ErrorCategory::Unauthenticated,
                ErrorCode::FailedPrecondition => ErrorCategory::FailedPrecondition,
                ErrorCode::NotFound => ErrorCategory::NotFound,
                _ => ErrorCategory::Unknown,
            },
        }
    }

    /// Rejected at the auth/security-rule boundary.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::PermissionDenied | ErrorCategory::Unauthenticated
        )
    }

    /// The backend cannot serve this query as deployed.
    pub fn is_failed_precondition(&self) -> bool {
        self.category() == ErrorCategory::FailedPrecondition
    }

    /// Message safe to show to the end user.
    pub fn user_message(&self) -> String {
        match self.category() {
            ErrorCategory::Validation | ErrorCategory::Conflict | ErrorCategory::NotFound => {
                match self {
                    Self::Validation(errors) => errors.join("\n"),
                    other => other.to_string(),
                }
            }
            ErrorCategory::PermissionDenied => match self {
                Self::Forbidden(reason) => format!("Not allowed: {reason}."),
                _ => "Please verify your email address to continue.".to_string(),
            },
            ErrorCategory::Unauthenticated => "Please sign in to continue.".to_string(),
            ErrorCategory::FailedPrecondition => "This query is not supported yet.".to_string(),
            ErrorCategory::Unknown => "Something went wrong. Please try again.".to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SocialError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_errors_classified_by_code() {
        let denied = SocialError::from(StoreError::PermissionDenied("rules".into()));
        assert!(denied.is_permission_denied());
        assert_eq!(
            denied.user_message(),
            "Please verify your email address to continue."
        );

        let index = SocialError::from(StoreError::FailedPrecondition("index".into()));
        assert!(index.is_failed_precondition());
        assert!(!index.is_permission_denied());
        assert_eq!(index.user_message(), "This query is not supported yet.");

        let offline = SocialError::from(StoreError::Unavailable("offline".into()));
        assert_eq!(offline.category(), ErrorCategory::Unknown);
        assert!(offline.user_message().contains("try again"));
    }

    #[test]
    fn test_invariant_errors() {
        assert_eq!(SocialError::SelfNotification.category(), ErrorCategory::Validation);
        assert_eq!(SocialError::RequestAlreadyExists.category(), ErrorCategory::Conflict);
        assert_eq!(SocialError::Unauthenticated.user_message(), "Please sign in to continue.");

        let forbidden = SocialError::Forbidden("only the sender can cancel a request".into());
        assert!(forbidden.is_permission_denied());
        assert_eq!(
            forbidden.user_message(),
            "Not allowed: only the sender can cancel a request."
        );
        assert_eq!(
            SocialError::EmailNotVerified.user_message(),
            "Please verify your email address to continue."
        );

        let err = SocialError::Validation(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "Validation failed: a; b");
        assert_eq!(err.user_message(), "a\nb");
    }
}
