//! Auth boundary.
//!
//! Sign-in, email verification and domain allow-listing live in the
//! authentication provider.  The social layer only asks who is signed in
//! and whether their email is verified.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SocialError};

/// The signed-in principal as reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub email_verified: bool,
}

impl AuthUser {
    pub fn new(uid: impl Into<String>, email: impl Into<String>, email_verified: bool) -> Self {
        Self {
            uid: uid.into(),
            email: email.into(),
            email_verified,
        }
    }

    /// Local part of the email, used to seed a display name.
    pub fn email_handle(&self) -> &str {
        self.email.split('@').next().unwrap_or_default()
    }
}

pub trait AuthBoundary: Send + Sync {
    fn current_user(&self) -> Option<AuthUser>;
}

/// Fixed session, for embedding and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth(pub Option<AuthUser>);

impl AuthBoundary for StaticAuth {
    fn current_user(&self) -> Option<AuthUser> {
        self.0.clone()
    }
}

pub fn require_signed_in(auth: &dyn AuthBoundary) -> Result<AuthUser> {
    auth.current_user().ok_or(SocialError::Unauthenticated)
}

/// Signed in with a verified email address.
pub fn require_verified(auth: &dyn AuthBoundary) -> Result<AuthUser> {
    let user = require_signed_in(auth)?;
    if !user.email_verified {
        return Err(SocialError::EmailNotVerified);
    }
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_require_verified() {
        let none = StaticAuth(None);
        assert_eq!(
            require_verified(&none).unwrap_err().category(),
            ErrorCategory::Unauthenticated
        );

        let unverified = StaticAuth(Some(AuthUser::new("u1", "ada@campus.edu", false)));
        assert!(require_signed_in(&unverified).is_ok());
        let err = require_verified(&unverified).unwrap_err();
        assert!(err.is_permission_denied());

        let verified = StaticAuth(Some(AuthUser::new("u1", "ada@campus.edu", true)));
        let user = require_verified(&verified).unwrap();
        assert_eq!(user.email_handle(), "ada");
    }
}
