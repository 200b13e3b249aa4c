//! Auth Provider Seam
//!
//! The sync engine only needs to know who (if anyone) is signed in; the
//! authentication UI and token lifecycle live in the extension shell. This
//! module defines that narrow seam plus a static implementation for tests
//! and headless embedding.

use std::sync::RwLock;

/// The signed-in user, as far as the core needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    /// Stable user id; keys the remote document
    pub uid: String,

    /// Email recorded on uploaded documents
    pub email: Option<String>,
}

/// Read-only view of the authentication state.
pub trait AuthProvider: Send + Sync {
    /// The currently signed-in user, if any
    fn current_user(&self) -> Option<UserInfo>;

    /// Whether anyone is signed in
    fn is_logged_in(&self) -> bool {
        self.current_user().is_some()
    }
}

/// `AuthProvider` holding a settable user, for tests and embedders.
#[derive(Debug, Default)]
pub struct StaticAuthProvider {
    user: RwLock<Option<UserInfo>>,
}

impl StaticAuthProvider {
    /// No user signed in
    pub fn logged_out() -> Self {
        Self::default()
    }

    /// A fixed user signed in
    pub fn logged_in(uid: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user: RwLock::new(Some(UserInfo {
                uid: uid.into(),
                email,
            })),
        }
    }

    /// Replace the signed-in user (None = sign out)
    pub fn set_user(&self, user: Option<UserInfo>) {
        *self
            .user
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = user;
    }
}

impl AuthProvider for StaticAuthProvider {
    fn current_user(&self) -> Option<UserInfo> {
        self.user
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_auth_provider_transitions() {
        let auth = StaticAuthProvider::logged_out();
        assert!(!auth.is_logged_in());
        assert_eq!(auth.current_user(), None);

        auth.set_user(Some(UserInfo {
            uid: "u1".to_string(),
            email: Some("u1@example.com".to_string()),
        }));
        assert!(auth.is_logged_in());
        assert_eq!(auth.current_user().unwrap().uid, "u1");

        auth.set_user(None);
        assert!(!auth.is_logged_in());
    }
}
