//! Access guard: the per-request gate in front of every protected
//! operation.
//!
//! ```text
//! Unauthenticated -> TokenVerified -> UserResolved -> Authorized
//!        \________________\________________\__________> Rejected
//! ```
//!
//! The guard performs no writes and keeps nothing between calls; account
//! state and memberships are read fresh on every request.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use super::resolver::{can_use_tool, has_role};
use crate::auth::{TokenCodec, TokenError, TokenKind};
use crate::models::{KnownRole, User};
use crate::store::{CredentialStore, StoreError};

/// Predicate evaluated once the user is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// Any authenticated, active user.
    Authenticated,
    /// Must hold the named role.
    Role(String),
    /// Must be allowed to use the named tool.
    Tool(String),
}

impl Requirement {
    pub fn role(role: KnownRole) -> Self {
        Requirement::Role(role.as_str().to_string())
    }

    pub fn superuser() -> Self {
        Self::role(KnownRole::Superuser)
    }

    pub fn tool(name: impl Into<String>) -> Self {
        Requirement::Tool(name.into())
    }

    fn allows(&self, user: &User) -> bool {
        match self {
            Requirement::Authenticated => true,
            Requirement::Role(role) => has_role(user, role),
            Requirement::Tool(tool) => can_use_tool(user, tool),
        }
    }
}

/// Why the guard refused a request.
#[derive(Debug, Error)]
pub enum Rejection {
    #[error("missing credentials")]
    MissingCredentials,

    #[error("{0}")]
    InvalidToken(TokenError),

    #[error("inactive or unknown user")]
    InactiveOrUnknownUser,

    #[error("insufficient permission")]
    InsufficientPermission,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Rejection {
    /// True for the 401 family, false for 403 and internal failures.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(
            self,
            Rejection::MissingCredentials
                | Rejection::InvalidToken(_)
                | Rejection::InactiveOrUnknownUser
        )
    }
}

#[derive(Clone)]
pub struct AccessGuard {
    store: Arc<dyn CredentialStore>,
    codec: Arc<TokenCodec>,
}

impl AccessGuard {
    pub fn new(store: Arc<dyn CredentialStore>, codec: Arc<TokenCodec>) -> Self {
        Self { store, codec }
    }

    /// Run the gate for a request carrying `bearer` (the raw token, if any).
    pub async fn authorize(
        &self,
        bearer: Option<&str>,
        requirement: &Requirement,
    ) -> Result<User, Rejection> {
        let token = bearer
            .filter(|t| !t.is_empty())
            .ok_or(Rejection::MissingCredentials)?;

        let username = self
            .codec
            .verify(token, TokenKind::Access)
            .map_err(Rejection::InvalidToken)?;

        let user = match self.store.find_user_by_username(&username).await? {
            Some(user) if user.is_active => user,
            _ => {
                debug!(username = %username, "Access rejected: inactive or unknown user");
                return Err(Rejection::InactiveOrUnknownUser);
            }
        };

        if !requirement.allows(&user) {
            debug!(username = %username, ?requirement, "Access rejected: insufficient permission");
            return Err(Rejection::InsufficientPermission);
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::settings::AuthConfig;
    use crate::store::memory::MemoryCredentialStore;
    use crate::store::{NewTool, NewUser, UserChanges};

    struct Fixture {
        guard: AccessGuard,
        codec: Arc<TokenCodec>,
        store: Arc<MemoryCredentialStore>,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryCredentialStore::new());
        let tool = store
            .create_tool(NewTool {
                name: "compare_tool".into(),
                display_name: "Compare".into(),
                description: None,
                route: "/compare".into(),
                icon: "tool".into(),
                is_active: true,
            })
            .await
            .unwrap();
        let user_role = store.find_role_by_name("user").await.unwrap().unwrap();
        store
            .create_user(NewUser {
                full_name: "Alice".into(),
                username: "alice".into(),
                email: "alice@example.com".into(),
                password_hash: "unused".into(),
                is_active: true,
                role_ids: vec![user_role.id],
                tool_ids: vec![tool.id],
            })
            .await
            .unwrap();

        let codec = Arc::new(TokenCodec::new(&AuthConfig::new("a-secret", "r-secret")));
        Fixture {
            guard: AccessGuard::new(store.clone(), codec.clone()),
            codec,
            store,
        }
    }

    #[tokio::test]
    async fn missing_token_is_rejected() {
        let f = fixture().await;
        let err = f.guard.authorize(None, &Requirement::Authenticated).await.unwrap_err();
        assert!(matches!(err, Rejection::MissingCredentials));
        assert!(err.is_unauthenticated());
        assert_eq!(err.to_string(), "missing credentials");
    }

    #[tokio::test]
    async fn refresh_token_cannot_pass_the_guard() {
        let f = fixture().await;
        let token = f.codec.issue_refresh("alice").unwrap();
        let err = f
            .guard
            .authorize(Some(&token), &Requirement::Authenticated)
            .await
            .unwrap_err();
        assert!(matches!(err, Rejection::InvalidToken(TokenError::WrongType)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let f = fixture().await;
        let token = f
            .codec
            .issue_at("alice", TokenKind::Access, Utc::now() - Duration::hours(2))
            .unwrap();
        let err = f
            .guard
            .authorize(Some(&token), &Requirement::Authenticated)
            .await
            .unwrap_err();
        assert!(matches!(err, Rejection::InvalidToken(TokenError::Expired)));
    }

    #[tokio::test]
    async fn deactivation_takes_effect_on_next_request() {
        let f = fixture().await;
        let token = f.codec.issue_access("alice").unwrap();
        let user = f
            .guard
            .authorize(Some(&token), &Requirement::Authenticated)
            .await
            .unwrap();

        f.store
            .update_user(
                user.id,
                UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let err = f
            .guard
            .authorize(Some(&token), &Requirement::Authenticated)
            .await
            .unwrap_err();
        assert!(matches!(err, Rejection::InactiveOrUnknownUser));
    }

    #[tokio::test]
    async fn unknown_subject_is_rejected() {
        let f = fixture().await;
        let token = f.codec.issue_access("ghost").unwrap();
        let err = f
            .guard
            .authorize(Some(&token), &Requirement::Authenticated)
            .await
            .unwrap_err();
        assert!(matches!(err, Rejection::InactiveOrUnknownUser));
    }

    #[tokio::test]
    async fn role_and_tool_requirements() {
        let f = fixture().await;
        let token = f.codec.issue_access("alice").unwrap();

        assert!(f
            .guard
            .authorize(Some(&token), &Requirement::tool("compare_tool"))
            .await
            .is_ok());
        assert!(f
            .guard
            .authorize(Some(&token), &Requirement::role(KnownRole::User))
            .await
            .is_ok());

        let err = f
            .guard
            .authorize(Some(&token), &Requirement::superuser())
            .await
            .unwrap_err();
        assert!(matches!(err, Rejection::InsufficientPermission));
        assert!(!err.is_unauthenticated());

        let err = f
            .guard
            .authorize(Some(&token), &Requirement::tool("other_tool"))
            .await
            .unwrap_err();
        assert!(matches!(err, Rejection::InsufficientPermission));
    }
}
