//! Authentication logic.
//!
//! Provides password hashing and policy, JWT management, profile field
//! validation and the [`Authenticator`] that ties them to a credential
//! store.

pub mod authenticator;
pub mod jwt;
pub mod password;
pub mod policy;
pub mod validation;

pub use authenticator::{Authenticator, Session};
pub use jwt::{TokenClaims, TokenCodec, TokenError, TokenKind};
pub use password::{PasswordError, PasswordHasher};
pub use policy::{PasswordPolicy, PolicyViolation};

use thiserror::Error;

use crate::store::StoreError;

/// Authentication errors.
///
/// `InvalidCredentials` and `InvalidRefreshToken` are deliberately opaque;
/// the precise cause is only ever logged.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Token error: {0}")]
    TokenError(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl From<PolicyViolation> for AuthError {
    fn from(v: PolicyViolation) -> Self {
        AuthError::ValidationError(v.to_string())
    }
}
