//! Login, token refresh and self-service password reset.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::jwt::{TokenCodec, TokenKind};
use super::password::{PasswordHasher, hash_password};
use super::policy::PasswordPolicy;
use super::validation::normalize;
use super::AuthError;
use crate::models::User;
use crate::settings::AuthConfig;
use crate::store::CredentialStore;

/// Fixed input for the hash verified when a username does not exist.
const DUMMY_PASSWORD: &str = "aci-dashboard-timing-equalizer";

/// Token pair handed out at login.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

/// Stateless per call; all state lives in the credential store.
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    codec: Arc<TokenCodec>,
    hasher: PasswordHasher,
    policy: PasswordPolicy,
    dummy_hash: String,
}

impl Authenticator {
    pub fn new(config: &AuthConfig, store: Arc<dyn CredentialStore>) -> Result<Self, AuthError> {
        Ok(Self {
            store,
            codec: Arc::new(TokenCodec::new(config)),
            hasher: PasswordHasher::new(config.bcrypt_cost),
            policy: config.password_policy.clone(),
            dummy_hash: hash_password(DUMMY_PASSWORD, config.bcrypt_cost)?,
        })
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    pub fn policy(&self) -> &PasswordPolicy {
        &self.policy
    }

    /// Check a username/password pair.
    ///
    /// One bcrypt verification runs on every path, so an unknown username
    /// costs the same as a wrong password.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = normalize(username);
        let user = self.store.find_user_by_username(&username).await?;

        let hash = user
            .as_ref()
            .map_or(self.dummy_hash.as_str(), |u| u.password_hash.as_str());
        let matches = match self.hasher.verify(password, hash).await {
            Ok(matches) => matches,
            Err(e) => {
                warn!(username = %username, error = %e, "Stored password hash could not be verified");
                false
            }
        };

        match user {
            None => {
                debug!(username = %username, "Login rejected: unknown user");
                Err(AuthError::InvalidCredentials)
            }
            Some(_) if !matches => {
                debug!(username = %username, "Login rejected: wrong password");
                Err(AuthError::InvalidCredentials)
            }
            Some(u) if !u.is_active => {
                debug!(username = %username, "Login rejected: inactive account");
                Err(AuthError::InvalidCredentials)
            }
            Some(u) => Ok(u),
        }
    }

    /// Issue an access/refresh pair for `user`.
    pub fn issue_session(&self, user: &User) -> Result<Session, AuthError> {
        Ok(Session {
            access_token: self.codec.issue_access(&user.username)?,
            refresh_token: self.codec.issue_refresh(&user.username)?,
        })
    }

    /// Exchange a refresh token for a new access token. The account is
    /// re-read so deactivation takes effect immediately.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let username = self
            .codec
            .verify(refresh_token, TokenKind::Refresh)
            .map_err(|e| {
                debug!(reason = %e, "Refresh rejected");
                AuthError::InvalidRefreshToken
            })?;

        match self.store.find_user_by_username(&username).await? {
            Some(user) if user.is_active => Ok(self.codec.issue_access(&user.username)?),
            Some(_) => {
                debug!(username = %username, "Refresh rejected: inactive account");
                Err(AuthError::InvalidRefreshToken)
            }
            None => {
                debug!(username = %username, "Refresh rejected: unknown user");
                Err(AuthError::InvalidRefreshToken)
            }
        }
    }

    /// Change a password after proving the current one.
    ///
    /// The write only lands if the stored hash is still the one that was
    /// just verified; a concurrent reset that got there first turns this
    /// call into `InvalidCredentials`.
    pub async fn reset_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let user = self.authenticate(username, current_password).await?;
        self.policy.check(new_password)?;

        let new_hash = self.hasher.hash(new_password).await?;
        let swapped = self
            .store
            .update_password_hash(user.id, &user.password_hash, &new_hash)
            .await?;
        if !swapped {
            debug!(username = %user.username, "Password reset lost a concurrent update");
            return Err(AuthError::InvalidCredentials);
        }

        info!(username = %user.username, "Password reset");
        Ok(())
    }
}
