//! Notification sink for newly issued credentials.
//!
//! Delivery is fire-and-forget from the caller's point of view: a failed
//! notification never undoes the account it reports on.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::models::User;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait CredentialNotifier: Send + Sync {
    /// Deliver `plaintext_password` to the owner of `user`.
    async fn notify_new_credentials(
        &self,
        user: &User,
        plaintext_password: &str,
    ) -> Result<(), NotifyError>;
}

/// Records the event in the log. The password itself is never written.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl CredentialNotifier for LogNotifier {
    async fn notify_new_credentials(
        &self,
        user: &User,
        _plaintext_password: &str,
    ) -> Result<(), NotifyError> {
        info!(
            username = %user.username,
            email = %user.email,
            "New credentials issued; no mail transport configured"
        );
        Ok(())
    }
}
