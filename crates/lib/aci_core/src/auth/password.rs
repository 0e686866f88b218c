//! Password hashing via bcrypt.
//!
//! Hashes are self-describing (`$2b$<cost>$<salt+digest>`), so verification
//! needs nothing but the stored string.

use thiserror::Error;

/// Lowest cost bcrypt accepts.
pub const MIN_COST: u32 = 4;

/// Highest cost bcrypt accepts.
pub const MAX_COST: u32 = 31;

/// bcrypt only reads this many bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Password hashing errors. Never carries the plaintext.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("password exceeds {MAX_PASSWORD_BYTES} bytes")]
    TooLong,

    #[error("hashing task failed: {0}")]
    Task(String),
}

/// Hash a password with bcrypt at the given cost. Input past
/// [`MAX_PASSWORD_BYTES`] is refused rather than truncated.
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordError::TooLong);
    }
    Ok(bcrypt::non_truncating_hash(password, cost)?)
}

/// Verify a password against a bcrypt hash. A password longer than
/// [`MAX_PASSWORD_BYTES`] can never have been hashed, so it never matches.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }
    Ok(bcrypt::non_truncating_verify(password, hash)?)
}

/// Async front-end for the blocking bcrypt calls.
///
/// bcrypt is CPU-bound for hundreds of milliseconds at production cost, so
/// both operations run on the blocking pool instead of a runtime worker.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash `password` at this hasher's cost.
    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let password = password.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
    }

    /// Verify `password` against a stored hash.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_accepts_same_password() {
        let hash = hash_password("Sup3r$ecret", MIN_COST).unwrap();
        assert!(verify_password("Sup3r$ecret", &hash).unwrap());
    }

    #[test]
    fn verify_rejects_different_password() {
        let hash = hash_password("Sup3r$ecret", MIN_COST).unwrap();
        assert!(!verify_password("Sup3r$ecreT", &hash).unwrap());
        assert!(!verify_password("", &hash).unwrap());
    }

    #[test]
    fn hash_embeds_cost_and_is_salted() {
        let a = hash_password("same-input", MIN_COST).unwrap();
        let b = hash_password("same-input", MIN_COST).unwrap();
        assert!(a.starts_with("$2b$04$"), "unexpected hash format: {a}");
        assert_ne!(a, b, "two hashes of the same input must use different salts");
    }

    #[test]
    fn passwords_sharing_a_72_byte_prefix_are_distinct() {
        let prefix = "Aa1!".repeat(18);
        let hash = hash_password(&prefix, MIN_COST).unwrap();
        assert!(verify_password(&prefix, &hash).unwrap());
        assert!(!verify_password(&format!("{prefix}SECOND"), &hash).unwrap());

        assert!(matches!(
            hash_password(&format!("{prefix}first"), MIN_COST),
            Err(PasswordError::TooLong)
        ));
    }

    #[test]
    fn verify_against_garbage_hash_is_an_error() {
        assert!(verify_password("whatever", "not-a-bcrypt-hash").is_err());
    }

    #[tokio::test]
    async fn async_hasher_round_trip() {
        let hasher = PasswordHasher::new(MIN_COST);
        let hash = hasher.hash("Tr0ub4dor&3").await.unwrap();
        assert!(hasher.verify("Tr0ub4dor&3", &hash).await.unwrap());
        assert!(!hasher.verify("tr0ub4dor&3", &hash).await.unwrap());
    }
}
