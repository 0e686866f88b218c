//! Password policy: minimum length plus four independently checked
//! character classes.

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::password::MAX_PASSWORD_BYTES;

/// Characters that satisfy the special-character class.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

const UPPERCASE: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWERCASE: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";

/// First rule a candidate password breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("Password must be at least {0} characters long")]
    TooShort(usize),

    #[error("Password must be at most {0} bytes long")]
    TooLong(usize),

    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,

    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,

    #[error("Password must contain at least one digit")]
    MissingDigit,

    #[error("Password must contain at least one special character")]
    MissingSpecial,
}

/// Rules a new password must satisfy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }
}

impl PasswordPolicy {
    /// Check `password`, reporting the first failing rule in the order
    /// length, uppercase, lowercase, digit, special. The upper bound is in
    /// bytes since that is what bcrypt reads.
    pub fn check(&self, password: &str) -> Result<(), PolicyViolation> {
        if password.chars().count() < self.min_length {
            return Err(PolicyViolation::TooShort(self.min_length));
        }
        if password.len() > MAX_PASSWORD_BYTES {
            return Err(PolicyViolation::TooLong(MAX_PASSWORD_BYTES));
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(PolicyViolation::MissingUppercase);
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(PolicyViolation::MissingLowercase);
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PolicyViolation::MissingDigit);
        }
        if self.require_special && !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
            return Err(PolicyViolation::MissingSpecial);
        }
        Ok(())
    }

    /// Generate a random password that satisfies this policy.
    ///
    /// The result is `max(length, min_length, 4)` characters, capped at
    /// [`MAX_PASSWORD_BYTES`], and always contains one character from every
    /// class.
    pub fn generate(&self, length: usize) -> String {
        let length = length.max(self.min_length).max(4).min(MAX_PASSWORD_BYTES);
        let specials = SPECIAL_CHARACTERS.as_bytes();
        let classes: [&[u8]; 4] = [UPPERCASE, LOWERCASE, DIGITS, specials];
        let mut rng = rand::rng();

        let mut out: Vec<u8> = classes
            .iter()
            .filter_map(|class| class.choose(&mut rng).copied())
            .collect();
        while out.len() < length {
            let class = classes[rng.random_range(0..classes.len())];
            if let Some(&b) = class.choose(&mut rng) {
                out.push(b);
            }
        }
        out.shuffle(&mut rng);
        out.into_iter().map(char::from).collect()
    }
}
