//! JWT token generation and verification.
//!
//! Access and refresh tokens are HS256 JWTs signed with two distinct
//! secrets and tagged with a `type` claim, so neither class can stand in
//! for the other.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::settings::AuthConfig;

/// Token class discriminant carried in the `type` claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn other(self) -> Self {
        match self {
            TokenKind::Access => TokenKind::Refresh,
            TokenKind::Refresh => TokenKind::Access,
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        })
    }
}

/// Claims embedded in both token classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject: the username.
    pub sub: String,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Issued at (unix seconds).
    pub iat: i64,
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

/// Why a token was refused. All variants are terminal for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token is malformed")]
    Malformed,

    #[error("token type does not match")]
    WrongType,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token could not be signed")]
    Signing,
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Signs and verifies access and refresh tokens.
pub struct TokenCodec {
    access: KeyPair,
    refresh: KeyPair,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            access: KeyPair::from_secret(&config.access_secret),
            refresh: KeyPair::from_secret(&config.refresh_secret),
            access_ttl: Duration::minutes(config.access_ttl_minutes),
            refresh_ttl: Duration::days(config.refresh_ttl_days),
        }
    }

    /// Access-token lifetime in seconds.
    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    pub fn issue_access(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, TokenKind::Access, Utc::now())
    }

    pub fn issue_refresh(&self, subject: &str) -> Result<String, TokenError> {
        self.issue_at(subject, TokenKind::Refresh, Utc::now())
    }

    /// Issue a token of `kind` as if the current time were `now`.
    pub fn issue_at(
        &self,
        subject: &str,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let (keys, ttl) = self.keys(kind);
        let claims = TokenClaims {
            sub: subject.to_string(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
            kind,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding)
            .map_err(|_| TokenError::Signing)
    }

    /// Verify `token` as `expected` and return its subject.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<String, TokenError> {
        self.verify_at(token, expected, Utc::now())
            .map(|claims| claims.sub)
    }

    /// Verify `token` as `expected` against an explicit clock.
    ///
    /// A token is still valid at exactly its `exp` second and expired from
    /// the following second on.
    pub fn verify_at(
        &self,
        token: &str,
        expected: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<TokenClaims, TokenError> {
        let (keys, _) = self.keys(expected);
        let claims = match decode_claims(token, keys) {
            Ok(claims) => claims,
            // Valid under the other class's secret.
            Err(TokenError::BadSignature) => {
                let (other, _) = self.keys(expected.other());
                return match decode_claims(token, other) {
                    Ok(_) => Err(TokenError::WrongType),
                    Err(_) => Err(TokenError::BadSignature),
                };
            }
            Err(e) => return Err(e),
        };

        if claims.kind != expected {
            return Err(TokenError::WrongType);
        }
        if claims.sub.is_empty() {
            return Err(TokenError::Malformed);
        }
        if now.timestamp() > claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn keys(&self, kind: TokenKind) -> (&KeyPair, Duration) {
        match kind {
            TokenKind::Access => (&self.access, self.access_ttl),
            TokenKind::Refresh => (&self.refresh, self.refresh_ttl),
        }
    }
}

fn decode_claims(token: &str, keys: &KeyPair) -> Result<TokenClaims, TokenError> {
    // Expiry is checked by the caller against its own clock.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.required_spec_claims = HashSet::from(["exp".to_string(), "sub".to_string()]);

    decode::<TokenClaims>(token, &keys.decoding, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Malformed,
        })
}
