//! Credential store domain models.
//!
//! These are internal domain models, distinct from the request/response
//! shapes in `aci_api::models`.

mod role;
mod tool;
mod user;

pub use role::{KnownRole, Role};
pub use tool::Tool;
pub use user::User;

/// Numeric row identifier owned by the credential store.
pub type Id = i64;
