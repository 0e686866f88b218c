//! Business flows behind the handlers.

pub mod admin;
pub mod rate_limit;
pub mod users;
