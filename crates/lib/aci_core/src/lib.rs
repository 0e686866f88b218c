//! # aci_core
//!
//! Core authentication and access-control logic for the ACI Dashboard.

pub mod acl;
pub mod auth;
pub mod migrate;
pub mod models;
pub mod notify;
pub mod settings;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
