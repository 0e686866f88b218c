//! Access control: the permission resolver and the per-request access
//! guard built on it.

pub mod guard;
pub mod resolver;

pub use guard::{AccessGuard, Rejection, Requirement};
pub use resolver::{can_use_tool, effective_tools, effective_tools_with, has_role, is_superuser};
