//! Permission resolver.
//!
//! The single place that knows `superuser` implies every active tool.
//! Write-time clearing of a superuser's explicit tools lives in the store.

use crate::models::{KnownRole, Tool, User};
use crate::store::{CredentialStore, StoreResult};

/// True iff any assigned role is named `superuser`.
pub fn is_superuser(user: &User) -> bool {
    has_role(user, KnownRole::Superuser.as_str())
}

/// Case-sensitive exact match against assigned role names.
pub fn has_role(user: &User, role_name: &str) -> bool {
    user.roles.iter().any(|r| r.name == role_name)
}

/// Effective tools given an already loaded catalog of active tools.
pub fn effective_tools_with(user: &User, active_catalog: &[Tool]) -> Vec<Tool> {
    if is_superuser(user) {
        return active_catalog.iter().filter(|t| t.is_active).cloned().collect();
    }
    user.tools.iter().filter(|t| t.is_active).cloned().collect()
}

/// Effective tools of `user` against current store state. The catalog is
/// only read for superusers.
pub async fn effective_tools(store: &dyn CredentialStore, user: &User) -> StoreResult<Vec<Tool>> {
    if is_superuser(user) {
        let catalog = store.list_active_tools().await?;
        return Ok(effective_tools_with(user, &catalog));
    }
    Ok(effective_tools_with(user, &[]))
}

pub fn can_use_tool(user: &User, tool_name: &str) -> bool {
    is_superuser(user)
        || user
            .tools
            .iter()
            .any(|t| t.is_active && t.name == tool_name)
}
