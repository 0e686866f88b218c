//! User response assembly.

use aci_core::acl::{effective_tools, effective_tools_with, is_superuser};
use aci_core::models::User;

use crate::AppState;
use crate::error::AppResult;
use crate::models::UserResponse;

/// Build the public view of `user` with its effective tools.
pub async fn user_response(state: &AppState, user: &User) -> AppResult<UserResponse> {
    let tools = effective_tools(state.store.as_ref(), user).await?;
    Ok(UserResponse::new(user, tools))
}

/// Same as [`user_response`] for many users; the active catalog is read
/// at most once.
pub async fn user_responses(state: &AppState, users: &[User]) -> AppResult<Vec<UserResponse>> {
    let catalog = if users.iter().any(is_superuser) {
        state.store.list_active_tools().await?
    } else {
        Vec::new()
    };
    Ok(users
        .iter()
        .map(|u| UserResponse::new(u, effective_tools_with(u, &catalog)))
        .collect())
}
