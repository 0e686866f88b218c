//! Tool catalog handlers.

use aci_core::acl::{can_use_tool, effective_tools};
use aci_core::models::{Id, Tool};
use axum::{Extension, Json};
use axum::extract::{Path, State};
use tracing::debug;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentUser;
use crate::models::ToolAccessResponse;
use crate::routes::COMPARE_TOOL;

/// `GET /tools` — the caller's effective tools.
pub async fn list_tools_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Tool>>> {
    Ok(Json(effective_tools(state.store.as_ref(), &user).await?))
}

/// `GET /tools/{id}` — 404 for unknown ids, 403 when the caller may not
/// use the tool.
pub async fn get_tool_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> AppResult<Json<Tool>> {
    let tool = state
        .store
        .find_tool_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Tool not found".into()))?;

    if !can_use_tool(&user, &tool.name) {
        debug!(username = %user.username, tool = %tool.name, "Tool access denied");
        return Err(AppError::Forbidden("insufficient permission".into()));
    }
    Ok(Json(tool))
}

/// `GET /tools/compare/access` — reachable only through the
/// `compare_tool` guard.
pub async fn compare_access_handler(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<ToolAccessResponse> {
    Json(ToolAccessResponse {
        tool: COMPARE_TOOL.into(),
        has_access: true,
        username: user.username,
    })
}
