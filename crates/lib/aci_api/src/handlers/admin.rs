//! Superuser-only management handlers.

use aci_core::models::{Id, Role, Tool};
use aci_core::store::RenameOutcome;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::extract::AppJson;
use crate::middleware::auth::CurrentUser;
use crate::models::{
    CreateRoleRequest, CreateToolRequest, CreateUserRequest, ListUsersQuery, RenameRoleRequest,
    RenameRoleResponse, UpdateRoleRequest, UpdateToolRequest, UpdateUserRequest, UserResponse,
};
use crate::services::admin;
use crate::services::users::{user_response, user_responses};

const DEFAULT_PAGE_SIZE: i64 = 100;
const MAX_PAGE_SIZE: i64 = 1000;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// `GET /admin/users?skip=&limit=`
pub async fn list_users_handler(
    State(state): State<AppState>,
    Query(q): Query<ListUsersQuery>,
) -> AppResult<Json<Vec<UserResponse>>> {
    let skip = q.skip.unwrap_or(0).max(0);
    let limit = q.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(0, MAX_PAGE_SIZE);
    let users = state.store.list_users(skip, limit).await?;
    Ok(Json(user_responses(&state, &users).await?))
}

/// `POST /admin/users`
pub async fn create_user_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = admin::create_user(&state, body).await?;
    Ok((StatusCode::CREATED, Json(user_response(&state, &user).await?)))
}

/// `GET /admin/users/{id}`
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> AppResult<Json<UserResponse>> {
    let user = state
        .store
        .find_user_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(Json(user_response(&state, &user).await?))
}

/// `PUT /admin/users/{id}`
pub async fn update_user_handler(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    AppJson(body): AppJson<UpdateUserRequest>,
) -> AppResult<Json<UserResponse>> {
    let user = admin::update_user(&state, id, body).await?;
    Ok(Json(user_response(&state, &user).await?))
}

/// `DELETE /admin/users/{id}`
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(actor)): Extension<CurrentUser>,
    Path(id): Path<Id>,
) -> AppResult<StatusCode> {
    admin::delete_user(&state, &actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// `GET /admin/roles`
pub async fn list_roles_handler(State(state): State<AppState>) -> AppResult<Json<Vec<Role>>> {
    Ok(Json(state.store.list_roles().await?))
}

/// `POST /admin/roles`
pub async fn create_role_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateRoleRequest>,
) -> AppResult<(StatusCode, Json<Role>)> {
    Ok((StatusCode::CREATED, Json(admin::create_role(&state, body).await?)))
}

/// `PUT /admin/roles/{id}`
pub async fn update_role_handler(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    AppJson(body): AppJson<UpdateRoleRequest>,
) -> AppResult<Json<Role>> {
    Ok(Json(admin::update_role(&state, id, body).await?))
}

/// `DELETE /admin/roles/{id}`
pub async fn delete_role_handler(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> AppResult<StatusCode> {
    admin::delete_role(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /admin/roles/rename`
pub async fn rename_role_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<RenameRoleRequest>,
) -> AppResult<Json<RenameRoleResponse>> {
    let outcome = admin::rename_role(&state, &body.from, &body.to).await?;
    let outcome = match outcome {
        RenameOutcome::Renamed => "renamed",
        RenameOutcome::Merged => "merged",
        RenameOutcome::Unchanged => "unchanged",
    };
    Ok(Json(RenameRoleResponse {
        outcome: outcome.into(),
    }))
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// `GET /admin/tools` — the whole catalog, inactive tools included.
pub async fn list_tools_handler(State(state): State<AppState>) -> AppResult<Json<Vec<Tool>>> {
    Ok(Json(state.store.list_tools().await?))
}

/// `POST /admin/tools`
pub async fn create_tool_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<CreateToolRequest>,
) -> AppResult<(StatusCode, Json<Tool>)> {
    Ok((StatusCode::CREATED, Json(admin::create_tool(&state, body).await?)))
}

/// `PUT /admin/tools/{id}`
pub async fn update_tool_handler(
    State(state): State<AppState>,
    Path(id): Path<Id>,
    AppJson(body): AppJson<UpdateToolRequest>,
) -> AppResult<Json<Tool>> {
    Ok(Json(admin::update_tool(&state, id, body).await?))
}

/// `DELETE /admin/tools/{id}`
pub async fn delete_tool_handler(
    State(state): State<AppState>,
    Path(id): Path<Id>,
) -> AppResult<StatusCode> {
    admin::delete_tool(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
