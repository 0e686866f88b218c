//! Self-service profile handlers.

use aci_core::acl::effective_tools;
use aci_core::models::{Role, Tool};
use axum::{Extension, Json};
use axum::extract::State;

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::models::UserResponse;
use crate::services::users::user_response;

/// `GET /users/me`
pub async fn me_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(user_response(&state, &user).await?))
}

/// `GET /users/me/roles`
pub async fn my_roles_handler(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<Vec<Role>> {
    Json(user.roles)
}

/// `GET /users/me/tools` — effective tools of the caller.
pub async fn my_tools_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<Json<Vec<Tool>>> {
    Ok(Json(effective_tools(state.store.as_ref(), &user).await?))
}
