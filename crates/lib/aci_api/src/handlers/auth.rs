//! Authentication request handlers.

use axum::Json;
use axum::extract::State;
use tracing::info;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::AppJson;
use crate::models::{
    AccessTokenResponse, LoginRequest, MessageResponse, RefreshRequest, ResetPasswordRequest,
    TokenResponse,
};
use crate::services::users::user_response;

const TOKEN_TYPE: &str = "bearer";

/// `POST /auth/login` — authenticate with username + password.
pub async fn login_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let user = state.auth.authenticate(&body.username, &body.password).await?;
    let session = state.auth.issue_session(&user)?;
    info!(username = %user.username, "Login succeeded");

    Ok(Json(TokenResponse {
        access_token: session.access_token,
        refresh_token: session.refresh_token,
        token_type: TOKEN_TYPE.into(),
        expires_in: state.auth.codec().access_ttl_secs(),
        user: user_response(&state, &user).await?,
    }))
}

/// `POST /auth/refresh` — exchange a refresh token for a new access token.
pub async fn refresh_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<RefreshRequest>,
) -> AppResult<Json<AccessTokenResponse>> {
    let access_token = state.auth.refresh(&body.refresh_token).await?;
    Ok(Json(AccessTokenResponse {
        access_token,
        token_type: TOKEN_TYPE.into(),
        expires_in: state.auth.codec().access_ttl_secs(),
    }))
}

/// `POST /auth/reset-password` — change a password given the current one.
pub async fn reset_password_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    state
        .auth
        .reset_password(&body.username, &body.current_password, &body.new_password)
        .await?;
    Ok(Json(MessageResponse::new("Password updated successfully")))
}

/// `POST /auth/logout` — tokens are stateless; the client discards them.
pub async fn logout_handler() -> Json<MessageResponse> {
    Json(MessageResponse::new("Successfully logged out"))
}
