//! Access guard middleware: Bearer token extraction in front of
//! [`AccessGuard::authorize`](aci_core::acl::AccessGuard::authorize).

use aci_core::acl::Requirement;
use aci_core::models::User;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::AppState;
use crate::error::AppError;

/// The resolved user, stored in request extensions for handlers.
#[derive(Clone)]
pub struct CurrentUser(pub User);

/// Middleware state: the app plus the predicate this route group needs.
#[derive(Clone)]
pub struct GuardState {
    pub app: AppState,
    pub requirement: Requirement,
}

impl GuardState {
    pub fn new(app: AppState, requirement: Requirement) -> Self {
        Self { app, requirement }
    }
}

/// Raw token from `Authorization: Bearer <token>`, if present. The scheme
/// name matches case-insensitively.
pub fn bearer_token(request: &Request) -> Option<&str> {
    let value = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

/// Axum middleware: runs the access guard and injects `CurrentUser` into
/// request extensions.
pub async fn require_access(
    State(guard): State<GuardState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request).map(str::to_owned);
    let user = guard
        .app
        .guard
        .authorize(token.as_deref(), &guard.requirement)
        .await?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
