//! # aci_api
//!
//! HTTP API library for the ACI Dashboard.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use aci_core::acl::{AccessGuard, Requirement};
use aci_core::auth::{AuthError, Authenticator};
use aci_core::notify::CredentialNotifier;
use aci_core::settings::AuthConfig;
use aci_core::store::CredentialStore;
use axum::Router;
use axum::routing::{get, post, put};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{admin, auth, health, tools, users};
use crate::middleware::auth::{GuardState, require_access};
use crate::middleware::rate_limit::limit_attempts;
use crate::services::rate_limit::LoginRateLimiter;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Users, roles and tools.
    pub store: Arc<dyn CredentialStore>,
    pub auth: Arc<Authenticator>,
    pub guard: AccessGuard,
    /// Receives generated onboarding passwords.
    pub notifier: Arc<dyn CredentialNotifier>,
    pub limiter: Arc<LoginRateLimiter>,
    /// API configuration.
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        auth_config: &AuthConfig,
        store: Arc<dyn CredentialStore>,
        notifier: Arc<dyn CredentialNotifier>,
    ) -> Result<Self, AuthError> {
        let auth = Arc::new(Authenticator::new(auth_config, store.clone())?);
        let guard = AccessGuard::new(store.clone(), auth.codec().clone());
        let limiter = Arc::new(LoginRateLimiter::new(
            config.login_attempts_per_window,
            Duration::from_secs(config.login_window_secs),
        ));
        Ok(Self {
            store,
            auth,
            guard,
            notifier,
            limiter,
            config,
        })
    }
}

/// Run embedded database migrations.
///
/// Delegates to `aci_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    aci_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let guarded = |requirement: Requirement| {
        axum::middleware::from_fn_with_state(
            GuardState::new(state.clone(), requirement),
            require_access,
        )
    };

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_HEALTH, get(health::health_handler))
        .route(routes::POST_AUTH_REFRESH, post(auth::refresh_handler))
        .route(routes::POST_AUTH_LOGOUT, post(auth::logout_handler));

    // Credential-checking routes, throttled per client
    let throttled = Router::new()
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(
            routes::POST_AUTH_RESET_PASSWORD,
            post(auth::reset_password_handler),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            limit_attempts,
        ));

    // Any authenticated, active user
    let authenticated = Router::new()
        .route(routes::GET_USERS_ME, get(users::me_handler))
        .route(routes::GET_USERS_ME_ROLES, get(users::my_roles_handler))
        .route(routes::GET_USERS_ME_TOOLS, get(users::my_tools_handler))
        .route(routes::GET_TOOLS, get(tools::list_tools_handler))
        .route(routes::GET_TOOLS_ID, get(tools::get_tool_handler))
        .layer(guarded(Requirement::Authenticated));

    let compare = Router::new()
        .route(
            routes::GET_TOOLS_COMPARE_ACCESS,
            get(tools::compare_access_handler),
        )
        .layer(guarded(Requirement::tool(routes::COMPARE_TOOL)));

    let admin = Router::new()
        .route(
            routes::ADMIN_USERS,
            get(admin::list_users_handler).post(admin::create_user_handler),
        )
        .route(
            routes::ADMIN_USERS_ID,
            get(admin::get_user_handler)
                .put(admin::update_user_handler)
                .delete(admin::delete_user_handler),
        )
        .route(
            routes::ADMIN_ROLES,
            get(admin::list_roles_handler).post(admin::create_role_handler),
        )
        .route(
            routes::ADMIN_ROLES_ID,
            put(admin::update_role_handler).delete(admin::delete_role_handler),
        )
        .route(
            routes::POST_ADMIN_ROLES_RENAME,
            post(admin::rename_role_handler),
        )
        .route(
            routes::ADMIN_TOOLS,
            get(admin::list_tools_handler).post(admin::create_tool_handler),
        )
        .route(
            routes::ADMIN_TOOLS_ID,
            put(admin::update_tool_handler).delete(admin::delete_tool_handler),
        )
        .layer(guarded(Requirement::superuser()));

    Router::new()
        .merge(public)
        .merge(throttled)
        .merge(authenticated)
        .merge(compare)
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
