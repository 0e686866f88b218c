//! Shared fixtures: an in-memory router with bcrypt at its lowest cost.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use aci_api::config::ApiConfig;
use aci_api::{AppState, router};
use aci_core::auth::password::hash_password;
use aci_core::models::{Tool, User};
use aci_core::notify::{CredentialNotifier, LogNotifier};
use aci_core::settings::AuthConfig;
use aci_core::store::memory::MemoryCredentialStore;
use aci_core::store::{CredentialStore, NewTool, NewUser};
use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

pub const PASSWORD: &str = "Str0ng!pass";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryCredentialStore>,
}

pub fn auth_config() -> AuthConfig {
    let mut config = AuthConfig::new("test-access-secret", "test-refresh-secret");
    config.bcrypt_cost = 4;
    config
}

pub fn api_config(login_attempts: u32) -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        database_url: String::new(),
        login_attempts_per_window: login_attempts,
        login_window_secs: 60,
        trusted_proxies: Vec::new(),
    }
}

pub fn app_with(login_attempts: u32, notifier: Arc<dyn CredentialNotifier>) -> TestApp {
    app_with_config(api_config(login_attempts), notifier)
}

pub fn app_with_config(config: ApiConfig, notifier: Arc<dyn CredentialNotifier>) -> TestApp {
    let store = Arc::new(MemoryCredentialStore::new());
    let state = AppState::new(
        config,
        &auth_config(),
        store.clone(),
        notifier,
    )
    .expect("app state");
    TestApp {
        router: router(state.clone()),
        state,
        store,
    }
}

pub fn app() -> TestApp {
    app_with(1000, Arc::new(LogNotifier))
}

impl TestApp {
    /// Failed login from `peer`, optionally carrying an `X-Forwarded-For` chain.
    pub async fn login_attempt_from(&self, peer: &str, forwarded: Option<&str>) -> StatusCode {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .header("content-type", "application/json");
        if let Some(chain) = forwarded {
            builder = builder.header("x-forwarded-for", chain);
        }
        let mut request = builder
            .body(Body::from(
                serde_json::json!({ "username": "alice", "password": "wrong" }).to_string(),
            ))
            .expect("request");
        let addr: SocketAddr = format!("{peer}:40000").parse().expect("peer address");
        request.extensions_mut().insert(ConnectInfo(addr));
        self.send_request(request).await.0
    }

    pub async fn seed_tool(&self, name: &str, active: bool) -> Tool {
        self.store
            .create_tool(NewTool {
                name: name.into(),
                display_name: name.replace('_', " "),
                description: None,
                route: format!("/{name}"),
                icon: "tool".into(),
                is_active: active,
            })
            .await
            .expect("seed tool")
    }

    pub async fn seed_user(&self, username: &str, roles: &[&str], tools: &[&Tool]) -> User {
        let mut role_ids = Vec::new();
        for name in roles {
            let role = self
                .store
                .find_role_by_name(name)
                .await
                .expect("role lookup")
                .expect("seeded role");
            role_ids.push(role.id);
        }
        self.store
            .create_user(NewUser {
                full_name: format!("{username} test"),
                username: username.into(),
                email: format!("{username}@example.com"),
                password_hash: hash_password(PASSWORD, 4).expect("hash"),
                is_active: true,
                role_ids,
                tool_ids: tools.iter().map(|t| t.id).collect(),
            })
            .await
            .expect("seed user")
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty).
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send_request(request).await
    }

    /// Send a prebuilt request and decode the JSON body.
    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    /// Log in and return `(access_token, refresh_token)`.
    pub async fn login(&self, username: &str, password: &str) -> (String, String) {
        let (status, body) = self
            .send(
                Method::POST,
                "/auth/login",
                None,
                Some(serde_json::json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        (
            body["access_token"].as_str().expect("access").to_string(),
            body["refresh_token"].as_str().expect("refresh").to_string(),
        )
    }
}

pub fn tool_names(body: &Value) -> Vec<String> {
    let mut names: Vec<String> = body
        .as_array()
        .expect("array")
        .iter()
        .map(|t| t["name"].as_str().expect("name").to_string())
        .collect();
    names.sort();
    names
}
