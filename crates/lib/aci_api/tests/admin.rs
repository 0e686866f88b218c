//! Superuser management endpoints.

mod common;

use std::sync::Arc;
use std::time::Duration;

use aci_core::models::User;
use aci_core::notify::{CredentialNotifier, NotifyError};
use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use common::{PASSWORD, TestApp, app, app_with, tool_names};
use serde_json::json;
use tokio::sync::mpsc;

/// Forwards every notification to a channel.
struct ChannelNotifier(mpsc::UnboundedSender<(String, String)>);

#[async_trait]
impl CredentialNotifier for ChannelNotifier {
    async fn notify_new_credentials(
        &self,
        user: &User,
        plaintext_password: &str,
    ) -> Result<(), NotifyError> {
        self.0
            .send((user.username.clone(), plaintext_password.to_string()))
            .map_err(|e| NotifyError::Delivery(e.to_string()))
    }
}

async fn admin_token(app: &TestApp) -> String {
    app.seed_user("root", &["superuser"], &[]).await;
    app.login("root", PASSWORD).await.0
}

async fn role_id(app: &TestApp, name: &str) -> i64 {
    use aci_core::store::CredentialStore;
    app.store.find_role_by_name(name).await.unwrap().unwrap().id
}

#[tokio::test]
async fn non_superusers_cannot_reach_admin_routes() {
    let app = app();
    app.seed_user("carol", &["manager"], &[]).await;
    let (token, _) = app.login("carol", PASSWORD).await;

    let (status, body) = app.get("/admin/users", &token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "insufficient permission");

    let (status, _) = app.send(Method::GET, "/admin/roles", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_user_then_login() {
    let app = app();
    let token = admin_token(&app).await;
    let compare = app.seed_tool("compare_tool", true).await;
    let user_role = role_id(&app, "user").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/admin/users",
            Some(&token),
            Some(json!({
                "full_name": "  Dana Scully ",
                "username": "DScully",
                "email": "Dana@Example.com",
                "password": "Tru7h!sOut",
                "role_ids": [user_role],
                "tool_ids": [compare.id],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["username"], "dscully");
    assert_eq!(body["email"], "dana@example.com");
    assert_eq!(body["full_name"], "Dana Scully");
    assert_eq!(tool_names(&body["tools"]), vec!["compare_tool"]);

    app.login("dscully", "Tru7h!sOut").await;
}

#[tokio::test]
async fn create_user_validates_input() {
    let app = app();
    let token = admin_token(&app).await;

    for (payload, fragment) in [
        (
            json!({ "full_name": "X", "username": "ab", "email": "x@example.com", "password": "Str0ng!pass" }),
            "between 3 and 50",
        ),
        (
            json!({ "full_name": "X", "username": "bad name", "email": "x@example.com", "password": "Str0ng!pass" }),
            "letters, numbers, and underscores",
        ),
        (
            json!({ "full_name": "X", "username": "xavier", "email": "not-an-email", "password": "Str0ng!pass" }),
            "Email",
        ),
        (
            json!({ "full_name": "   ", "username": "xavier", "email": "x@example.com", "password": "Str0ng!pass" }),
            "Full name",
        ),
        (
            json!({ "full_name": "X", "username": "xavier", "email": "x@example.com", "password": "nouppercase1!" }),
            "uppercase",
        ),
    ] {
        let (status, body) = app
            .send(Method::POST, "/admin/users", Some(&token), Some(payload))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["message"].as_str().unwrap();
        assert!(message.contains(fragment), "{message} lacks {fragment}");
    }
}

#[tokio::test]
async fn duplicate_username_or_email_conflicts() {
    let app = app();
    let token = admin_token(&app).await;
    app.seed_user("alice", &["user"], &[]).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/admin/users",
            Some(&token),
            Some(json!({
                "full_name": "Alice Two",
                "username": "ALICE",
                "email": "alice2@example.com",
                "password": PASSWORD,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = app
        .send(
            Method::POST,
            "/admin/users",
            Some(&token),
            Some(json!({
                "full_name": "Alice Two",
                "username": "alice2",
                "email": "ALICE@example.com",
                "password": PASSWORD,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn generated_password_goes_to_the_notifier_only() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let app = app_with(1000, Arc::new(ChannelNotifier(tx)));
    let token = admin_token(&app).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/admin/users",
            Some(&token),
            Some(json!({
                "full_name": "Fox Mulder",
                "username": "fmulder",
                "email": "fox@example.com",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(!body.to_string().contains("password"));

    let (username, password) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("notification in time")
        .expect("notification sent");
    assert_eq!(username, "fmulder");
    assert!(app.state.auth.policy().check(&password).is_ok());
    app.login("fmulder", &password).await;
}

#[tokio::test]
async fn promotion_clears_tools_and_demotion_keeps_them_cleared() {
    let app = app();
    let token = admin_token(&app).await;
    let compare = app.seed_tool("compare_tool", true).await;
    app.seed_tool("other_tool", true).await;
    let user = app.seed_user("erin", &["user"], &[&compare]).await;
    let user_role = role_id(&app, "user").await;
    let super_role = role_id(&app, "superuser").await;

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/admin/users/{}", user.id),
            Some(&token),
            Some(json!({ "role_ids": [user_role, super_role] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tool_names(&body["tools"]), vec!["compare_tool", "other_tool"]);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/admin/users/{}", user.id),
            Some(&token),
            Some(json!({ "role_ids": [user_role] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(tool_names(&body["tools"]).is_empty());
}

#[tokio::test]
async fn deactivated_user_is_locked_out_on_next_request() {
    let app = app();
    let token = admin_token(&app).await;
    let user = app.seed_user("frank", &["user"], &[]).await;
    let (frank, _) = app.login("frank", PASSWORD).await;

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/admin/users/{}", user.id),
            Some(&token),
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get("/users/me", &frank).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "inactive or unknown user");
}

#[tokio::test]
async fn admin_cannot_delete_self_but_can_delete_others() {
    let app = app();
    let token = admin_token(&app).await;
    let (_, me) = app.get("/users/me", &token).await;
    let my_id = me["id"].as_i64().unwrap();
    let other = app.seed_user("gina", &["user"], &[]).await;

    let (status, body) = app
        .send(Method::DELETE, &format!("/admin/users/{my_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Cannot delete your own account");

    let (status, _) = app
        .send(Method::DELETE, &format!("/admin/users/{}", other.id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .get(&format!("/admin/users/{}", other.id), &token)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_users_paginates() {
    let app = app();
    let token = admin_token(&app).await;
    for name in ["user_a", "user_b", "user_c"] {
        app.seed_user(name, &["user"], &[]).await;
    }

    let (status, body) = app.get("/admin/users?skip=1&limit=2", &token).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["username"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["user_a", "user_b"]);
}

#[tokio::test]
async fn role_management() {
    let app = app();
    let token = admin_token(&app).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/admin/roles",
            Some(&token),
            Some(json!({ "name": "itra", "description": "legacy label" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let legacy_id = body["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            Method::POST,
            "/admin/roles",
            Some(&token),
            Some(json!({ "name": "itra" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Both labels exist: memberships merge into `itar`.
    let (status, body) = app
        .send(
            Method::POST,
            "/admin/roles/rename",
            Some(&token),
            Some(json!({ "from": "itra", "to": "itar" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "merged");

    let (status, body) = app
        .send(
            Method::POST,
            "/admin/roles/rename",
            Some(&token),
            Some(json!({ "from": "itra", "to": "itar" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "unchanged");

    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/admin/roles/{legacy_id}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let superuser = role_id(&app, "superuser").await;
    let (status, _) = app
        .send(
            Method::DELETE,
            &format!("/admin/roles/{superuser}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app.get("/admin/roles", &token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn tool_management() {
    let app = app();
    let token = admin_token(&app).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/admin/tools",
            Some(&token),
            Some(json!({
                "name": "compare_tool",
                "display_name": "Compare",
                "route": "/compare",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["icon"], "tool");
    assert_eq!(body["is_active"], true);
    let id = body["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            Method::POST,
            "/admin/tools",
            Some(&token),
            Some(json!({ "name": "bad", "display_name": "Bad", "route": "no-slash" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/admin/tools/{id}"),
            Some(&token),
            Some(json!({ "is_active": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);

    // Inactive tools drop out of the superuser's effective set but stay
    // in the admin catalog.
    let (_, body) = app.get("/tools", &token).await;
    assert!(tool_names(&body).is_empty());
    let (_, body) = app.get("/admin/tools", &token).await;
    assert_eq!(tool_names(&body), vec!["compare_tool"]);

    let (status, _) = app
        .send(Method::DELETE, &format!("/admin/tools/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .send(Method::DELETE, &format!("/admin/tools/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ensure_superuser_is_idempotent() {
    let app = app();
    let created =
        aci_api::services::admin::ensure_superuser(&app.state, "admin", "admin@example.com", PASSWORD)
            .await
            .unwrap();
    assert!(created);
    let again =
        aci_api::services::admin::ensure_superuser(&app.state, "ADMIN", "admin@example.com", PASSWORD)
            .await
            .unwrap();
    assert!(!again);

    let (token, _) = app.login("admin", PASSWORD).await;
    let (status, _) = app.get("/admin/roles", &token).await;
    assert_eq!(status, StatusCode::OK);
}
