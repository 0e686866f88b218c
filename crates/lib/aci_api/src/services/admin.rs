//! Administrative flows: user, role and tool management.

use aci_core::auth::validation::{validate_email, validate_full_name, validate_username};
use aci_core::models::{Id, KnownRole, Role, Tool, User};
use aci_core::store::{
    NewRole, NewTool, NewUser, RenameOutcome, RoleChanges, ToolChanges, UserChanges,
};
use tracing::{info, warn};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{
    CreateRoleRequest, CreateToolRequest, CreateUserRequest, UpdateRoleRequest,
    UpdateToolRequest, UpdateUserRequest,
};

/// Length of passwords generated for new accounts.
pub const GENERATED_PASSWORD_LENGTH: usize = 16;

fn validate_name(kind: &str, name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > 50 {
        return Err(AppError::Validation(format!(
            "{kind} name must be between 1 and 50 characters"
        )));
    }
    Ok(name.to_string())
}

fn validate_route(route: &str) -> AppResult<String> {
    let route = route.trim();
    if !route.starts_with('/') {
        return Err(AppError::Validation("Tool route must start with '/'".into()));
    }
    Ok(route.to_string())
}

fn check_password(state: &AppState, password: &str) -> AppResult<()> {
    state
        .auth
        .policy()
        .check(password)
        .map_err(|v| AppError::Validation(v.to_string()))
}

/// Hand `password` to the notifier on a detached task. Failures are only
/// logged; the account stays created.
fn spawn_notification(state: &AppState, user: &User, password: String) {
    let notifier = state.notifier.clone();
    let user = user.clone();
    tokio::spawn(async move {
        if let Err(e) = notifier.notify_new_credentials(&user, &password).await {
            warn!(username = %user.username, error = %e, "Credential notification failed");
        }
    });
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn create_user(state: &AppState, req: CreateUserRequest) -> AppResult<User> {
    let full_name = validate_full_name(&req.full_name).map_err(AppError::Validation)?;
    validate_username(req.username.trim()).map_err(AppError::Validation)?;
    validate_email(req.email.trim()).map_err(AppError::Validation)?;

    let (password, generated) = match req.password {
        Some(pw) => {
            check_password(state, &pw)?;
            (pw, false)
        }
        None => (
            state.auth.policy().generate(GENERATED_PASSWORD_LENGTH),
            true,
        ),
    };
    let password_hash = state
        .auth
        .hasher()
        .hash(&password)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = state
        .store
        .create_user(NewUser {
            full_name,
            username: req.username,
            email: req.email,
            password_hash,
            is_active: req.is_active,
            role_ids: req.role_ids,
            tool_ids: req.tool_ids,
        })
        .await?;
    info!(username = %user.username, roles = ?user.role_names(), "User created");

    if generated || req.send_email {
        spawn_notification(state, &user, password);
    }
    Ok(user)
}

pub async fn update_user(state: &AppState, id: Id, req: UpdateUserRequest) -> AppResult<User> {
    let full_name = req
        .full_name
        .as_deref()
        .map(validate_full_name)
        .transpose()
        .map_err(AppError::Validation)?;
    if let Some(username) = &req.username {
        validate_username(username.trim()).map_err(AppError::Validation)?;
    }
    if let Some(email) = &req.email {
        validate_email(email.trim()).map_err(AppError::Validation)?;
    }
    let password_hash = match &req.password {
        Some(pw) => {
            check_password(state, pw)?;
            Some(
                state
                    .auth
                    .hasher()
                    .hash(pw)
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()))?,
            )
        }
        None => None,
    };

    let user = state
        .store
        .update_user(
            id,
            UserChanges {
                full_name,
                username: req.username,
                email: req.email,
                password_hash,
                is_active: req.is_active,
                role_ids: req.role_ids,
                tool_ids: req.tool_ids,
            },
        )
        .await?;
    info!(username = %user.username, "User updated");
    Ok(user)
}

pub async fn delete_user(state: &AppState, actor: &User, id: Id) -> AppResult<()> {
    if actor.id == id {
        return Err(AppError::Validation("Cannot delete your own account".into()));
    }
    if !state.store.delete_user(id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    info!(user_id = id, by = %actor.username, "User deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

fn builtin_guard(role: &Role, action: &str) -> AppResult<()> {
    match KnownRole::from_name(&role.name) {
        Some(known) => Err(AppError::Validation(format!(
            "Built-in role '{known}' cannot be {action}"
        ))),
        None => Ok(()),
    }
}

async fn require_role(state: &AppState, id: Id) -> AppResult<Role> {
    state
        .store
        .find_role_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Role not found".into()))
}

pub async fn create_role(state: &AppState, req: CreateRoleRequest) -> AppResult<Role> {
    let name = validate_name("Role", &req.name)?;
    let role = state
        .store
        .create_role(NewRole {
            name,
            description: req.description,
        })
        .await?;
    info!(role = %role.name, "Role created");
    Ok(role)
}

pub async fn update_role(state: &AppState, id: Id, req: UpdateRoleRequest) -> AppResult<Role> {
    let current = require_role(state, id).await?;
    let name = req
        .name
        .as_deref()
        .map(|n| validate_name("Role", n))
        .transpose()?;
    if let Some(name) = &name
        && *name != current.name
    {
        builtin_guard(&current, "renamed")?;
    }

    let role = state
        .store
        .update_role(
            id,
            RoleChanges {
                name,
                description: req.description,
            },
        )
        .await?;
    info!(role = %role.name, "Role updated");
    Ok(role)
}

pub async fn delete_role(state: &AppState, id: Id) -> AppResult<()> {
    let role = require_role(state, id).await?;
    builtin_guard(&role, "deleted")?;
    state.store.delete_role(id).await?;
    info!(role = %role.name, "Role deleted");
    Ok(())
}

/// Rename a role label, merging into an existing `to` role if present.
pub async fn rename_role(state: &AppState, from: &str, to: &str) -> AppResult<RenameOutcome> {
    let from = validate_name("Role", from)?;
    let to = validate_name("Role", to)?;
    if from == to {
        return Err(AppError::Validation("Source and target role names are equal".into()));
    }
    if KnownRole::from_name(&from).is_some() {
        return Err(AppError::Validation(format!(
            "Built-in role '{from}' cannot be renamed"
        )));
    }

    let outcome = state.store.rename_role(&from, &to).await?;
    info!(from = %from, to = %to, ?outcome, "Role rename applied");
    Ok(outcome)
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

pub async fn create_tool(state: &AppState, req: CreateToolRequest) -> AppResult<Tool> {
    let tool = state
        .store
        .create_tool(NewTool {
            name: validate_name("Tool", &req.name)?,
            display_name: validate_name("Tool display", &req.display_name)?,
            description: req.description,
            route: validate_route(&req.route)?,
            icon: req.icon,
            is_active: req.is_active,
        })
        .await?;
    info!(tool = %tool.name, "Tool created");
    Ok(tool)
}

pub async fn update_tool(state: &AppState, id: Id, req: UpdateToolRequest) -> AppResult<Tool> {
    let changes = ToolChanges {
        name: req
            .name
            .as_deref()
            .map(|n| validate_name("Tool", n))
            .transpose()?,
        display_name: req
            .display_name
            .as_deref()
            .map(|n| validate_name("Tool display", n))
            .transpose()?,
        description: req.description,
        route: req.route.as_deref().map(validate_route).transpose()?,
        icon: req.icon,
        is_active: req.is_active,
    };
    let tool = state.store.update_tool(id, changes).await?;
    info!(tool = %tool.name, "Tool updated");
    Ok(tool)
}

pub async fn delete_tool(state: &AppState, id: Id) -> AppResult<()> {
    if !state.store.delete_tool(id).await? {
        return Err(AppError::NotFound("Tool not found".into()));
    }
    info!(tool_id = id, "Tool deleted");
    Ok(())
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

/// Make sure a superuser named `username` exists. Creates it when missing
/// and returns whether it did; an existing account is left untouched.
pub async fn ensure_superuser(
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
) -> AppResult<bool> {
    if state.store.find_user_by_username(username).await?.is_some() {
        return Ok(false);
    }
    let role = state
        .store
        .find_role_by_name(KnownRole::Superuser.as_str())
        .await?
        .ok_or_else(|| AppError::Internal("superuser role is not seeded".into()))?;

    create_user(
        state,
        CreateUserRequest {
            full_name: "Administrator".into(),
            username: username.into(),
            email: email.into(),
            password: Some(password.into()),
            is_active: true,
            role_ids: vec![role.id],
            tool_ids: Vec::new(),
            send_email: false,
        },
    )
    .await?;
    Ok(true)
}
