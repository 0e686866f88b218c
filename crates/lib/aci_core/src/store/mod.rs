//! Credential store: users, roles, tools and their associations.
//!
//! Two implementations share one contract:
//! [`postgres::PgCredentialStore`] for deployments and
//! [`memory::MemoryCredentialStore`] for tests and local runs.
//!
//! Contract every implementation honours:
//! - usernames and emails are lowercased on every write and lookup;
//! - a username or email that collides with another user is a `Conflict`;
//! - unknown role or tool ids in a write are `NotFound`;
//! - whenever a user's final role set contains `superuser`, its explicit
//!   tool rows are removed in the same atomic write;
//! - deleting a user, role or tool removes its association rows.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Id, Role, Tool, User};

/// Credential store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Fields for a new user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub role_ids: Vec<Id>,
    pub tool_ids: Vec<Id>,
}

/// Partial update of a user. `None` leaves a field untouched; `Some` on
/// `role_ids`/`tool_ids` replaces the whole set.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub is_active: Option<bool>,
    pub role_ids: Option<Vec<Id>>,
    pub tool_ids: Option<Vec<Id>>,
}

#[derive(Debug, Clone)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RoleChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewTool {
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub route: String,
    pub icon: String,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ToolChanges {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub route: Option<String>,
    pub icon: Option<String>,
    pub is_active: Option<bool>,
}

/// Outcome of [`CredentialStore::rename_role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOutcome {
    /// `from` was renamed in place; its id is unchanged.
    Renamed,
    /// Both names existed; memberships moved to `to` and `from` was dropped.
    Merged,
    /// Only `to` exists (or neither): nothing to do.
    Unchanged,
}

/// Persistence boundary for the auth core.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    // Users

    async fn find_user_by_id(&self, id: Id) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self, skip: i64, limit: i64) -> StoreResult<Vec<User>>;
    async fn create_user(&self, new: NewUser) -> StoreResult<User>;
    async fn update_user(&self, id: Id, changes: UserChanges) -> StoreResult<User>;
    /// Swap the password hash only if it still equals `expected`.
    /// Returns `false` when another writer got there first.
    async fn update_password_hash(&self, id: Id, expected: &str, new_hash: &str)
    -> StoreResult<bool>;
    async fn replace_user_roles(&self, id: Id, role_ids: &[Id]) -> StoreResult<User>;
    async fn replace_user_tools(&self, id: Id, tool_ids: &[Id]) -> StoreResult<User>;
    async fn delete_user(&self, id: Id) -> StoreResult<bool>;

    // Roles

    async fn find_role_by_id(&self, id: Id) -> StoreResult<Option<Role>>;
    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>>;
    async fn list_roles(&self) -> StoreResult<Vec<Role>>;
    async fn create_role(&self, new: NewRole) -> StoreResult<Role>;
    async fn update_role(&self, id: Id, changes: RoleChanges) -> StoreResult<Role>;
    async fn delete_role(&self, id: Id) -> StoreResult<bool>;
    async fn rename_role(&self, from: &str, to: &str) -> StoreResult<RenameOutcome>;

    // Tools

    async fn find_tool_by_id(&self, id: Id) -> StoreResult<Option<Tool>>;
    async fn find_tools_by_ids(&self, ids: &[Id]) -> StoreResult<Vec<Tool>>;
    async fn list_tools(&self) -> StoreResult<Vec<Tool>>;
    async fn list_active_tools(&self) -> StoreResult<Vec<Tool>>;
    async fn create_tool(&self, new: NewTool) -> StoreResult<Tool>;
    async fn update_tool(&self, id: Id, changes: ToolChanges) -> StoreResult<Tool>;
    async fn delete_tool(&self, id: Id) -> StoreResult<bool>;
}

/// Deduplicate ids while keeping first-seen order.
pub(crate) fn dedup_ids(ids: &[Id]) -> Vec<Id> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
