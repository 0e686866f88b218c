use chrono::{DateTime, Utc};

use super::{Id, Role, Tool};

/// Domain user with its role and tool associations loaded.
///
/// Not `Serialize`: the password hash must never reach a
/// response body. API layers map into their own response types.
#[derive(Clone)]
pub struct User {
    pub id: Id,
    pub full_name: String,
    /// Always lowercase.
    pub username: String,
    /// Always lowercase.
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub roles: Vec<Role>,
    /// Explicit assignments only. See `acl::effective_tools` for what the
    /// user may actually use.
    pub tools: Vec<Tool>,
}

impl User {
    /// Assigned role names, in store order.
    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(|r| r.name.as_str()).collect()
    }
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("full_name", &self.full_name)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("is_active", &self.is_active)
            .field("created_at", &self.created_at)
            .field("roles", &self.role_names())
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
