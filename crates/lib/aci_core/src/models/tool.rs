use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;

/// A gated internal feature. `name` is the key used for permission checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tool {
    pub id: Id,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub route: String,
    pub icon: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
