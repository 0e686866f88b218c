use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Id;

/// Role row. The name is the authorization discriminant; ids differ
/// between environments and are never compared in policy code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Role names the system itself branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnownRole {
    /// Implicitly granted every active tool.
    Superuser,
    Manager,
    User,
    Operator,
    /// Clearance-style tag, formerly labelled `itra`.
    Itar,
}

impl KnownRole {
    pub const ALL: [KnownRole; 5] = [
        KnownRole::Superuser,
        KnownRole::Manager,
        KnownRole::User,
        KnownRole::Operator,
        KnownRole::Itar,
    ];

    /// Database text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            KnownRole::Superuser => "superuser",
            KnownRole::Manager => "manager",
            KnownRole::User => "user",
            KnownRole::Operator => "operator",
            KnownRole::Itar => "itar",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == name)
    }
}

impl std::fmt::Display for KnownRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_name_round_trips_every_known_role() {
        for role in KnownRole::ALL {
            assert_eq!(KnownRole::from_name(role.as_str()), Some(role));
        }
    }

    #[test]
    fn from_name_is_case_sensitive() {
        assert_eq!(KnownRole::from_name("SuperUser"), None);
        assert_eq!(KnownRole::from_name("itra"), None);
    }
}
