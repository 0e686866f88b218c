//! In-memory credential store.
//!
//! Every write holds the state lock for its whole duration, which makes
//! each trait call atomic the same way a Postgres transaction does.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    CredentialStore, NewRole, NewTool, NewUser, RenameOutcome, RoleChanges, StoreError,
    StoreResult, ToolChanges, UserChanges, dedup_ids,
};
use crate::auth::validation::normalize;
use crate::models::{Id, KnownRole, Role, Tool, User};

#[derive(Debug, Clone)]
struct UserRow {
    id: Id,
    full_name: String,
    username: String,
    email: String,
    password_hash: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    next_id: Id,
    users: BTreeMap<Id, UserRow>,
    roles: BTreeMap<Id, Role>,
    tools: BTreeMap<Id, Tool>,
    user_roles: BTreeSet<(Id, Id)>,
    user_tools: BTreeSet<(Id, Id)>,
}

impl State {
    fn next_id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    fn load_user(&self, row: &UserRow) -> User {
        let roles = self
            .user_roles
            .iter()
            .filter(|(uid, _)| *uid == row.id)
            .filter_map(|(_, rid)| self.roles.get(rid).cloned())
            .collect();
        let tools = self
            .user_tools
            .iter()
            .filter(|(uid, _)| *uid == row.id)
            .filter_map(|(_, tid)| self.tools.get(tid).cloned())
            .collect();
        User {
            id: row.id,
            full_name: row.full_name.clone(),
            username: row.username.clone(),
            email: row.email.clone(),
            password_hash: row.password_hash.clone(),
            is_active: row.is_active,
            created_at: row.created_at,
            roles,
            tools,
        }
    }

    fn user(&self, id: Id) -> StoreResult<User> {
        self.users
            .get(&id)
            .map(|row| self.load_user(row))
            .ok_or_else(|| StoreError::NotFound("User".into()))
    }

    fn username_taken(&self, username: &str, except: Option<Id>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<Id>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn check_roles_exist(&self, ids: &[Id]) -> StoreResult<()> {
        match ids.iter().find(|id| !self.roles.contains_key(id)) {
            Some(id) => Err(StoreError::NotFound(format!("Role {id}"))),
            None => Ok(()),
        }
    }

    fn check_tools_exist(&self, ids: &[Id]) -> StoreResult<()> {
        match ids.iter().find(|id| !self.tools.contains_key(id)) {
            Some(id) => Err(StoreError::NotFound(format!("Tool {id}"))),
            None => Ok(()),
        }
    }

    fn is_superuser(&self, user_id: Id) -> bool {
        self.user_roles.iter().any(|(uid, rid)| {
            *uid == user_id
                && self
                    .roles
                    .get(rid)
                    .is_some_and(|r| r.name == KnownRole::Superuser.as_str())
        })
    }

    fn set_roles(&mut self, user_id: Id, role_ids: &[Id]) {
        self.user_roles.retain(|(uid, _)| *uid != user_id);
        self.user_roles
            .extend(role_ids.iter().map(|rid| (user_id, *rid)));
    }

    fn set_tools(&mut self, user_id: Id, tool_ids: &[Id]) {
        self.user_tools.retain(|(uid, _)| *uid != user_id);
        self.user_tools
            .extend(tool_ids.iter().map(|tid| (user_id, *tid)));
    }

    /// Superusers hold no explicit tool rows.
    fn clear_tools_if_superuser(&mut self, user_id: Id) {
        if self.is_superuser(user_id) {
            self.user_tools.retain(|(uid, _)| *uid != user_id);
        }
    }

    fn role_name_taken(&self, name: &str, except: Option<Id>) -> bool {
        self.roles
            .values()
            .any(|r| r.name == name && Some(r.id) != except)
    }

    fn tool_name_taken(&self, name: &str, except: Option<Id>) -> bool {
        self.tools
            .values()
            .any(|t| t.name == name && Some(t.id) != except)
    }
}

/// Credential store held entirely in process memory.
#[derive(Debug)]
pub struct MemoryCredentialStore {
    state: RwLock<State>,
}

impl MemoryCredentialStore {
    /// New store seeded with the built-in role names.
    pub fn new() -> Self {
        let mut state = State::default();
        for role in KnownRole::ALL {
            let id = state.next_id();
            state.roles.insert(
                id,
                Role {
                    id,
                    name: role.as_str().to_string(),
                    description: None,
                    created_at: Utc::now(),
                },
            );
        }
        Self {
            state: RwLock::new(state),
        }
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_user_by_id(&self, id: Id) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).map(|row| state.load_user(row)))
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let username = normalize(username);
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .map(|row| state.load_user(row)))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize(email);
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.email == email)
            .map(|row| state.load_user(row)))
    }

    async fn list_users(&self, skip: i64, limit: i64) -> StoreResult<Vec<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .skip(skip.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|row| state.load_user(row))
            .collect())
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let username = normalize(&new.username);
        let email = normalize(&new.email);
        let role_ids = dedup_ids(&new.role_ids);
        let tool_ids = dedup_ids(&new.tool_ids);

        let mut state = self.state.write().await;
        if state.username_taken(&username, None) {
            return Err(StoreError::Conflict("Username already registered".into()));
        }
        if state.email_taken(&email, None) {
            return Err(StoreError::Conflict("Email already registered".into()));
        }
        state.check_roles_exist(&role_ids)?;
        state.check_tools_exist(&tool_ids)?;

        let id = state.next_id();
        state.users.insert(
            id,
            UserRow {
                id,
                full_name: new.full_name,
                username,
                email,
                password_hash: new.password_hash,
                is_active: new.is_active,
                created_at: Utc::now(),
            },
        );
        state.set_roles(id, &role_ids);
        state.set_tools(id, &tool_ids);
        state.clear_tools_if_superuser(id);
        state.user(id)
    }

    async fn update_user(&self, id: Id, changes: UserChanges) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&id) {
            return Err(StoreError::NotFound("User".into()));
        }

        let username = changes.username.as_deref().map(normalize);
        let email = changes.email.as_deref().map(normalize);
        if let Some(u) = &username
            && state.username_taken(u, Some(id))
        {
            return Err(StoreError::Conflict("Username already taken".into()));
        }
        if let Some(e) = &email
            && state.email_taken(e, Some(id))
        {
            return Err(StoreError::Conflict("Email already taken".into()));
        }
        let role_ids = changes.role_ids.as_deref().map(dedup_ids);
        let tool_ids = changes.tool_ids.as_deref().map(dedup_ids);
        if let Some(ids) = &role_ids {
            state.check_roles_exist(ids)?;
        }
        if let Some(ids) = &tool_ids {
            state.check_tools_exist(ids)?;
        }

        if let Some(row) = state.users.get_mut(&id) {
            if let Some(v) = changes.full_name {
                row.full_name = v;
            }
            if let Some(v) = username {
                row.username = v;
            }
            if let Some(v) = email {
                row.email = v;
            }
            if let Some(v) = changes.password_hash {
                row.password_hash = v;
            }
            if let Some(v) = changes.is_active {
                row.is_active = v;
            }
        }
        if let Some(ids) = &role_ids {
            state.set_roles(id, ids);
        }
        if let Some(ids) = &tool_ids {
            state.set_tools(id, ids);
        }
        state.clear_tools_if_superuser(id);
        state.user(id)
    }

    async fn update_password_hash(
        &self,
        id: Id,
        expected: &str,
        new_hash: &str,
    ) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        match state.users.get_mut(&id) {
            Some(row) if row.password_hash == expected => {
                row.password_hash = new_hash.to_string();
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound("User".into())),
        }
    }

    async fn replace_user_roles(&self, id: Id, role_ids: &[Id]) -> StoreResult<User> {
        self.update_user(
            id,
            UserChanges {
                role_ids: Some(role_ids.to_vec()),
                ..UserChanges::default()
            },
        )
        .await
    }

    async fn replace_user_tools(&self, id: Id, tool_ids: &[Id]) -> StoreResult<User> {
        self.update_user(
            id,
            UserChanges {
                tool_ids: Some(tool_ids.to_vec()),
                ..UserChanges::default()
            },
        )
        .await
    }

    async fn delete_user(&self, id: Id) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }
        state.user_roles.retain(|(uid, _)| *uid != id);
        state.user_tools.retain(|(uid, _)| *uid != id);
        Ok(true)
    }

    async fn find_role_by_id(&self, id: Id) -> StoreResult<Option<Role>> {
        Ok(self.state.read().await.roles.get(&id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        Ok(self
            .state
            .read()
            .await
            .roles
            .values()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        Ok(self.state.read().await.roles.values().cloned().collect())
    }

    async fn create_role(&self, new: NewRole) -> StoreResult<Role> {
        let mut state = self.state.write().await;
        if state.role_name_taken(&new.name, None) {
            return Err(StoreError::Conflict("Role name already exists".into()));
        }
        let id = state.next_id();
        let role = Role {
            id,
            name: new.name,
            description: new.description,
            created_at: Utc::now(),
        };
        state.roles.insert(id, role.clone());
        Ok(role)
    }

    async fn update_role(&self, id: Id, changes: RoleChanges) -> StoreResult<Role> {
        let mut state = self.state.write().await;
        if let Some(name) = &changes.name
            && state.role_name_taken(name, Some(id))
        {
            return Err(StoreError::Conflict("Role name already exists".into()));
        }
        let role = state
            .roles
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Role".into()))?;
        if let Some(v) = changes.name {
            role.name = v;
        }
        if let Some(v) = changes.description {
            role.description = Some(v);
        }
        let role = role.clone();

        // A rename onto `superuser` promotes every holder.
        let holders: Vec<Id> = state
            .user_roles
            .iter()
            .filter(|(_, rid)| *rid == id)
            .map(|(uid, _)| *uid)
            .collect();
        for uid in holders {
            state.clear_tools_if_superuser(uid);
        }
        Ok(role)
    }

    async fn delete_role(&self, id: Id) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.roles.remove(&id).is_none() {
            return Ok(false);
        }
        state.user_roles.retain(|(_, rid)| *rid != id);
        Ok(true)
    }

    async fn rename_role(&self, from: &str, to: &str) -> StoreResult<RenameOutcome> {
        let mut state = self.state.write().await;
        let from_id = state.roles.values().find(|r| r.name == from).map(|r| r.id);
        let to_id = state.roles.values().find(|r| r.name == to).map(|r| r.id);

        let (outcome, affected) = match (from_id, to_id) {
            (Some(fid), None) => {
                if let Some(role) = state.roles.get_mut(&fid) {
                    role.name = to.to_string();
                }
                (RenameOutcome::Renamed, fid)
            }
            (Some(fid), Some(tid)) => {
                let holders: Vec<Id> = state
                    .user_roles
                    .iter()
                    .filter(|(_, rid)| *rid == fid)
                    .map(|(uid, _)| *uid)
                    .collect();
                state.user_roles.retain(|(_, rid)| *rid != fid);
                state
                    .user_roles
                    .extend(holders.into_iter().map(|uid| (uid, tid)));
                state.roles.remove(&fid);
                (RenameOutcome::Merged, tid)
            }
            (None, _) => return Ok(RenameOutcome::Unchanged),
        };

        let holders: Vec<Id> = state
            .user_roles
            .iter()
            .filter(|(_, rid)| *rid == affected)
            .map(|(uid, _)| *uid)
            .collect();
        for uid in holders {
            state.clear_tools_if_superuser(uid);
        }
        Ok(outcome)
    }

    async fn find_tool_by_id(&self, id: Id) -> StoreResult<Option<Tool>> {
        Ok(self.state.read().await.tools.get(&id).cloned())
    }

    async fn find_tools_by_ids(&self, ids: &[Id]) -> StoreResult<Vec<Tool>> {
        let state = self.state.read().await;
        let wanted: BTreeSet<Id> = ids.iter().copied().collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| state.tools.get(&id).cloned())
            .collect())
    }

    async fn list_tools(&self) -> StoreResult<Vec<Tool>> {
        Ok(self.state.read().await.tools.values().cloned().collect())
    }

    async fn list_active_tools(&self) -> StoreResult<Vec<Tool>> {
        Ok(self
            .state
            .read()
            .await
            .tools
            .values()
            .filter(|t| t.is_active)
            .cloned()
            .collect())
    }

    async fn create_tool(&self, new: NewTool) -> StoreResult<Tool> {
        let mut state = self.state.write().await;
        if state.tool_name_taken(&new.name, None) {
            return Err(StoreError::Conflict("Tool name already exists".into()));
        }
        let id = state.next_id();
        let tool = Tool {
            id,
            name: new.name,
            display_name: new.display_name,
            description: new.description,
            route: new.route,
            icon: new.icon,
            is_active: new.is_active,
            created_at: Utc::now(),
        };
        state.tools.insert(id, tool.clone());
        Ok(tool)
    }

    async fn update_tool(&self, id: Id, changes: ToolChanges) -> StoreResult<Tool> {
        let mut state = self.state.write().await;
        if let Some(name) = &changes.name
            && state.tool_name_taken(name, Some(id))
        {
            return Err(StoreError::Conflict("Tool name already exists".into()));
        }
        let tool = state
            .tools
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Tool".into()))?;
        if let Some(v) = changes.name {
            tool.name = v;
        }
        if let Some(v) = changes.display_name {
            tool.display_name = v;
        }
        if let Some(v) = changes.description {
            tool.description = Some(v);
        }
        if let Some(v) = changes.route {
            tool.route = v;
        }
        if let Some(v) = changes.icon {
            tool.icon = v;
        }
        if let Some(v) = changes.is_active {
            tool.is_active = v;
        }
        Ok(tool.clone())
    }

    async fn delete_tool(&self, id: Id) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.tools.remove(&id).is_none() {
            return Ok(false);
        }
        state.user_tools.retain(|(_, tid)| *tid != id);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            full_name: "Test User".into(),
            username: username.into(),
            email: email.into(),
            password_hash: "hash".into(),
            is_active: true,
            role_ids: vec![],
            tool_ids: vec![],
        }
    }

    fn new_tool(name: &str, active: bool) -> NewTool {
        NewTool {
            name: name.into(),
            display_name: name.into(),
            description: None,
            route: format!("/{name}"),
            icon: "tool".into(),
            is_active: active,
        }
    }

    async fn role_id(store: &MemoryCredentialStore, name: &str) -> Id {
        store.find_role_by_name(name).await.unwrap().unwrap().id
    }

    #[tokio::test]
    async fn seeds_known_roles() {
        let store = MemoryCredentialStore::new();
        let names: Vec<String> = store
            .list_roles()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["superuser", "manager", "user", "operator", "itar"]);
    }

    #[tokio::test]
    async fn usernames_and_emails_are_normalized() {
        let store = MemoryCredentialStore::new();
        let user = store
            .create_user(new_user("Alice", "Alice@Example.com"))
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert!(store.find_user_by_username("ALICE").await.unwrap().is_some());
        assert!(store
            .find_user_by_email("ALICE@example.COM")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn case_insensitive_collisions_conflict() {
        let store = MemoryCredentialStore::new();
        store
            .create_user(new_user("alice", "alice@example.com"))
            .await
            .unwrap();

        let err = store
            .create_user(new_user("ALICE", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let err = store
            .create_user(new_user("alice2", "ALICE@EXAMPLE.COM"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn update_uniqueness_excludes_self() {
        let store = MemoryCredentialStore::new();
        let alice = store
            .create_user(new_user("alice", "alice@example.com"))
            .await
            .unwrap();
        let bob = store
            .create_user(new_user("bob", "bob@example.com"))
            .await
            .unwrap();

        // Re-saving one's own username is fine.
        store
            .update_user(
                alice.id,
                UserChanges {
                    username: Some("Alice".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let err = store
            .update_user(
                bob.id,
                UserChanges {
                    email: Some("alice@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn unknown_role_or_tool_id_is_not_found() {
        let store = MemoryCredentialStore::new();
        let mut user = new_user("alice", "alice@example.com");
        user.role_ids = vec![999];
        assert!(matches!(
            store.create_user(user).await.unwrap_err(),
            StoreError::NotFound(_)
        ));

        let mut user = new_user("alice", "alice@example.com");
        user.tool_ids = vec![999];
        assert!(matches!(
            store.create_user(user).await.unwrap_err(),
            StoreError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn superuser_created_with_tools_keeps_none() {
        let store = MemoryCredentialStore::new();
        let tool = store.create_tool(new_tool("compare_tool", true)).await.unwrap();
        let mut user = new_user("root", "root@example.com");
        user.role_ids = vec![role_id(&store, "superuser").await];
        user.tool_ids = vec![tool.id];

        let created = store.create_user(user).await.unwrap();
        assert!(created.tools.is_empty());
    }

    #[tokio::test]
    async fn promotion_clears_tools_and_demotion_does_not_restore_them() {
        let store = MemoryCredentialStore::new();
        let tool = store.create_tool(new_tool("compare_tool", true)).await.unwrap();
        let user_role = role_id(&store, "user").await;
        let super_role = role_id(&store, "superuser").await;

        let mut new = new_user("carol", "carol@example.com");
        new.role_ids = vec![user_role];
        new.tool_ids = vec![tool.id];
        let carol = store.create_user(new).await.unwrap();
        assert_eq!(carol.tools.len(), 1);

        let promoted = store
            .replace_user_roles(carol.id, &[user_role, super_role])
            .await
            .unwrap();
        assert!(promoted.tools.is_empty());

        let demoted = store
            .replace_user_roles(carol.id, &[user_role])
            .await
            .unwrap();
        assert!(demoted.tools.is_empty());
    }

    #[tokio::test]
    async fn replacing_tools_on_a_superuser_stores_nothing() {
        let store = MemoryCredentialStore::new();
        let tool = store.create_tool(new_tool("compare_tool", true)).await.unwrap();
        let mut new = new_user("root", "root@example.com");
        new.role_ids = vec![role_id(&store, "superuser").await];
        let root = store.create_user(new).await.unwrap();

        let updated = store.replace_user_tools(root.id, &[tool.id]).await.unwrap();
        assert!(updated.tools.is_empty());
    }

    #[tokio::test]
    async fn deletes_cascade_to_associations() {
        let store = MemoryCredentialStore::new();
        let tool = store.create_tool(new_tool("compare_tool", true)).await.unwrap();
        let user_role = role_id(&store, "user").await;
        let mut new = new_user("dave", "dave@example.com");
        new.role_ids = vec![user_role];
        new.tool_ids = vec![tool.id];
        let dave = store.create_user(new).await.unwrap();

        assert!(store.delete_tool(tool.id).await.unwrap());
        let dave = store.find_user_by_id(dave.id).await.unwrap().unwrap();
        assert!(dave.tools.is_empty());

        assert!(store.delete_role(user_role).await.unwrap());
        let dave = store.find_user_by_id(dave.id).await.unwrap().unwrap();
        assert!(dave.roles.is_empty());

        assert!(store.delete_user(dave.id).await.unwrap());
        assert!(!store.delete_user(dave.id).await.unwrap());
        assert!(store.find_user_by_username("dave").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn password_swap_requires_expected_hash() {
        let store = MemoryCredentialStore::new();
        let user = store
            .create_user(new_user("erin", "erin@example.com"))
            .await
            .unwrap();
        assert!(!store.update_password_hash(user.id, "stale", "new").await.unwrap());
        assert!(store.update_password_hash(user.id, "hash", "new").await.unwrap());
        let user = store.find_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.password_hash, "new");
    }

    #[tokio::test]
    async fn rename_role_is_idempotent_and_keeps_ids() {
        let store = MemoryCredentialStore::new();
        let itar = store.find_role_by_name("itar").await.unwrap().unwrap();
        store.delete_role(itar.id).await.unwrap();
        let legacy = store
            .create_role(NewRole {
                name: "itra".into(),
                description: None,
            })
            .await
            .unwrap();

        assert_eq!(
            store.rename_role("itra", "itar").await.unwrap(),
            RenameOutcome::Renamed
        );
        let renamed = store.find_role_by_name("itar").await.unwrap().unwrap();
        assert_eq!(renamed.id, legacy.id);

        assert_eq!(
            store.rename_role("itra", "itar").await.unwrap(),
            RenameOutcome::Unchanged
        );
    }

    #[tokio::test]
    async fn rename_role_merges_memberships_when_both_exist() {
        let store = MemoryCredentialStore::new();
        let legacy = store
            .create_role(NewRole {
                name: "itra".into(),
                description: None,
            })
            .await
            .unwrap();
        let mut new = new_user("frank", "frank@example.com");
        new.role_ids = vec![legacy.id];
        let frank = store.create_user(new).await.unwrap();

        assert_eq!(
            store.rename_role("itra", "itar").await.unwrap(),
            RenameOutcome::Merged
        );
        assert!(store.find_role_by_name("itra").await.unwrap().is_none());
        let frank = store.find_user_by_id(frank.id).await.unwrap().unwrap();
        assert_eq!(frank.role_names(), vec!["itar"]);
    }

    #[tokio::test]
    async fn list_active_tools_skips_inactive() {
        let store = MemoryCredentialStore::new();
        store.create_tool(new_tool("compare_tool", true)).await.unwrap();
        store.create_tool(new_tool("retired_tool", false)).await.unwrap();
        let names: Vec<String> = store
            .list_active_tools()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["compare_tool"]);
    }

    #[tokio::test]
    async fn duplicate_tool_name_conflicts() {
        let store = MemoryCredentialStore::new();
        store.create_tool(new_tool("compare_tool", true)).await.unwrap();
        assert!(matches!(
            store.create_tool(new_tool("compare_tool", true)).await.unwrap_err(),
            StoreError::Conflict(_)
        ));
    }
}
