//! Postgres-backed credential store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use super::{
    CredentialStore, NewRole, NewTool, NewUser, RenameOutcome, RoleChanges, StoreError,
    StoreResult, ToolChanges, UserChanges, dedup_ids,
};
use crate::auth::validation::normalize;
use crate::models::{Id, KnownRole, Role, Tool, User};

const USER_COLUMNS: &str =
    "id, full_name, username, email, password_hash, is_active, created_at";
const ROLE_COLUMNS: &str = "id, name, description, created_at";
const TOOL_COLUMNS: &str =
    "id, name, display_name, description, route, icon, is_active, created_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Id,
    full_name: String,
    username: String,
    email: String,
    password_hash: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

/// Credential store over a Postgres pool. Multi-row writes run in one
/// transaction each.
#[derive(Debug, Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map a unique-constraint violation onto `Conflict`, everything else
/// onto `DbError`.
fn conflict_or_db(err: sqlx::Error, message: &str) -> StoreError {
    match err.as_database_error() {
        Some(db) if db.is_unique_violation() => StoreError::Conflict(message.to_string()),
        _ => StoreError::DbError(err),
    }
}

async fn hydrate(conn: &mut PgConnection, row: UserRow) -> StoreResult<User> {
    let roles = sqlx::query_as::<_, Role>(
        "SELECT r.id, r.name, r.description, r.created_at \
         FROM roles r JOIN user_roles ur ON ur.role_id = r.id \
         WHERE ur.user_id = $1 ORDER BY r.id",
    )
    .bind(row.id)
    .fetch_all(&mut *conn)
    .await?;

    let tools = sqlx::query_as::<_, Tool>(
        "SELECT t.id, t.name, t.display_name, t.description, t.route, t.icon, \
                t.is_active, t.created_at \
         FROM tools t JOIN user_tools ut ON ut.tool_id = t.id \
         WHERE ut.user_id = $1 ORDER BY t.id",
    )
    .bind(row.id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(User {
        id: row.id,
        full_name: row.full_name,
        username: row.username,
        email: row.email,
        password_hash: row.password_hash,
        is_active: row.is_active,
        created_at: row.created_at,
        roles,
        tools,
    })
}

async fn load_user(conn: &mut PgConnection, id: Id) -> StoreResult<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    match row {
        Some(row) => Ok(Some(hydrate(conn, row).await?)),
        None => Ok(None),
    }
}

async fn require_user(conn: &mut PgConnection, id: Id) -> StoreResult<User> {
    load_user(conn, id)
        .await?
        .ok_or_else(|| StoreError::NotFound("User".into()))
}

async fn check_roles_exist(conn: &mut PgConnection, ids: &[Id]) -> StoreResult<()> {
    let found = sqlx::query_scalar::<_, Id>("SELECT id FROM roles WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;
    match ids.iter().find(|id| !found.contains(id)) {
        Some(id) => Err(StoreError::NotFound(format!("Role {id}"))),
        None => Ok(()),
    }
}

async fn check_tools_exist(conn: &mut PgConnection, ids: &[Id]) -> StoreResult<()> {
    let found = sqlx::query_scalar::<_, Id>("SELECT id FROM tools WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&mut *conn)
        .await?;
    match ids.iter().find(|id| !found.contains(id)) {
        Some(id) => Err(StoreError::NotFound(format!("Tool {id}"))),
        None => Ok(()),
    }
}

async fn set_roles(conn: &mut PgConnection, user_id: Id, role_ids: &[Id]) -> StoreResult<()> {
    sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO user_roles (user_id, role_id) \
         SELECT $1, unnest($2::bigint[]) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(role_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn set_tools(conn: &mut PgConnection, user_id: Id, tool_ids: &[Id]) -> StoreResult<()> {
    sqlx::query("DELETE FROM user_tools WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        "INSERT INTO user_tools (user_id, tool_id) \
         SELECT $1, unnest($2::bigint[]) ON CONFLICT DO NOTHING",
    )
    .bind(user_id)
    .bind(tool_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Drop explicit tool rows of every superuser among `user_ids`.
async fn clear_superuser_tools(conn: &mut PgConnection, user_ids: &[Id]) -> StoreResult<()> {
    sqlx::query(
        "DELETE FROM user_tools ut \
         USING user_roles ur JOIN roles r ON r.id = ur.role_id \
         WHERE ut.user_id = ur.user_id AND r.name = $1 AND ut.user_id = ANY($2)",
    )
    .bind(KnownRole::Superuser.as_str())
    .bind(user_ids)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn role_holders(conn: &mut PgConnection, role_id: Id) -> StoreResult<Vec<Id>> {
    Ok(
        sqlx::query_scalar::<_, Id>("SELECT user_id FROM user_roles WHERE role_id = $1")
            .bind(role_id)
            .fetch_all(&mut *conn)
            .await?,
    )
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_user_by_id(&self, id: Id) -> StoreResult<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        load_user(&mut conn, id).await
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(normalize(username))
        .fetch_optional(&mut *conn)
        .await?;
        match row {
            Some(row) => Ok(Some(hydrate(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(normalize(email))
        .fetch_optional(&mut *conn)
        .await?;
        match row {
            Some(row) => Ok(Some(hydrate(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    async fn list_users(&self, skip: i64, limit: i64) -> StoreResult<Vec<User>> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id OFFSET $1 LIMIT $2"
        ))
        .bind(skip.max(0))
        .bind(limit.max(0))
        .fetch_all(&mut *conn)
        .await?;

        let mut users = Vec::with_capacity(rows.len());
        for row in rows {
            users.push(hydrate(&mut conn, row).await?);
        }
        Ok(users)
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let username = normalize(&new.username);
        let email = normalize(&new.email);
        let role_ids = dedup_ids(&new.role_ids);
        let tool_ids = dedup_ids(&new.tool_ids);

        let mut tx = self.pool.begin().await?;

        let username_taken = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(&username)
        .fetch_one(&mut *tx)
        .await?;
        if username_taken {
            return Err(StoreError::Conflict("Username already registered".into()));
        }
        let email_taken =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(&email)
                .fetch_one(&mut *tx)
                .await?;
        if email_taken {
            return Err(StoreError::Conflict("Email already registered".into()));
        }
        check_roles_exist(&mut tx, &role_ids).await?;
        check_tools_exist(&mut tx, &tool_ids).await?;

        let id = sqlx::query_scalar::<_, Id>(
            "INSERT INTO users (full_name, username, email, password_hash, is_active) \
             VALUES ($1, $2, $3, $4, $5) RETURNING id",
        )
        .bind(&new.full_name)
        .bind(&username)
        .bind(&email)
        .bind(&new.password_hash)
        .bind(new.is_active)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_or_db(e, "Username or email already registered"))?;

        set_roles(&mut tx, id, &role_ids).await?;
        set_tools(&mut tx, id, &tool_ids).await?;
        clear_superuser_tools(&mut tx, &[id]).await?;

        let user = require_user(&mut tx, id).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn update_user(&self, id: Id, changes: UserChanges) -> StoreResult<User> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent updates of the same user.
        let exists = sqlx::query_scalar::<_, Id>("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(StoreError::NotFound("User".into()));
        }

        let username = changes.username.as_deref().map(normalize);
        let email = changes.email.as_deref().map(normalize);
        if let Some(u) = &username {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND id <> $2)",
            )
            .bind(u)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            if taken {
                return Err(StoreError::Conflict("Username already taken".into()));
            }
        }
        if let Some(e) = &email {
            let taken = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id <> $2)",
            )
            .bind(e)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            if taken {
                return Err(StoreError::Conflict("Email already taken".into()));
            }
        }
        let role_ids = changes.role_ids.as_deref().map(dedup_ids);
        let tool_ids = changes.tool_ids.as_deref().map(dedup_ids);
        if let Some(ids) = &role_ids {
            check_roles_exist(&mut tx, ids).await?;
        }
        if let Some(ids) = &tool_ids {
            check_tools_exist(&mut tx, ids).await?;
        }

        sqlx::query(
            "UPDATE users SET \
                full_name = COALESCE($2, full_name), \
                username = COALESCE($3, username), \
                email = COALESCE($4, email), \
                password_hash = COALESCE($5, password_hash), \
                is_active = COALESCE($6, is_active) \
             WHERE id = $1",
        )
        .bind(id)
        .bind(changes.full_name)
        .bind(username)
        .bind(email)
        .bind(changes.password_hash)
        .bind(changes.is_active)
        .execute(&mut *tx)
        .await
        .map_err(|e| conflict_or_db(e, "Username or email already taken"))?;

        if let Some(ids) = &role_ids {
            set_roles(&mut tx, id, ids).await?;
        }
        if let Some(ids) = &tool_ids {
            set_tools(&mut tx, id, ids).await?;
        }
        clear_superuser_tools(&mut tx, &[id]).await?;

        let user = require_user(&mut tx, id).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn update_password_hash(
        &self,
        id: Id,
        expected: &str,
        new_hash: &str,
    ) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $3 WHERE id = $1 AND password_hash = $2")
                .bind(id)
                .bind(expected)
                .bind(new_hash)
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 1 {
            return Ok(true);
        }
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        if exists {
            Ok(false)
        } else {
            Err(StoreError::NotFound("User".into()))
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
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_role_by_id(&self, id: Id) -> StoreResult<Option<Role>> {
        Ok(sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_role_by_name(&self, name: &str) -> StoreResult<Option<Role>> {
        Ok(sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        Ok(sqlx::query_as::<_, Role>(&format!(
            "SELECT {ROLE_COLUMNS} FROM roles ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_role(&self, new: NewRole) -> StoreResult<Role> {
        sqlx::query_as::<_, Role>(&format!(
            "INSERT INTO roles (name, description) VALUES ($1, $2) RETURNING {ROLE_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_db(e, "Role name already exists"))
    }

    async fn update_role(&self, id: Id, changes: RoleChanges) -> StoreResult<Role> {
        let mut tx = self.pool.begin().await?;
        let role = sqlx::query_as::<_, Role>(&format!(
            "UPDATE roles SET name = COALESCE($2, name), \
                description = COALESCE($3, description) \
             WHERE id = $1 RETURNING {ROLE_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| conflict_or_db(e, "Role name already exists"))?
        .ok_or_else(|| StoreError::NotFound("Role".into()))?;

        // A rename onto `superuser` promotes every holder.
        let holders = role_holders(&mut tx, id).await?;
        clear_superuser_tools(&mut tx, &holders).await?;
        tx.commit().await?;
        Ok(role)
    }

    async fn delete_role(&self, id: Id) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn rename_role(&self, from: &str, to: &str) -> StoreResult<RenameOutcome> {
        let mut tx = self.pool.begin().await?;
        let from_id = sqlx::query_scalar::<_, Id>("SELECT id FROM roles WHERE name = $1 FOR UPDATE")
            .bind(from)
            .fetch_optional(&mut *tx)
            .await?;
        let to_id = sqlx::query_scalar::<_, Id>("SELECT id FROM roles WHERE name = $1 FOR UPDATE")
            .bind(to)
            .fetch_optional(&mut *tx)
            .await?;

        let (outcome, affected) = match (from_id, to_id) {
            (Some(fid), None) => {
                sqlx::query("UPDATE roles SET name = $2 WHERE id = $1")
                    .bind(fid)
                    .bind(to)
                    .execute(&mut *tx)
                    .await?;
                (RenameOutcome::Renamed, fid)
            }
            (Some(fid), Some(tid)) => {
                sqlx::query(
                    "INSERT INTO user_roles (user_id, role_id) \
                     SELECT user_id, $2 FROM user_roles WHERE role_id = $1 \
                     ON CONFLICT DO NOTHING",
                )
                .bind(fid)
                .bind(tid)
                .execute(&mut *tx)
                .await?;
                sqlx::query("DELETE FROM roles WHERE id = $1")
                    .bind(fid)
                    .execute(&mut *tx)
                    .await?;
                (RenameOutcome::Merged, tid)
            }
            (None, _) => return Ok(RenameOutcome::Unchanged),
        };

        let holders = role_holders(&mut tx, affected).await?;
        clear_superuser_tools(&mut tx, &holders).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    async fn find_tool_by_id(&self, id: Id) -> StoreResult<Option<Tool>> {
        Ok(sqlx::query_as::<_, Tool>(&format!(
            "SELECT {TOOL_COLUMNS} FROM tools WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn find_tools_by_ids(&self, ids: &[Id]) -> StoreResult<Vec<Tool>> {
        Ok(sqlx::query_as::<_, Tool>(&format!(
            "SELECT {TOOL_COLUMNS} FROM tools WHERE id = ANY($1) ORDER BY id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_tools(&self) -> StoreResult<Vec<Tool>> {
        Ok(sqlx::query_as::<_, Tool>(&format!(
            "SELECT {TOOL_COLUMNS} FROM tools ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_active_tools(&self) -> StoreResult<Vec<Tool>> {
        Ok(sqlx::query_as::<_, Tool>(&format!(
            "SELECT {TOOL_COLUMNS} FROM tools WHERE is_active ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_tool(&self, new: NewTool) -> StoreResult<Tool> {
        sqlx::query_as::<_, Tool>(&format!(
            "INSERT INTO tools (name, display_name, description, route, icon, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {TOOL_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.display_name)
        .bind(&new.description)
        .bind(&new.route)
        .bind(&new.icon)
        .bind(new.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_or_db(e, "Tool name already exists"))
    }

    async fn update_tool(&self, id: Id, changes: ToolChanges) -> StoreResult<Tool> {
        sqlx::query_as::<_, Tool>(&format!(
            "UPDATE tools SET \
                name = COALESCE($2, name), \
                display_name = COALESCE($3, display_name), \
                description = COALESCE($4, description), \
                route = COALESCE($5, route), \
                icon = COALESCE($6, icon), \
                is_active = COALESCE($7, is_active) \
             WHERE id = $1 RETURNING {TOOL_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.display_name)
        .bind(changes.description)
        .bind(changes.route)
        .bind(changes.icon)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_or_db(e, "Tool name already exists"))?
        .ok_or_else(|| StoreError::NotFound("Tool".into()))
    }

    async fn delete_tool(&self, id: Id) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tools WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
