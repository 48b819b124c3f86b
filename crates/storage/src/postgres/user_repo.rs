//! User repository implementation for PostgreSQL.
//!
//! Roles live in the `user_roles` side table and are written in the same
//! transaction as the user row.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};

use syllabus_core::error::{StorageError, StorageResult};
use syllabus_core::metrics::record_query;
use syllabus_core::models::{EntityId, NewUser, Role, User};
use syllabus_core::ports::{PagedResult, Repository, UserFilter, UserRepository};

use super::helpers::{expect_affected, map_sqlx_error, map_tx_error, parse_roles};
use super::query_engine::{PgEntity, QueryEngine};

pub(super) static USER: PgEntity = PgEntity {
    name: "user",
    table: "users",
    from: "users e",
    columns: "e.id, e.name, e.email, e.password, e.created_at, \
              ARRAY(SELECT ur.role::TEXT FROM user_roles ur WHERE ur.user_id = e.id ORDER BY ur.role) AS roles",
    fields: &[
        ("id", "e.id"),
        ("name", "e.name"),
        ("email", "e.email"),
        ("createdAt", "e.created_at"),
    ],
};

// =============================================================================
// Repository Implementation
// =============================================================================

/// PostgreSQL implementation of UserRepository.
pub struct PgUserRepository {
    engine: QueryEngine,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            engine: QueryEngine::new(pool, &USER),
        }
    }

    async fn insert_roles(
        tx: &mut Transaction<'static, Postgres>,
        user_id: EntityId,
        roles: &[Role],
    ) -> StorageResult<()> {
        for role in roles {
            sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2)")
                .bind(user_id)
                .bind(role.as_str())
                .execute(&mut **tx)
                .await
                .map_err(map_sqlx_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl Repository<User, NewUser, UserFilter> for PgUserRepository {
    async fn add(&self, new: &NewUser) -> StorageResult<User> {
        let mut tx = self.engine.pool().begin().await.map_err(map_tx_error)?;

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (name, email, password, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        Self::insert_roles(&mut tx, id, &new.roles).await?;
        tx.commit().await.map_err(map_tx_error)?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("users id={id}")))
    }

    async fn find_by_id(&self, id: EntityId) -> StorageResult<Option<User>> {
        let row = self.engine.find_by_id::<UserRow>(id).await?;
        row.map(UserRow::into_user).transpose()
    }

    /// Rewrites name, email, password and roles. `created_at` is left untouched.
    async fn update(&self, id: EntityId, new: &NewUser) -> StorageResult<()> {
        let mut tx = self.engine.pool().begin().await.map_err(map_tx_error)?;

        let result = sqlx::query("UPDATE users SET name = $1, email = $2, password = $3 WHERE id = $4")
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        expect_affected(result.rows_affected(), USER.table, id)?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
        Self::insert_roles(&mut tx, id, &new.roles).await?;

        tx.commit().await.map_err(map_tx_error)
    }

    async fn delete(&self, id: EntityId) -> StorageResult<()> {
        self.engine.delete_by_id(id).await
    }

    async fn find_all(&self) -> StorageResult<Vec<User>> {
        let rows = self.engine.find_all::<UserRow>().await?;
        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn id_exists(&self, id: EntityId) -> StorageResult<bool> {
        self.engine.id_exists(id).await
    }

    async fn find_by_filter(&self, filter: &UserFilter) -> StorageResult<PagedResult<User>> {
        let page = self.engine.find_paged::<UserRow, _>(filter).await?;
        page.try_map(UserRow::into_user)
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> StorageResult<Option<User>> {
        let sql = format!("{} WHERE e.email = $1", USER.select_prefix());
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(email)
            .fetch_optional(self.engine.pool())
            .await
            .map_err(map_sqlx_error)?;
        record_query(USER.name, "by_email");

        row.map(UserRow::into_user).transpose()
    }
}

// =============================================================================
// Row Types
// =============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password: String,
    created_at: NaiveDate,
    roles: Vec<String>,
}

impl UserRow {
    fn into_user(self) -> StorageResult<User> {
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            password: self.password,
            created_at: self.created_at,
            roles: parse_roles(self.roles, "user.roles")?,
        })
    }
}
