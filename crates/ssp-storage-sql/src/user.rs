//! `PostgreSQL` implementation of the user storage provider.

use async_trait::async_trait;
use sqlx::PgPool;
use ssp_model::LocalUser;
use ssp_storage::{StorageError, StorageResult, UserProvider};
use uuid::Uuid;

use crate::convert::user_from_row;
use crate::entities::LocalUserRow;
use crate::error::{from_query_error, from_sqlx_error};

/// `PostgreSQL` user storage provider.
pub struct PgUserProvider {
    pool: PgPool,
}

impl PgUserProvider {
    /// Creates a new `PostgreSQL` user provider.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserProvider for PgUserProvider {
    async fn create(&self, user: &LocalUser) -> StorageResult<()> {
        if !user.is_valid() {
            return Err(StorageError::InvalidData(format!(
                "user {} is missing a username or email",
                user.id
            )));
        }

        sqlx::query(
            r"INSERT INTO local_users (
                id, username, email, first_name, surname, source, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.surname)
        .bind(&user.source)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| from_sqlx_error(e, "LocalUser", "email", &user.email))?;

        tracing::debug!(user_id = %user.id, "Inserted local user");
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> StorageResult<Option<LocalUser>> {
        let row: Option<LocalUserRow> = sqlx::query_as("SELECT * FROM local_users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(from_query_error)?;

        Ok(row.map(user_from_row))
    }

    async fn get_by_email(&self, email: &str) -> StorageResult<Option<LocalUser>> {
        let row: Option<LocalUserRow> =
            sqlx::query_as("SELECT * FROM local_users WHERE lower(email) = lower($1)")
                .bind(email.trim())
                .fetch_optional(&self.pool)
                .await
                .map_err(from_query_error)?;

        Ok(row.map(user_from_row))
    }

    async fn count(&self) -> StorageResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM local_users")
            .fetch_one(&self.pool)
            .await
            .map_err(from_query_error)?;

        Ok(u64::try_from(count).unwrap_or(0))
    }
}
