//! PostgreSQL password reset token repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tollgate_core::result::AppResult;
use tollgate_entity::reset::{CreatePasswordResetToken, PasswordResetToken};

use super::{PasswordResetRepository, map_db_error};

/// Reset token rows stored in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgPasswordResetRepository {
    pool: PgPool,
}

impl PgPasswordResetRepository {
    /// Create a new reset token repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PasswordResetRepository for PgPasswordResetRepository {
    async fn create(&self, data: &CreatePasswordResetToken) -> AppResult<PasswordResetToken> {
        sqlx::query_as::<_, PasswordResetToken>(
            "INSERT INTO password_reset_tokens \
             (id, user_id, tenant_id, token_hash, expires_at, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.tenant_id)
        .bind(&data.token_hash)
        .bind(data.expires_at)
        .bind(data.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error("Failed to create reset token"))
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<PasswordResetToken>> {
        sqlx::query_as::<_, PasswordResetToken>(
            "SELECT * FROM password_reset_tokens WHERE token_hash = $1",
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error("Failed to find reset token"))
    }

    async fn mark_used(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE password_reset_tokens SET used_at = $1 WHERE id = $2 AND used_at IS NULL",
        )
        .bind(at)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error("Failed to consume reset token"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_others_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        keep: Uuid,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM password_reset_tokens \
             WHERE tenant_id = $1 AND user_id = $2 AND id <> $3",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(keep)
        .execute(&self.pool)
        .await
        .map_err(map_db_error("Failed to delete reset tokens"))?;
        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_db_error("Failed to delete expired reset tokens"))?;
        Ok(result.rows_affected())
    }
}
