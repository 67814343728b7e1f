//! PostgreSQL session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use tollgate_core::result::AppResult;
use tollgate_entity::session::{CreateSession, Session, SessionWithContext};
use tollgate_entity::tenant::Tenant;
use tollgate_entity::user::User;

use super::{SessionRepository, map_db_error};

const INSERT_SESSION: &str = "INSERT INTO sessions \
     (id, user_id, tenant_id, token_hash, expires_at, created_at, last_active_at, \
      ip_address, device_fingerprint, user_agent) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *";

/// Session rows stored in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn bind_insert<'q>(
    data: &'q CreateSession,
    last_active_at: Option<DateTime<Utc>>,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, Session, sqlx::postgres::PgArguments> {
    sqlx::query_as::<_, Session>(INSERT_SESSION)
        .bind(Uuid::new_v4())
        .bind(data.user_id)
        .bind(data.tenant_id)
        .bind(&data.token_hash)
        .bind(data.expires_at)
        .bind(data.created_at)
        .bind(last_active_at)
        .bind(&data.ip_address)
        .bind(&data.device_fingerprint)
        .bind(&data.user_agent)
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, data: &CreateSession) -> AppResult<Session> {
        bind_insert(data, None)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error("Failed to create session"))
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to find session"))
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to find session by token"))
    }

    async fn find_with_context(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<SessionWithContext>> {
        let Some(session) = self.find_by_id(tenant_id, id).await? else {
            return Ok(None);
        };

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND tenant_id = $2")
            .bind(session.user_id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to load session owner"))?;
        let tenant = sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to load session tenant"))?;

        Ok(match (user, tenant) {
            (Some(user), Some(tenant)) => Some(SessionWithContext {
                session,
                user,
                tenant,
            }),
            _ => None,
        })
    }

    async fn list_for_user(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE tenant_id = $1 AND user_id = $2 \
             ORDER BY created_at ASC",
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error("Failed to list sessions"))
    }

    async fn list_for_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<Session>> {
        sqlx::query_as::<_, Session>(
            "SELECT * FROM sessions WHERE tenant_id = $1 ORDER BY created_at ASC",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error("Failed to list tenant sessions"))
    }

    async fn count_active(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sessions \
             WHERE tenant_id = $1 AND user_id = $2 AND expires_at > $3",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error("Failed to count active sessions"))?;
        Ok(count.max(0) as u64)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error("Failed to delete session"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Session>> {
        sqlx::query_as::<_, Session>("DELETE FROM sessions WHERE token_hash = $1 RETURNING *")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to delete session by token"))
    }

    async fn delete_all_for_user(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar(
            "DELETE FROM sessions WHERE tenant_id = $1 AND user_id = $2 RETURNING id",
        )
        .bind(tenant_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error("Failed to delete user sessions"))
    }

    async fn delete_all_for_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<Uuid>> {
        sqlx::query_scalar("DELETE FROM sessions WHERE tenant_id = $1 RETURNING id")
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error("Failed to delete tenant sessions"))
    }

    async fn delete_oldest_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        count: u64,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>> {
        if count == 0 {
            return Ok(Vec::new());
        }
        sqlx::query_scalar(
            "DELETE FROM sessions WHERE id IN ( \
                 SELECT id FROM sessions \
                 WHERE tenant_id = $1 AND user_id = $2 AND expires_at > $4 \
                 ORDER BY created_at ASC, id ASC LIMIT $3 \
             ) RETURNING id",
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(i64::try_from(count).unwrap_or(i64::MAX))
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error("Failed to evict oldest sessions"))
    }

    async fn rotate(
        &self,
        tenant_id: Uuid,
        old_id: Uuid,
        old_token_hash: &str,
        replacement: &CreateSession,
        active_at: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(map_db_error("Failed to begin rotation"))?;

        let deleted: Option<Uuid> = sqlx::query_scalar(
            "DELETE FROM sessions WHERE id = $1 AND tenant_id = $2 AND token_hash = $3 \
             RETURNING id",
        )
        .bind(old_id)
        .bind(tenant_id)
        .bind(old_token_hash)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_db_error("Failed to consume session"))?;

        if deleted.is_none() {
            debug!(session_id = %old_id, "Rotation lost: session already consumed");
            tx.rollback()
                .await
                .map_err(map_db_error("Failed to roll back rotation"))?;
            return Ok(None);
        }

        let session = bind_insert(replacement, Some(active_at))
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error("Failed to insert rotated session"))?;

        tx.commit()
            .await
            .map_err(map_db_error("Failed to commit rotation"))?;
        Ok(Some(session))
    }

    async fn touch(&self, tenant_id: Uuid, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE sessions SET last_active_at = $1 WHERE id = $2 AND tenant_id = $3")
                .bind(at)
                .bind(id)
                .bind(tenant_id)
                .execute(&self.pool)
                .await
                .map_err(map_db_error("Failed to touch session"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(map_db_error("Failed to delete expired sessions"))?;
        Ok(result.rows_affected())
    }
}
