//! PostgreSQL user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tollgate_core::result::AppResult;
use tollgate_entity::user::{CreateUser, User, UserProfile, UserRole};

use super::{UserRepository, map_db_error};

/// User rows stored in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new user repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to find user"))
    }

    async fn find_by_id_unscoped(&self, id: Uuid) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to find user"))
    }

    async fn find_by_email(&self, tenant_id: Uuid, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE tenant_id = $1 AND email = $2")
            .bind(tenant_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to find user by email"))
    }

    async fn find_by_email_unscoped(&self, email: &str) -> AppResult<Vec<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1 ORDER BY created_at ASC")
            .bind(email)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error("Failed to find users by email"))
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(map_db_error("Failed to begin transaction"))?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, tenant_id, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(data.tenant_id)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(data.role)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error("Failed to create user"))?;

        sqlx::query(
            "INSERT INTO user_profiles (user_id, tenant_id, display_name, created_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(user.id)
        .bind(user.tenant_id)
        .bind(&data.display_name)
        .bind(user.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_db_error("Failed to create user profile"))?;

        tx.commit()
            .await
            .map_err(map_db_error("Failed to commit user creation"))?;
        Ok(user)
    }

    async fn find_profile(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT * FROM user_profiles WHERE user_id = $1 AND tenant_id = $2",
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error("Failed to find user profile"))
    }

    async fn update_password(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        password_hash: &str,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, updated_at = NOW() \
             WHERE id = $2 AND tenant_id = $3",
        )
        .bind(password_hash)
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error("Failed to update password"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_role(&self, tenant_id: Uuid, id: Uuid, role: UserRole) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2 AND tenant_id = $3",
        )
        .bind(role)
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error("Failed to update role"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_active(&self, tenant_id: Uuid, id: Uuid, active: bool) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET is_active = $1, updated_at = NOW() WHERE id = $2 AND tenant_id = $3",
        )
        .bind(active)
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error("Failed to update user status"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn touch_last_login(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $1 WHERE id = $2 AND tenant_id = $3")
            .bind(at)
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error("Failed to record login"))?;
        Ok(())
    }
}
