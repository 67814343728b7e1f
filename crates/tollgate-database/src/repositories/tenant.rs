//! PostgreSQL tenant repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tollgate_core::result::AppResult;
use tollgate_entity::tenant::{CreateTenant, Tenant, TenantStatus};

use super::{TenantRepository, map_db_error};

/// Tenant rows stored in PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgTenantRepository {
    pool: PgPool,
}

impl PgTenantRepository {
    /// Create a new tenant repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for PgTenantRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Tenant>> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to find tenant"))
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Tenant>> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error("Failed to find tenant by slug"))
    }

    async fn create(&self, data: &CreateTenant) -> AppResult<Tenant> {
        sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (id, slug, name, status, settings) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.slug)
        .bind(&data.name)
        .bind(data.status)
        .bind(&data.settings)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error("Failed to create tenant"))
    }

    async fn find_or_create(&self, data: &CreateTenant) -> AppResult<Tenant> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        sqlx::query_as::<_, Tenant>(
            "INSERT INTO tenants (id, slug, name, status, settings) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug \
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&data.slug)
        .bind(&data.name)
        .bind(data.status)
        .bind(&data.settings)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error("Failed to provision tenant"))
    }

    async fn update_status(&self, id: Uuid, status: TenantStatus) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE tenants SET status = $1, updated_at = NOW() WHERE id = $2")
                .bind(status)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(map_db_error("Failed to update tenant status"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_settings(&self, id: Uuid, settings: &serde_json::Value) -> AppResult<bool> {
        let result =
            sqlx::query("UPDATE tenants SET settings = $1, updated_at = NOW() WHERE id = $2")
                .bind(settings)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(map_db_error("Failed to update tenant settings"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> AppResult<Vec<Tenant>> {
        sqlx::query_as::<_, Tenant>("SELECT * FROM tenants ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_db_error("Failed to list tenants"))
    }
}
