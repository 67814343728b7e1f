//! Tenant lookup for the session core.
//!
//! Tenants are owned elsewhere; this layer only resolves them, checks their
//! status against the allowed set, and tears down sessions when a tenant
//! leaves that set.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use tollgate_core::config::AuthConfig;
use tollgate_core::events::{DomainEvent, RevocationReason, SessionEvent};
use tollgate_core::traits::EventPublisher;
use tollgate_database::TenantRepository;
use tollgate_entity::tenant::{CreateTenant, SessionPolicyOverrides, Tenant, TenantStatus};

use crate::error::{AuthError, AuthResult};
use crate::session::SessionStore;

/// Resolves tenants and enforces the allowed-status set.
#[derive(Clone)]
pub struct TenantDirectory {
    tenants: Arc<dyn TenantRepository>,
    sessions: Arc<SessionStore>,
    publisher: Arc<dyn EventPublisher>,
    default_slug: String,
    allowed_statuses: Vec<String>,
}

impl std::fmt::Debug for TenantDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantDirectory")
            .field("default_slug", &self.default_slug)
            .field("allowed_statuses", &self.allowed_statuses)
            .finish()
    }
}

impl TenantDirectory {
    /// Create a directory.
    pub fn new(
        tenants: Arc<dyn TenantRepository>,
        sessions: Arc<SessionStore>,
        publisher: Arc<dyn EventPublisher>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            tenants,
            sessions,
            publisher,
            default_slug: config.default_tenant_slug.clone(),
            allowed_statuses: config.allowed_tenant_statuses.clone(),
        }
    }

    /// Resolve an explicit tenant, or the default tenant when none is given.
    ///
    /// Never creates anything.
    pub async fn resolve(&self, tenant_id: Option<Uuid>) -> AuthResult<Tenant> {
        let found = match tenant_id {
            Some(id) => self.tenants.find_by_id(id).await?,
            None => self.tenants.find_by_slug(&self.default_slug).await?,
        };
        found.ok_or(AuthError::TenantNotFound)
    }

    /// Like [`resolve`](Self::resolve), but creates the default tenant on
    /// first use. An explicit tenant ID must still exist.
    pub async fn resolve_or_provision(&self, tenant_id: Option<Uuid>) -> AuthResult<Tenant> {
        if tenant_id.is_some() {
            return self.resolve(tenant_id).await;
        }

        let tenant = self
            .tenants
            .find_or_create(&CreateTenant {
                slug: self.default_slug.clone(),
                name: "Default".to_string(),
                status: TenantStatus::Active,
                settings: json!({}),
            })
            .await?;
        Ok(tenant)
    }

    /// Find a tenant by ID without failing when it is absent.
    pub async fn find(&self, tenant_id: Uuid) -> AuthResult<Option<Tenant>> {
        Ok(self.tenants.find_by_id(tenant_id).await?)
    }

    /// Whether the tenant's status permits login and refresh.
    pub fn is_allowed(&self, tenant: &Tenant) -> bool {
        tenant.status.is_allowed_by(&self.allowed_statuses)
    }

    /// Fail closed unless the tenant's status is in the allowed set.
    pub fn ensure_allowed(&self, tenant: &Tenant) -> AuthResult<()> {
        if self.is_allowed(tenant) {
            return Ok(());
        }
        warn!(
            tenant_id = %tenant.id,
            status = %tenant.status,
            "Tenant status not allowed"
        );
        Err(AuthError::TenantInactive {
            tenant_id: tenant.id,
            status: tenant.status,
        })
    }

    /// Create a tenant.
    pub async fn create(&self, data: &CreateTenant) -> AuthResult<Tenant> {
        let slug = data.slug.trim();
        if slug.is_empty()
            || !slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(AuthError::Validation(format!(
                "tenant slug '{}' must be lowercase letters, digits or '-'",
                data.slug
            )));
        }
        let tenant = self.tenants.create(data).await?;
        info!(tenant_id = %tenant.id, slug = %tenant.slug, "Tenant created");
        Ok(tenant)
    }

    /// List all tenants.
    pub async fn list(&self) -> AuthResult<Vec<Tenant>> {
        Ok(self.tenants.list().await?)
    }

    /// Change a tenant's status.
    ///
    /// When the new status is outside the allowed set every session of the
    /// tenant is deleted. Returns the deleted session IDs.
    pub async fn set_status(
        &self,
        tenant_id: Uuid,
        status: TenantStatus,
    ) -> AuthResult<Vec<Uuid>> {
        if !self.tenants.update_status(tenant_id, status).await? {
            return Err(AuthError::TenantNotFound);
        }
        info!(tenant_id = %tenant_id, status = %status, "Tenant status changed");

        if status.is_allowed_by(&self.allowed_statuses) {
            return Ok(Vec::new());
        }

        let revoked = self.sessions.delete_all_for_tenant(tenant_id).await?;
        info!(
            tenant_id = %tenant_id,
            count = revoked.len(),
            "Sessions revoked for inactive tenant"
        );
        if !revoked.is_empty() {
            self.publisher.publish(DomainEvent::session(
                tenant_id,
                None,
                SessionEvent::Revoked {
                    session_ids: revoked.clone(),
                    user_id: None,
                    reason: RevocationReason::TenantSuspended,
                },
            ));
        }
        Ok(revoked)
    }

    /// Suspend a tenant and delete all of its sessions.
    pub async fn suspend(&self, tenant_id: Uuid) -> AuthResult<Vec<Uuid>> {
        self.set_status(tenant_id, TenantStatus::Suspended).await
    }

    /// Replace the session policy overrides in a tenant's settings.
    pub async fn update_overrides(
        &self,
        tenant_id: Uuid,
        overrides: &SessionPolicyOverrides,
    ) -> AuthResult<Tenant> {
        let mut tenant = self.resolve(Some(tenant_id)).await?;
        overrides
            .apply_to(&mut tenant.settings)
            .map_err(|e| AuthError::Validation(format!("invalid session settings: {e}")))?;

        if !self
            .tenants
            .update_settings(tenant_id, &tenant.settings)
            .await?
        {
            return Err(AuthError::TenantNotFound);
        }
        info!(tenant_id = %tenant_id, "Tenant session policy updated");
        Ok(tenant)
    }
}
