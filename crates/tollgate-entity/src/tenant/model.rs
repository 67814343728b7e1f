//! Tenant entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::settings::SessionPolicyOverrides;
use super::status::TenantStatus;

/// A tenant. Owned externally; the session core reads status and settings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    /// Unique tenant identifier.
    pub id: Uuid,
    /// URL-safe unique name.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    pub status: TenantStatus,
    /// Free-form settings blob. Session policy lives under `"session"`.
    pub settings: serde_json::Value,
    /// When the tenant was created.
    pub created_at: DateTime<Utc>,
    /// When the tenant was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    /// Parse the session policy overrides out of the settings blob.
    pub fn session_overrides(&self) -> SessionPolicyOverrides {
        SessionPolicyOverrides::from_settings(Some(&self.settings))
    }
}

/// Data required to create a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    /// URL-safe unique name.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Initial status.
    pub status: TenantStatus,
    /// Initial settings blob.
    pub settings: serde_json::Value,
}
