//! User profile row created alongside every registered user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Presentation data for a user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    /// The user this profile belongs to.
    pub user_id: Uuid,
    /// Owning tenant.
    pub tenant_id: Uuid,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// When the profile was created.
    pub created_at: DateTime<Utc>,
}
