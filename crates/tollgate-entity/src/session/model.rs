//! Session entity model.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::tenant::Tenant;
use crate::user::User;

/// A session row. Exactly one row exists per currently valid refresh token;
/// deleting the row is the only way a session ends.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Session {
    /// Unique session identifier.
    pub id: Uuid,
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// Tenant of the owning user.
    pub tenant_id: Uuid,
    /// Digest of the refresh token. The raw token is never stored.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// End of the refresh window.
    pub expires_at: DateTime<Utc>,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last refresh, `None` until the first one.
    pub last_active_at: Option<DateTime<Utc>>,
    /// IP address observed at creation.
    pub ip_address: Option<String>,
    /// Device fingerprint observed at creation.
    pub device_fingerprint: Option<String>,
    /// User-Agent observed at creation.
    pub user_agent: Option<String>,
}

impl Session {
    /// Most recent activity: the last refresh, or creation.
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_active_at.unwrap_or(self.created_at)
    }

    /// Whether the refresh window has elapsed at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Time since the last activity.
    pub fn idle_for(&self, now: DateTime<Utc>) -> Duration {
        now - self.last_activity()
    }

    /// Time since creation.
    pub fn age_at(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }
}

/// Data required to create a new session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSession {
    /// The user this session belongs to.
    pub user_id: Uuid,
    /// Tenant of the owning user.
    pub tenant_id: Uuid,
    /// Digest of the refresh token.
    pub token_hash: String,
    /// End of the refresh window.
    pub expires_at: DateTime<Utc>,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
    /// Client IP address.
    pub ip_address: Option<String>,
    /// Client device fingerprint.
    pub device_fingerprint: Option<String>,
    /// Client User-Agent.
    pub user_agent: Option<String>,
}

/// A session together with its owning user and tenant.
#[derive(Debug, Clone)]
pub struct SessionWithContext {
    /// The session row.
    pub session: Session,
    /// The owning user.
    pub user: User,
    /// The owning tenant.
    pub tenant: Tenant,
}
