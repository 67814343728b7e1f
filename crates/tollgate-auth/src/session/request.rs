//! Inputs and outputs of the session lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use tollgate_entity::session::Session;
use tollgate_entity::user::User;

/// Registration input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address, unique within the tenant.
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,
    /// Plain-text password. Checked against the password rules, never logged.
    pub password: String,
    /// Optional display name for the profile.
    #[validate(length(max = 200, message = "Display name is too long"))]
    pub display_name: Option<String>,
    /// Target tenant. `None` selects the default tenant.
    pub tenant_id: Option<Uuid>,
}

/// Login input.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address.
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
    /// Plain-text password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    /// Target tenant. `None` selects the default tenant.
    pub tenant_id: Option<Uuid>,
}

/// Result of a successful registration or login.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    /// Signed access token.
    pub access_token: String,
    /// When the access token stops verifying.
    pub access_expires_at: Option<DateTime<Utc>>,
    /// Raw refresh token. Returned once and never stored.
    pub refresh_token: String,
    /// The new session.
    pub session_id: Uuid,
    /// The authenticated user.
    pub user: User,
}

/// Result of a successful refresh.
#[derive(Debug, Clone)]
pub struct RotatedSession {
    /// Signed access token for the replacement session.
    pub access_token: String,
    /// When the access token stops verifying.
    pub access_expires_at: Option<DateTime<Utc>>,
    /// Raw replacement refresh token.
    pub refresh_token: String,
    /// The replacement session.
    pub session_id: Uuid,
    /// The session that was rotated out.
    pub old_session_id: Uuid,
    /// The session owner.
    pub user: User,
}

/// A session as shown to its owner or an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Session ID.
    pub id: Uuid,
    /// Owning user.
    pub user_id: Uuid,
    /// When the session was first issued.
    pub created_at: DateTime<Utc>,
    /// Last refresh.
    pub last_active_at: Option<DateTime<Utc>>,
    /// End of the refresh window.
    pub expires_at: DateTime<Utc>,
    /// IP recorded at issuance.
    pub ip_address: Option<String>,
    /// Device fingerprint recorded at issuance.
    pub device_fingerprint: Option<String>,
    /// User-Agent recorded at issuance.
    pub user_agent: Option<String>,
    /// Whether this is the caller's own session.
    pub current: bool,
}

impl SessionSummary {
    /// Summarize a session row.
    pub fn from_session(session: Session, current: Option<Uuid>) -> Self {
        Self {
            current: current == Some(session.id),
            id: session.id,
            user_id: session.user_id,
            created_at: session.created_at,
            last_active_at: session.last_active_at,
            expires_at: session.expires_at,
            ip_address: session.ip_address,
            device_fingerprint: session.device_fingerprint,
            user_agent: session.user_agent,
        }
    }
}
