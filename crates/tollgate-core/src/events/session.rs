//! Session-related domain events.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why a session row stopped existing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationReason {
    /// The user logged out.
    Logout,
    /// The refresh token was rotated; a replacement session exists.
    Rotated,
    /// An administrator revoked the session.
    Admin,
    /// The user's role changed and the tenant forces logout.
    RoleChange,
    /// A federated identity provider requested revocation.
    Federated,
    /// The password was reset.
    PasswordReset,
    /// The tenant was suspended.
    TenantSuspended,
    /// Evicted to make room under the concurrent-session limit.
    Evicted,
    /// Refresh window elapsed.
    Expired,
    /// Idle timeout elapsed.
    IdleTimeout,
    /// Absolute timeout or role ceiling elapsed.
    AbsoluteTimeout,
    /// Request context did not match the bound attributes.
    BindingViolation,
}

impl RevocationReason {
    /// Return the reason as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Logout => "logout",
            Self::Rotated => "rotated",
            Self::Admin => "admin",
            Self::RoleChange => "role_change",
            Self::Federated => "federated",
            Self::PasswordReset => "password_reset",
            Self::TenantSuspended => "tenant_suspended",
            Self::Evicted => "evicted",
            Self::Expired => "expired",
            Self::IdleTimeout => "idle_timeout",
            Self::AbsoluteTimeout => "absolute_timeout",
            Self::BindingViolation => "binding_violation",
        }
    }
}

impl fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Events related to user sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// A session was issued at login or registration.
    Created {
        /// The session ID.
        session_id: Uuid,
        /// The user ID.
        user_id: Uuid,
        /// The client IP address, if known.
        ip_address: Option<String>,
    },
    /// A refresh token was rotated into a new session.
    Rotated {
        /// The session that was rotated out.
        old_session_id: Uuid,
        /// The replacement session.
        new_session_id: Uuid,
        /// The user ID.
        user_id: Uuid,
    },
    /// One or more sessions were deleted.
    Revoked {
        /// The session IDs that no longer exist.
        session_ids: Vec<Uuid>,
        /// The user ID, when the revocation targeted one user.
        user_id: Option<Uuid>,
        /// Why the sessions ended.
        reason: RevocationReason,
    },
    /// A login attempt failed.
    LoginFailed {
        /// The email that was attempted.
        email: String,
        /// The client IP address, if known.
        ip_address: Option<String>,
    },
}

impl SessionEvent {
    /// Stable dotted name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "session.created",
            Self::Rotated { .. } => "session.rotated",
            Self::Revoked { .. } => "session.revoked",
            Self::LoginFailed { .. } => "session.login_failed",
        }
    }
}
