//! User-related domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events related to user accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UserEvent {
    /// A user registered.
    Registered {
        /// The new user's ID.
        user_id: Uuid,
        /// The registered email.
        email: String,
    },
    /// A password was changed through the reset flow.
    PasswordChanged {
        /// The user ID.
        user_id: Uuid,
    },
    /// A reset token was issued. Consumed by the mail collaborator.
    PasswordResetRequested {
        /// The user ID.
        user_id: Uuid,
        /// Where to deliver the token.
        email: String,
        /// The raw single-use token.
        token: String,
        /// When the token stops being accepted.
        expires_at: DateTime<Utc>,
    },
    /// A user's role changed.
    RoleChanged {
        /// The user ID.
        user_id: Uuid,
        /// Previous role.
        from: String,
        /// New role.
        to: String,
    },
}

impl UserEvent {
    /// Stable dotted name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Registered { .. } => "user.registered",
            Self::PasswordChanged { .. } => "user.password_changed",
            Self::PasswordResetRequested { .. } => "user.password_reset_requested",
            Self::RoleChanged { .. } => "user.role_changed",
        }
    }
}
