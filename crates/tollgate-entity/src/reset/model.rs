//! Password reset token model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single-use password reset token. Only its digest is stored.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PasswordResetToken {
    /// Unique token identifier.
    pub id: Uuid,
    /// The user the token resets.
    pub user_id: Uuid,
    /// Tenant of the user.
    pub tenant_id: Uuid,
    /// Digest of the raw token.
    #[serde(skip_serializing)]
    pub token_hash: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
    /// When the token was consumed.
    pub used_at: Option<DateTime<Utc>>,
    /// When the token was issued.
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    /// Whether the token was already consumed.
    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    /// Whether the token has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Data required to issue a reset token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePasswordResetToken {
    /// The user the token resets.
    pub user_id: Uuid,
    /// Tenant of the user.
    pub tenant_id: Uuid,
    /// Digest of the raw token.
    pub token_hash: String,
    /// Expiry instant.
    pub expires_at: DateTime<Utc>,
    /// Issue instant.
    pub created_at: DateTime<Utc>,
}
