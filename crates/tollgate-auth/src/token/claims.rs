//! Access token claims.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tollgate_core::types::span::saturating_add;
use tollgate_entity::user::UserRole;

/// Claims embedded in every access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject: the user ID.
    pub sub: Uuid,
    /// Tenant of the user.
    pub tid: Uuid,
    /// Session the token belongs to.
    pub sid: Uuid,
    /// Role at issuance.
    pub role: UserRole,
    /// Issued-at, seconds since epoch.
    pub iat: i64,
    /// Expiry, seconds since epoch.
    pub exp: i64,
    /// Unique token ID.
    pub jti: Uuid,
    /// Issuer.
    pub iss: String,
}

impl AccessClaims {
    /// Build claims for a session, valid for `ttl` from `now`.
    pub fn new(
        user_id: Uuid,
        tenant_id: Uuid,
        session_id: Uuid,
        role: UserRole,
        issuer: &str,
        now: DateTime<Utc>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            sub: user_id,
            tid: tenant_id,
            sid: session_id,
            role,
            iat: now.timestamp(),
            exp: saturating_add(now, ttl).timestamp(),
            jti: Uuid::new_v4(),
            iss: issuer.to_string(),
        }
    }

    /// Expiry as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Claims as decoded off the wire, before the required fields are checked.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawClaims {
    pub sub: Option<Uuid>,
    pub tid: Option<Uuid>,
    pub sid: Option<Uuid>,
    pub role: Option<UserRole>,
    pub iat: Option<i64>,
    pub exp: Option<i64>,
    pub jti: Option<Uuid>,
    pub iss: Option<String>,
}

impl RawClaims {
    /// Require subject, tenant, session and role. Returns `None` if any is missing.
    pub(crate) fn into_claims(self) -> Option<AccessClaims> {
        Some(AccessClaims {
            sub: self.sub?,
            tid: self.tid?,
            sid: self.sid?,
            role: self.role?,
            iat: self.iat.unwrap_or_default(),
            exp: self.exp?,
            jti: self.jti.unwrap_or_else(Uuid::nil),
            iss: self.iss.unwrap_or_default(),
        })
    }
}
