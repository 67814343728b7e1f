//! Typed failures of the session authority.
//!
//! Every lifecycle operation returns [`AuthResult`], so callers can match
//! exhaustively on the failure kind instead of parsing messages.

use thiserror::Error;
use uuid::Uuid;

use tollgate_core::error::{AppError, ErrorKind};
use tollgate_entity::tenant::TenantStatus;

/// Result alias for session authority operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// A request attribute that a bound session did not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingAttribute {
    /// Client IP address.
    IpAddress,
    /// Client device fingerprint.
    DeviceFingerprint,
}

impl BindingAttribute {
    /// Return the attribute as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IpAddress => "ip_address",
            Self::DeviceFingerprint => "device_fingerprint",
        }
    }
}

/// Failure union of the session authority.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Bad email or password, missing or garbled refresh token, or any case
    /// where a more precise answer would leak information.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("session has expired")]
    SessionExpired,

    /// The access token names a session that no longer exists.
    #[error("session has been revoked")]
    SessionRevoked,

    #[error("session exceeded its idle timeout")]
    SessionIdleTimeout,

    #[error("session exceeded its absolute timeout")]
    SessionAbsoluteTimeout,

    /// The request context did not match the attributes the session is bound to.
    #[error("session binding violated: {}", join_attributes(.attributes))]
    SessionBindingViolation {
        /// Attributes that were required and did not match.
        attributes: Vec<BindingAttribute>,
    },

    #[error("concurrent session limit reached ({current} of {max})")]
    SessionConcurrentLimit {
        /// Configured maximum.
        max: u32,
        /// Sessions that currently exist.
        current: u64,
    },

    #[error("a user with this email already exists")]
    UserExists,

    #[error("password does not meet policy: {}", .unmet.join(", "))]
    PasswordPolicyViolation {
        /// Human-readable requirements the password failed.
        unmet: Vec<String>,
    },

    #[error("tenant {tenant_id} is {status}")]
    TenantInactive {
        /// The tenant.
        tenant_id: Uuid,
        /// Its current status.
        status: TenantStatus,
    },

    #[error("tenant not found")]
    TenantNotFound,

    #[error("session not found")]
    SessionNotFound,

    #[error("password reset token is invalid")]
    PasswordResetTokenInvalid,

    #[error("password reset token has expired")]
    PasswordResetTokenExpired,

    #[error("password reset token was already used")]
    PasswordResetTokenAlreadyUsed,

    #[error("too many attempts, retry after {retry_after_secs}s")]
    RateLimited {
        /// Seconds until another attempt is accepted.
        retry_after_secs: u64,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    /// Store or infrastructure failure. Never distinguished further for callers.
    #[error("internal error")]
    Internal(#[source] AppError),
}

impl AuthError {
    /// Stable snake_case code for the failure kind.
    pub fn kind_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::SessionExpired => "session_expired",
            Self::SessionRevoked => "session_revoked",
            Self::SessionIdleTimeout => "session_idle_timeout",
            Self::SessionAbsoluteTimeout => "session_absolute_timeout",
            Self::SessionBindingViolation { .. } => "session_binding_violation",
            Self::SessionConcurrentLimit { .. } => "session_concurrent_limit",
            Self::UserExists => "user_exists",
            Self::PasswordPolicyViolation { .. } => "password_policy_violation",
            Self::TenantInactive { .. } => "tenant_inactive",
            Self::TenantNotFound => "tenant_not_found",
            Self::SessionNotFound => "session_not_found",
            Self::PasswordResetTokenInvalid => "password_reset_token_invalid",
            Self::PasswordResetTokenExpired => "password_reset_token_expired",
            Self::PasswordResetTokenAlreadyUsed => "password_reset_token_already_used",
            Self::RateLimited { .. } => "rate_limited",
            Self::Validation(_) => "validation",
            Self::Internal(_) => "internal",
        }
    }

    /// Whether the failure ended the presented session.
    pub fn terminates_session(&self) -> bool {
        matches!(
            self,
            Self::SessionExpired
                | Self::SessionIdleTimeout
                | Self::SessionAbsoluteTimeout
                | Self::SessionBindingViolation { .. }
        )
    }
}

fn join_attributes(attributes: &[BindingAttribute]) -> String {
    attributes
        .iter()
        .map(BindingAttribute::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        Self::Internal(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let err = match err {
            AuthError::Internal(inner) => return inner,
            other => other,
        };
        let kind = match &err {
            AuthError::InvalidCredentials
            | AuthError::SessionExpired
            | AuthError::SessionRevoked
            | AuthError::SessionIdleTimeout
            | AuthError::SessionAbsoluteTimeout
            | AuthError::SessionBindingViolation { .. } => ErrorKind::Authentication,
            AuthError::SessionConcurrentLimit { .. } => ErrorKind::Session,
            AuthError::UserExists => ErrorKind::Conflict,
            AuthError::PasswordPolicyViolation { .. }
            | AuthError::Validation(_)
            | AuthError::PasswordResetTokenInvalid
            | AuthError::PasswordResetTokenExpired
            | AuthError::PasswordResetTokenAlreadyUsed => ErrorKind::Validation,
            AuthError::TenantInactive { .. } => ErrorKind::Authorization,
            AuthError::TenantNotFound | AuthError::SessionNotFound => ErrorKind::NotFound,
            AuthError::RateLimited { .. } => ErrorKind::RateLimit,
            AuthError::Internal(_) => ErrorKind::Internal,
        };
        AppError::new(kind, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_violation_names_attributes() {
        let err = AuthError::SessionBindingViolation {
            attributes: vec![BindingAttribute::IpAddress, BindingAttribute::DeviceFingerprint],
        };
        assert_eq!(
            err.to_string(),
            "session binding violated: ip_address, device_fingerprint"
        );
        assert_eq!(err.kind_code(), "session_binding_violation");
        assert!(err.terminates_session());
    }

    #[test]
    fn test_internal_round_trips_app_error() {
        let err: AuthError = AppError::database("connection reset").into();
        assert_eq!(err.to_string(), "internal error");
        let back: AppError = err.into();
        assert_eq!(back.kind, ErrorKind::Database);
        assert_eq!(back.message, "connection reset");
    }

    #[test]
    fn test_kind_mapping() {
        let app: AppError = AuthError::UserExists.into();
        assert_eq!(app.kind, ErrorKind::Conflict);
        let app: AppError = AuthError::SessionConcurrentLimit { max: 3, current: 3 }.into();
        assert_eq!(app.kind, ErrorKind::Session);
        assert!(app.message.contains("3 of 3"));
    }
}
