//! Derived session policy.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use tollgate_core::config::session::{BindingMode, ConcurrentSessionStrategy};
use tollgate_core::types::span::saturating_minutes;
use tollgate_core::types::SessionLimit;

use super::model::Session;

/// Concrete session thresholds for one tenant and role.
///
/// Computed per request from tenant settings and never persisted or cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPolicy {
    /// Maximum gap between refreshes, in minutes.
    pub idle_timeout_minutes: u64,
    /// Maximum session lifetime, in minutes.
    pub absolute_timeout_minutes: u64,
    /// Maximum concurrent sessions per user.
    pub max_concurrent_sessions: SessionLimit,
    /// What happens when a login would exceed the maximum.
    pub concurrent_session_strategy: ConcurrentSessionStrategy,
    /// Request attributes the session is bound to.
    pub binding_mode: BindingMode,
    /// Revoke sessions when the user's role changes.
    pub force_logout_on_role_change: bool,
    /// Revoke sessions after a password reset.
    pub revoke_sessions_on_password_reset: bool,
}

/// Which timeout a session violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutKind {
    /// Too long since the last activity.
    Idle,
    /// Too long since creation.
    Absolute,
}

impl SessionPolicy {
    /// Idle timeout as a duration.
    pub fn idle_timeout(&self) -> Duration {
        saturating_minutes(self.idle_timeout_minutes)
    }

    /// Absolute timeout as a duration.
    pub fn absolute_timeout(&self) -> Duration {
        saturating_minutes(self.absolute_timeout_minutes)
    }

    /// Check both timeouts. Reaching a limit exactly counts as expired.
    pub fn timeout_violation(&self, session: &Session, now: DateTime<Utc>) -> Option<TimeoutKind> {
        if session.idle_for(now) >= self.idle_timeout() {
            return Some(TimeoutKind::Idle);
        }
        if session.age_at(now) >= self.absolute_timeout() {
            return Some(TimeoutKind::Absolute);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn policy(idle: u64, absolute: u64) -> SessionPolicy {
        SessionPolicy {
            idle_timeout_minutes: idle,
            absolute_timeout_minutes: absolute,
            max_concurrent_sessions: SessionLimit::Unlimited,
            concurrent_session_strategy: ConcurrentSessionStrategy::EvictOldest,
            binding_mode: BindingMode::None,
            force_logout_on_role_change: false,
            revoke_sessions_on_password_reset: true,
        }
    }

    fn session(created: DateTime<Utc>, last_active: Option<DateTime<Utc>>) -> Session {
        Session {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            token_hash: "h".into(),
            expires_at: created + Duration::days(30),
            created_at: created,
            last_active_at: last_active,
            ip_address: None,
            device_fingerprint: None,
            user_agent: None,
        }
    }

    #[test]
    fn test_idle_boundary_is_expired() {
        let created = Utc::now();
        let p = policy(30, 600);
        let s = session(created, None);
        assert_eq!(p.timeout_violation(&s, created + Duration::minutes(29)), None);
        assert_eq!(
            p.timeout_violation(&s, created + Duration::minutes(30)),
            Some(TimeoutKind::Idle)
        );
    }

    #[test]
    fn test_absolute_timeout_despite_activity() {
        let created = Utc::now();
        let p = policy(30, 60);
        let now = created + Duration::minutes(61);
        let s = session(created, Some(now - Duration::minutes(1)));
        assert_eq!(p.timeout_violation(&s, now), Some(TimeoutKind::Absolute));
    }

    #[test]
    fn test_out_of_range_timeouts_never_expire() {
        let created = Utc::now();
        let p = policy(1_000_000_000_000_000, u64::MAX);
        let s = session(created, None);
        assert_eq!(p.idle_timeout(), Duration::MAX);
        assert_eq!(p.timeout_violation(&s, created + Duration::days(3650)), None);
    }
}
