//! Turns tenant overrides plus a role into concrete session thresholds.

use chrono::{DateTime, Duration, Utc};

use tollgate_core::config::SessionConfig;
use tollgate_core::types::SessionLimit;
use tollgate_core::types::span::saturating_minutes;
use tollgate_entity::session::{Session, SessionPolicy};
use tollgate_entity::tenant::{SessionPolicyOverrides, Tenant};
use tollgate_entity::user::UserRole;

/// Pure policy resolution over the platform defaults. Performs no I/O.
#[derive(Debug, Clone)]
pub struct PolicyResolver {
    defaults: SessionConfig,
}

impl PolicyResolver {
    /// Create a resolver over the platform session defaults.
    pub fn new(defaults: SessionConfig) -> Self {
        Self { defaults }
    }

    /// Platform defaults this resolver falls back to.
    pub fn defaults(&self) -> &SessionConfig {
        &self.defaults
    }

    /// Resolve the policy for a tenant's settings blob.
    ///
    /// Absent settings, or absent fields, yield the platform defaults.
    pub fn resolve(&self, settings: Option<&serde_json::Value>) -> SessionPolicy {
        self.resolve_overrides(&SessionPolicyOverrides::from_settings(settings))
    }

    /// Resolve the policy for a tenant.
    pub fn resolve_for_tenant(&self, tenant: &Tenant) -> SessionPolicy {
        self.resolve(Some(&tenant.settings))
    }

    /// Merge parsed overrides over the platform defaults.
    pub fn resolve_overrides(&self, overrides: &SessionPolicyOverrides) -> SessionPolicy {
        let d = &self.defaults;
        SessionPolicy {
            idle_timeout_minutes: overrides
                .idle_timeout_minutes
                .unwrap_or(d.idle_timeout_minutes),
            absolute_timeout_minutes: overrides
                .absolute_timeout_minutes
                .unwrap_or(d.absolute_timeout_minutes),
            max_concurrent_sessions: SessionLimit::from(
                overrides
                    .max_concurrent_sessions
                    .unwrap_or(d.max_concurrent_sessions),
            ),
            concurrent_session_strategy: overrides
                .concurrent_session_strategy
                .unwrap_or(d.concurrent_session_strategy),
            binding_mode: overrides.session_binding_mode.unwrap_or(d.binding_mode),
            force_logout_on_role_change: overrides
                .force_logout_on_role_change
                .unwrap_or(d.force_logout_on_role_change),
            revoke_sessions_on_password_reset: overrides
                .revoke_sessions_on_password_reset
                .unwrap_or(d.revoke_sessions_on_password_reset),
        }
    }

    /// Platform-enforced maximum session duration for a role, if any.
    ///
    /// Tenants cannot loosen this ceiling.
    pub fn role_ceiling(&self, role: UserRole) -> Option<Duration> {
        self.defaults
            .role_max_session_minutes
            .get(role.as_str())
            .filter(|minutes| **minutes > 0)
            .map(|minutes| saturating_minutes(*minutes))
    }

    /// Whether the session has reached its role's maximum duration at `now`.
    pub fn exceeds_role_ceiling(
        &self,
        session: &Session,
        role: UserRole,
        now: DateTime<Utc>,
    ) -> bool {
        self.role_ceiling(role)
            .is_some_and(|ceiling| session.age_at(now) >= ceiling)
    }
}

impl Default for PolicyResolver {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
