//! Typed view of the session section of a tenant's settings blob.
//!
//! The blob is stored untyped. Only the keys listed here are read; unknown
//! keys are ignored and malformed values fall back to platform defaults, so
//! a bad setting can never fail a login.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use tollgate_core::config::session::{BindingMode, ConcurrentSessionStrategy};

/// Key of the session section inside the tenant settings blob.
pub const SESSION_SETTINGS_KEY: &str = "session";

/// Recognised keys, camelCase first with the accepted snake_case alias.
const KNOWN_KEYS: &[(&str, &str)] = &[
    ("idleTimeoutMinutes", "idle_timeout_minutes"),
    ("absoluteTimeoutMinutes", "absolute_timeout_minutes"),
    ("maxConcurrentSessions", "max_concurrent_sessions"),
    ("concurrentSessionStrategy", "concurrent_session_strategy"),
    ("sessionBindingMode", "session_binding_mode"),
    ("forceLogoutOnRoleChange", "force_logout_on_role_change"),
    ("revokeSessionsOnPasswordReset", "revoke_sessions_on_password_reset"),
];

/// Per-tenant overrides of the platform session policy. `None` means
/// "use the platform default".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPolicyOverrides {
    /// Idle timeout in minutes. Zero is treated as unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idle_timeout_minutes: Option<u64>,
    /// Absolute timeout in minutes. Zero is treated as unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute_timeout_minutes: Option<u64>,
    /// Maximum concurrent sessions per user. `0` means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_sessions: Option<u32>,
    /// Strategy when the maximum is reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrent_session_strategy: Option<ConcurrentSessionStrategy>,
    /// Session binding mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_binding_mode: Option<BindingMode>,
    /// Revoke sessions when a user's role changes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_logout_on_role_change: Option<bool>,
    /// Revoke sessions after a password reset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoke_sessions_on_password_reset: Option<bool>,
}

impl SessionPolicyOverrides {
    /// Read overrides from a tenant settings blob. Never fails.
    pub fn from_settings(settings: Option<&Value>) -> Self {
        let Some(section) = settings
            .and_then(|s| s.get(SESSION_SETTINGS_KEY))
            .and_then(Value::as_object)
        else {
            return Self::default();
        };

        for key in section.keys() {
            let known = KNOWN_KEYS
                .iter()
                .any(|(camel, snake)| key == camel || key == snake);
            if !known {
                debug!(key = %key, "Ignoring unknown session setting");
            }
        }

        Self {
            idle_timeout_minutes: field::<u64>(section, 0).filter(|v| *v > 0),
            absolute_timeout_minutes: field::<u64>(section, 1).filter(|v| *v > 0),
            max_concurrent_sessions: field(section, 2),
            concurrent_session_strategy: field(section, 3),
            session_binding_mode: field(section, 4),
            force_logout_on_role_change: field(section, 5),
            revoke_sessions_on_password_reset: field(section, 6),
        }
    }

    /// Write these overrides into a settings blob, replacing its session section.
    pub fn apply_to(&self, settings: &mut Value) -> Result<(), serde_json::Error> {
        let section = serde_json::to_value(self)?;
        if !settings.is_object() {
            *settings = Value::Object(Map::new());
        }
        if let Some(map) = settings.as_object_mut() {
            map.insert(SESSION_SETTINGS_KEY.to_string(), section);
        }
        Ok(())
    }
}

fn field<T: DeserializeOwned>(section: &Map<String, Value>, index: usize) -> Option<T> {
    let (camel, snake) = KNOWN_KEYS[index];
    let value = section.get(camel).or_else(|| section.get(snake))?;
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(key = camel, error = %e, "Ignoring malformed session setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_settings_yield_no_overrides() {
        assert_eq!(
            SessionPolicyOverrides::from_settings(None),
            SessionPolicyOverrides::default()
        );
        assert_eq!(
            SessionPolicyOverrides::from_settings(Some(&json!({"theme": "dark"}))),
            SessionPolicyOverrides::default()
        );
    }

    #[test]
    fn test_parses_camel_and_snake_keys() {
        let settings = json!({
            "session": {
                "idleTimeoutMinutes": 30,
                "max_concurrent_sessions": 3,
                "concurrentSessionStrategy": "reject_newest",
                "sessionBindingMode": "both",
                "forceLogoutOnRoleChange": true
            }
        });
        let overrides = SessionPolicyOverrides::from_settings(Some(&settings));
        assert_eq!(overrides.idle_timeout_minutes, Some(30));
        assert_eq!(overrides.max_concurrent_sessions, Some(3));
        assert_eq!(
            overrides.concurrent_session_strategy,
            Some(ConcurrentSessionStrategy::RejectNewest)
        );
        assert_eq!(overrides.session_binding_mode, Some(BindingMode::Both));
        assert_eq!(overrides.force_logout_on_role_change, Some(true));
        assert_eq!(overrides.absolute_timeout_minutes, None);
    }

    #[test]
    fn test_malformed_and_unknown_values_are_ignored() {
        let settings = json!({
            "session": {
                "idleTimeoutMinutes": "soon",
                "absoluteTimeoutMinutes": 0,
                "sessionBindingMode": "retina",
                "pollInterval": 5
            }
        });
        let overrides = SessionPolicyOverrides::from_settings(Some(&settings));
        assert_eq!(overrides, SessionPolicyOverrides::default());
    }

    #[test]
    fn test_apply_to_preserves_other_settings() {
        let mut settings = json!({"theme": "dark"});
        let overrides = SessionPolicyOverrides {
            max_concurrent_sessions: Some(2),
            ..Default::default()
        };
        overrides.apply_to(&mut settings).unwrap();
        assert_eq!(settings["theme"], "dark");
        assert_eq!(settings["session"]["maxConcurrentSessions"], 2);
        assert_eq!(SessionPolicyOverrides::from_settings(Some(&settings)), overrides);
    }
}
