//! Platform session policy defaults.
//!
//! Tenants override these through their settings blob; anything a tenant
//! leaves unset falls back to the values here.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Session management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle timeout in minutes (maximum gap between refreshes).
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_minutes: u64,
    /// Absolute timeout in minutes (maximum session lifetime).
    #[serde(default = "default_absolute_timeout")]
    pub absolute_timeout_minutes: u64,
    /// Maximum concurrent sessions per user. `0` means unlimited.
    #[serde(default = "default_max_sessions")]
    pub max_concurrent_sessions: u32,
    /// What to do when a login would exceed the maximum.
    #[serde(default)]
    pub concurrent_session_strategy: ConcurrentSessionStrategy,
    /// Which request attributes a session is bound to.
    #[serde(default)]
    pub binding_mode: BindingMode,
    /// Revoke a user's sessions when their role changes.
    #[serde(default)]
    pub force_logout_on_role_change: bool,
    /// Revoke a user's sessions after a password reset.
    #[serde(default = "default_true")]
    pub revoke_sessions_on_password_reset: bool,
    /// Platform-enforced maximum session duration per role, in minutes.
    /// Roles not listed have no ceiling beyond the tenant's absolute timeout.
    #[serde(default = "default_role_ceilings")]
    pub role_max_session_minutes: HashMap<String, u64>,
    /// Update `last_active_at` when an access token is verified.
    #[serde(default)]
    pub touch_on_access: bool,
    /// Interval between expired-row sweeps in minutes.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_minutes: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: default_idle_timeout(),
            absolute_timeout_minutes: default_absolute_timeout(),
            max_concurrent_sessions: default_max_sessions(),
            concurrent_session_strategy: ConcurrentSessionStrategy::default(),
            binding_mode: BindingMode::default(),
            force_logout_on_role_change: false,
            revoke_sessions_on_password_reset: true,
            role_max_session_minutes: default_role_ceilings(),
            touch_on_access: false,
            cleanup_interval_minutes: default_cleanup_interval(),
        }
    }
}

/// Strategy applied when a login would exceed the concurrent-session maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrentSessionStrategy {
    /// Fail the new login.
    RejectNewest,
    /// Delete the oldest sessions to make room.
    #[default]
    EvictOldest,
}

impl ConcurrentSessionStrategy {
    /// Return the strategy as its configuration string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RejectNewest => "reject_newest",
            Self::EvictOldest => "evict_oldest",
        }
    }
}

impl fmt::Display for ConcurrentSessionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConcurrentSessionStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject_newest" => Ok(Self::RejectNewest),
            "evict_oldest" => Ok(Self::EvictOldest),
            _ => Err(AppError::validation(format!(
                "Invalid concurrent session strategy: '{s}'. Expected reject_newest or evict_oldest"
            ))),
        }
    }
}

/// Request attributes a session is tied to at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingMode {
    /// No binding.
    #[default]
    None,
    /// Bound to the client IP address.
    Ip,
    /// Bound to the device fingerprint.
    Device,
    /// Bound to both.
    Both,
}

impl BindingMode {
    /// Whether the IP address must match.
    pub fn binds_ip(&self) -> bool {
        matches!(self, Self::Ip | Self::Both)
    }

    /// Whether the device fingerprint must match.
    pub fn binds_device(&self) -> bool {
        matches!(self, Self::Device | Self::Both)
    }

    /// Return the mode as its configuration string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Ip => "ip",
            Self::Device => "device",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for BindingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BindingMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "ip" => Ok(Self::Ip),
            "device" => Ok(Self::Device),
            "both" => Ok(Self::Both),
            _ => Err(AppError::validation(format!(
                "Invalid session binding mode: '{s}'. Expected one of: none, ip, device, both"
            ))),
        }
    }
}

fn default_idle_timeout() -> u64 {
    60 * 24 * 7
}

fn default_absolute_timeout() -> u64 {
    60 * 24 * 30
}

fn default_max_sessions() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_cleanup_interval() -> u64 {
    15
}

fn default_role_ceilings() -> HashMap<String, u64> {
    let mut map = HashMap::new();
    map.insert("owner".to_string(), 60 * 24 * 7);
    map.insert("admin".to_string(), 60 * 24 * 7);
    map
}
