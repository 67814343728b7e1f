//! Abuse limiting configuration.

use serde::{Deserialize, Serialize};

/// Fixed-window attempt limiting for login and registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbuseConfig {
    /// Whether limiting is enabled at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Failed attempts allowed per key within one window.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Window length in seconds.
    #[serde(default = "default_window")]
    pub window_seconds: u64,
}

impl Default for AbuseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            window_seconds: default_window(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    10
}

fn default_window() -> u64 {
    900
}
