//! Tenant lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "tenant_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    /// Paying, fully enabled tenant.
    Active,
    /// Evaluation tenant.
    Trial,
    /// Temporarily blocked (billing, abuse review).
    Suspended,
    /// Permanently switched off.
    Disabled,
}

impl TenantStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Trial => "trial",
            Self::Suspended => "suspended",
            Self::Disabled => "disabled",
        }
    }

    /// Whether this status appears in an allowed-status list.
    ///
    /// Comparison is case-insensitive; an empty list allows nothing.
    pub fn is_allowed_by(&self, allowed: &[String]) -> bool {
        allowed.iter().any(|s| s.eq_ignore_ascii_case(self.as_str()))
    }
}

impl fmt::Display for TenantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TenantStatus {
    type Err = tollgate_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "trial" => Ok(Self::Trial),
            "suspended" => Ok(Self::Suspended),
            "disabled" => Ok(Self::Disabled),
            _ => Err(tollgate_core::AppError::validation(format!(
                "Invalid tenant status: '{s}'. Expected one of: active, trial, suspended, disabled"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_set_is_fail_closed() {
        let allowed = vec!["active".to_string(), "TRIAL".to_string()];
        assert!(TenantStatus::Active.is_allowed_by(&allowed));
        assert!(TenantStatus::Trial.is_allowed_by(&allowed));
        assert!(!TenantStatus::Suspended.is_allowed_by(&allowed));
        assert!(!TenantStatus::Active.is_allowed_by(&[]));
    }
}
