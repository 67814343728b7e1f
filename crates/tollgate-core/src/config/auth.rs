//! Token issuance and tenant-resolution configuration.

use serde::{Deserialize, Serialize};

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret key for access-token signing (HMAC-SHA256).
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Issuer (`iss`) embedded in and required on every access token.
    #[serde(default = "default_issuer")]
    pub jwt_issuer: String,
    /// Access token TTL in minutes.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_minutes: u64,
    /// Refresh token window in days, measured from issuance.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_days: u64,
    /// Password reset token lifetime in minutes.
    #[serde(default = "default_reset_ttl")]
    pub password_reset_ttl_minutes: u64,
    /// Slug of the tenant used when a request names no tenant.
    #[serde(default = "default_tenant_slug")]
    pub default_tenant_slug: String,
    /// Tenant statuses that permit login and refresh.
    #[serde(default = "default_allowed_statuses")]
    pub allowed_tenant_statuses: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            jwt_issuer: default_issuer(),
            access_token_ttl_minutes: default_access_ttl(),
            refresh_token_ttl_days: default_refresh_ttl(),
            password_reset_ttl_minutes: default_reset_ttl(),
            default_tenant_slug: default_tenant_slug(),
            allowed_tenant_statuses: default_allowed_statuses(),
        }
    }
}

fn default_jwt_secret() -> String {
    "CHANGE_ME_IN_PRODUCTION".to_string()
}

fn default_issuer() -> String {
    "tollgate".to_string()
}

fn default_access_ttl() -> u64 {
    15
}

fn default_refresh_ttl() -> u64 {
    30
}

fn default_reset_ttl() -> u64 {
    60
}

fn default_tenant_slug() -> String {
    "default".to_string()
}

fn default_allowed_statuses() -> Vec<String> {
    vec!["active".to_string(), "trial".to_string()]
}
