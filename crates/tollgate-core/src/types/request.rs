//! Request attributes observed by the calling layer.

use serde::{Deserialize, Serialize};

/// Client attributes presented with a login, registration, or refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Client IP address as reported by the edge.
    pub ip_address: Option<String>,
    /// Stable device fingerprint supplied by the client.
    pub device_fingerprint: Option<String>,
    /// User-Agent header value.
    pub user_agent: Option<String>,
}

impl RequestContext {
    /// Context with only an IP address.
    pub fn from_ip(ip: impl Into<String>) -> Self {
        Self {
            ip_address: Some(ip.into()),
            ..Self::default()
        }
    }

    /// Attach a device fingerprint.
    pub fn with_device(mut self, fingerprint: impl Into<String>) -> Self {
        self.device_fingerprint = Some(fingerprint.into());
        self
    }
}
