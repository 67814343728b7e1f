//! Abuse/rate signal consulted before login and registration.

use async_trait::async_trait;

/// Outcome of an abuse check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbuseVerdict {
    /// Whether the attempt may proceed.
    pub allowed: bool,
    /// Attempts allowed per window.
    pub limit: u32,
    /// Attempts left in the current window.
    pub remaining: u32,
    /// Seconds until the window resets.
    pub retry_after_secs: u64,
}

impl AbuseVerdict {
    /// A verdict that always allows and carries no limit.
    pub fn unlimited() -> Self {
        Self {
            allowed: true,
            limit: u32::MAX,
            remaining: u32::MAX,
            retry_after_secs: 0,
        }
    }

    /// Header annotations for the calling layer.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("x-ratelimit-limit", self.limit.to_string()),
            ("x-ratelimit-remaining", self.remaining.to_string()),
        ];
        if !self.allowed {
            headers.push(("retry-after", self.retry_after_secs.to_string()));
        }
        headers
    }
}

/// External abuse check. Opaque pass/fail plus annotation data.
#[async_trait]
pub trait AbuseGuard: Send + Sync + 'static {
    /// Check whether another attempt for `key` is permitted.
    async fn check(&self, key: &str) -> AbuseVerdict;

    /// Record a failed attempt for `key`.
    async fn record_failure(&self, key: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_include_retry_after_only_when_blocked() {
        let mut verdict = AbuseVerdict {
            allowed: true,
            limit: 5,
            remaining: 2,
            retry_after_secs: 40,
        };
        assert_eq!(verdict.headers().len(), 2);

        verdict.allowed = false;
        let headers = verdict.headers();
        assert!(headers.contains(&("retry-after", "40".to_string())));
    }
}
