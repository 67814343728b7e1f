//! Fixed-window failure counting for single-node deployments.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::warn;

use tollgate_core::config::AbuseConfig;
use tollgate_core::traits::{AbuseGuard, AbuseVerdict, Clock};
use tollgate_core::types::span::{saturating_add, saturating_seconds};

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: DateTime<Utc>,
    failures: u32,
}

/// Counts failures per key in fixed windows and blocks once the limit is hit.
#[derive(Clone)]
pub struct MemoryAbuseGuard {
    windows: Arc<Mutex<HashMap<String, Window>>>,
    max_attempts: u32,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for MemoryAbuseGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAbuseGuard")
            .field("max_attempts", &self.max_attempts)
            .field("window", &self.window)
            .finish()
    }
}

impl MemoryAbuseGuard {
    /// Create a guard from the abuse configuration.
    pub fn new(config: &AbuseConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_attempts: config.max_attempts.max(1),
            window: saturating_seconds(config.window_seconds),
            clock,
        }
    }

    fn is_open(&self, window: &Window, now: DateTime<Utc>) -> bool {
        now < saturating_add(window.started_at, self.window)
    }

    fn retry_after(&self, window: &Window, now: DateTime<Utc>) -> u64 {
        let remaining = saturating_add(window.started_at, self.window) - now;
        u64::try_from(remaining.num_seconds()).unwrap_or(0)
    }
}

#[async_trait]
impl AbuseGuard for MemoryAbuseGuard {
    async fn check(&self, key: &str) -> AbuseVerdict {
        let now = self.clock.now();
        let mut windows = self.windows.lock().await;

        let current = match windows.get(key) {
            Some(w) if self.is_open(w, now) => Some(*w),
            Some(_) => {
                windows.remove(key);
                None
            }
            None => None,
        };

        match current {
            Some(w) => AbuseVerdict {
                allowed: w.failures < self.max_attempts,
                limit: self.max_attempts,
                remaining: self.max_attempts.saturating_sub(w.failures),
                retry_after_secs: self.retry_after(&w, now),
            },
            None => AbuseVerdict {
                allowed: true,
                limit: self.max_attempts,
                remaining: self.max_attempts,
                retry_after_secs: 0,
            },
        }
    }

    async fn record_failure(&self, key: &str) {
        let now = self.clock.now();
        let mut windows = self.windows.lock().await;
        windows.retain(|_, w| self.is_open(w, now));
        let window = windows.entry(key.to_string()).or_insert(Window {
            started_at: now,
            failures: 0,
        });
        window.failures = window.failures.saturating_add(1);
        if window.failures == self.max_attempts {
            warn!(key = %key, failures = window.failures, "Abuse limit reached");
        }
    }
}

/// Allows everything. Used when abuse limiting is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAbuseGuard;

#[async_trait]
impl AbuseGuard for NoopAbuseGuard {
    async fn check(&self, _key: &str) -> AbuseVerdict {
        AbuseVerdict::unlimited()
    }

    async fn record_failure(&self, _key: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_core::traits::ManualClock;

    fn guard(clock: &ManualClock) -> MemoryAbuseGuard {
        MemoryAbuseGuard::new(
            &AbuseConfig {
                enabled: true,
                max_attempts: 3,
                window_seconds: 60,
            },
            Arc::new(clock.clone()),
        )
    }

    #[tokio::test]
    async fn test_blocks_after_max_failures_until_window_ends() {
        let clock = ManualClock::default();
        let guard = guard(&clock);

        for _ in 0..3 {
            assert!(guard.check("login:a@x.com").await.allowed);
            guard.record_failure("login:a@x.com").await;
        }
        let verdict = guard.check("login:a@x.com").await;
        assert!(!verdict.allowed);
        assert_eq!(verdict.remaining, 0);
        assert_eq!(verdict.retry_after_secs, 60);
        assert!(guard.check("login:b@x.com").await.allowed);

        clock.advance(Duration::seconds(60));
        let verdict = guard.check("login:a@x.com").await;
        assert!(verdict.allowed);
        assert_eq!(verdict.remaining, 3);
    }

    #[tokio::test]
    async fn test_expired_windows_are_dropped() {
        let clock = ManualClock::default();
        let guard = guard(&clock);

        for i in 0..100 {
            guard.record_failure(&format!("login:user{i}@x.com")).await;
        }
        assert_eq!(guard.windows.lock().await.len(), 100);

        clock.advance(Duration::seconds(60));
        guard.record_failure("login:fresh@x.com").await;
        let windows = guard.windows.lock().await;
        assert_eq!(windows.len(), 1);
        assert!(windows.contains_key("login:fresh@x.com"));
    }

    #[tokio::test]
    async fn test_noop_always_allows() {
        let guard = NoopAbuseGuard;
        guard.record_failure("k").await;
        assert!(guard.check("k").await.allowed);
    }
}
