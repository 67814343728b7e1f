//! Expired-row cleanup.
//!
//! Timeouts are enforced lazily at refresh and verification time; this sweep
//! only reclaims rows that can never be used again.

use std::sync::Arc;

use tracing::{error, info};

use tollgate_core::traits::Clock;
use tollgate_database::PasswordResetRepository;

use crate::error::AuthResult;

use super::store::SessionStore;

/// Rows removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CleanupReport {
    /// Sessions whose refresh window had closed.
    pub sessions: u64,
    /// Reset tokens that had expired.
    pub reset_tokens: u64,
}

/// Deletes expired sessions and reset tokens.
#[derive(Clone)]
pub struct SessionCleanup {
    sessions: Arc<SessionStore>,
    reset_tokens: Arc<dyn PasswordResetRepository>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionCleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCleanup").finish()
    }
}

impl SessionCleanup {
    /// Creates a new cleanup handler.
    pub fn new(
        sessions: Arc<SessionStore>,
        reset_tokens: Arc<dyn PasswordResetRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            reset_tokens,
            clock,
        }
    }

    /// Run one sweep.
    ///
    /// A failure on one table does not stop the other; the first error is
    /// returned after both ran.
    pub async fn sweep(&self) -> AuthResult<CleanupReport> {
        let now = self.clock.now();
        let mut report = CleanupReport::default();

        let sessions = self.sessions.delete_expired(now).await;
        let reset_tokens = self.reset_tokens.delete_expired(now).await;

        match &sessions {
            Ok(count) => report.sessions = *count,
            Err(e) => error!(error = %e, "Failed to delete expired sessions"),
        }
        match &reset_tokens {
            Ok(count) => report.reset_tokens = *count,
            Err(e) => error!(error = %e, "Failed to delete expired reset tokens"),
        }
        sessions?;
        reset_tokens?;

        if report.sessions > 0 || report.reset_tokens > 0 {
            info!(
                sessions = report.sessions,
                reset_tokens = report.reset_tokens,
                "Expired rows cleaned up"
            );
        }
        Ok(report)
    }
}
