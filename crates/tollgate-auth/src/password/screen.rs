//! Compromised or guessable password screening.

use std::collections::HashSet;

use async_trait::async_trait;

use tollgate_core::result::AppResult;

/// Opaque screen run on every new password after the policy rules pass.
#[async_trait]
pub trait PasswordScreen: Send + Sync + 'static {
    /// Return the reason the password is rejected, or `None` if it passes.
    ///
    /// `context` holds user-specific words (email, display name) the
    /// password should not be built from.
    async fn screen(&self, password: &str, context: &[&str]) -> AppResult<Option<String>>;
}

/// Rejects passwords whose zxcvbn score is below the configured minimum.
#[derive(Debug, Clone)]
pub struct EntropyScreen {
    min_score: u8,
}

impl EntropyScreen {
    /// Create a screen with a minimum zxcvbn score (0-4).
    pub fn new(min_score: u8) -> Self {
        Self {
            min_score: min_score.min(4),
        }
    }
}

#[async_trait]
impl PasswordScreen for EntropyScreen {
    async fn screen(&self, password: &str, context: &[&str]) -> AppResult<Option<String>> {
        let estimate = zxcvbn::zxcvbn(password, context);
        let score = u8::from(estimate.score());
        if score < self.min_score {
            return Ok(Some("not a commonly used or easily guessed password".to_string()));
        }
        Ok(None)
    }
}

/// Rejects passwords that appear in a fixed list, case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct DenylistScreen {
    denied: HashSet<String>,
}

impl DenylistScreen {
    /// Create a screen over the given passwords.
    pub fn new<I, S>(passwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            denied: passwords
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }
}

#[async_trait]
impl PasswordScreen for DenylistScreen {
    async fn screen(&self, password: &str, _context: &[&str]) -> AppResult<Option<String>> {
        if self.denied.contains(&password.to_lowercase()) {
            return Ok(Some("not a known compromised password".to_string()));
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_entropy_screen_rejects_common_password() {
        let screen = EntropyScreen::new(3);
        assert!(screen.screen("password123", &[]).await.unwrap().is_some());
        assert!(
            screen
                .screen("cobalt-harbor-lantern-917", &[])
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_denylist_is_case_insensitive() {
        let screen = DenylistScreen::new(["Correct Horse 1234"]);
        assert!(screen.screen("correct horse 1234", &[]).await.unwrap().is_some());
        assert!(screen.screen("valid pass 1234", &[]).await.unwrap().is_none());
    }
}
