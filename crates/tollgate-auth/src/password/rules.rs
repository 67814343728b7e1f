//! Combined policy and screening check applied to every new password.

use std::sync::Arc;

use tracing::debug;

use crate::error::{AuthError, AuthResult};

use super::screen::PasswordScreen;
use super::validator::PasswordValidator;

/// Length and character-class rules followed by the compromised-password screen.
#[derive(Clone)]
pub struct PasswordRules {
    validator: PasswordValidator,
    screen: Arc<dyn PasswordScreen>,
}

impl std::fmt::Debug for PasswordRules {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordRules")
            .field("validator", &self.validator)
            .finish()
    }
}

impl PasswordRules {
    /// Create the rule set.
    pub fn new(validator: PasswordValidator, screen: Arc<dyn PasswordScreen>) -> Self {
        Self { validator, screen }
    }

    /// Reject a password that fails any rule.
    ///
    /// `context` holds user-specific strings (email, display name) that the
    /// screen should treat as guessable.
    pub async fn enforce(&self, password: &str, context: &[&str]) -> AuthResult<()> {
        let unmet = self.validator.unmet_requirements(password);
        if !unmet.is_empty() {
            debug!(unmet = unmet.len(), "Password rejected by policy");
            return Err(AuthError::PasswordPolicyViolation { unmet });
        }

        if let Some(reason) = self.screen.screen(password, context).await? {
            debug!("Password rejected by screen");
            return Err(AuthError::PasswordPolicyViolation {
                unmet: vec![reason],
            });
        }

        Ok(())
    }
}
