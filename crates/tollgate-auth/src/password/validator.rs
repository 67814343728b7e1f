//! Password policy enforcement for new passwords.

use tollgate_core::config::PasswordConfig;

/// Checks length and character-class rules.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    config: PasswordConfig,
}

impl PasswordValidator {
    /// Create a validator from the password configuration.
    pub fn new(config: PasswordConfig) -> Self {
        Self { config }
    }

    /// Return every requirement the password fails. Empty means acceptable.
    pub fn unmet_requirements(&self, password: &str) -> Vec<String> {
        let c = &self.config;
        let mut unmet = Vec::new();
        let length = password.chars().count();

        if length < c.min_length {
            unmet.push(format!("at least {} characters", c.min_length));
        }
        if length > c.max_length {
            unmet.push(format!("at most {} characters", c.max_length));
        }
        if c.require_letter && !password.chars().any(char::is_alphabetic) {
            unmet.push("at least one letter".to_string());
        }
        if c.require_uppercase && !password.chars().any(char::is_uppercase) {
            unmet.push("at least one uppercase letter".to_string());
        }
        if c.require_digit && !password.chars().any(|ch| ch.is_ascii_digit()) {
            unmet.push("at least one digit".to_string());
        }
        if c.require_symbol
            && !password
                .chars()
                .any(|ch| !ch.is_alphanumeric() && !ch.is_whitespace())
        {
            unmet.push("at least one symbol".to_string());
        }

        unmet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reports_all_unmet_requirements() {
        let validator = PasswordValidator::new(PasswordConfig {
            require_uppercase: true,
            require_symbol: true,
            ..PasswordConfig::default()
        });
        let unmet = validator.unmet_requirements("short");
        assert_eq!(
            unmet,
            vec![
                "at least 12 characters",
                "at least one uppercase letter",
                "at least one digit",
                "at least one symbol",
            ]
        );
    }

    #[test]
    fn test_default_policy_accepts_spaced_passphrase() {
        let validator = PasswordValidator::new(PasswordConfig::default());
        assert!(validator.unmet_requirements("valid pass 1234").is_empty());
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        let validator = PasswordValidator::new(PasswordConfig {
            min_length: 4,
            require_digit: false,
            ..PasswordConfig::default()
        });
        assert!(!validator.unmet_requirements("ééé").is_empty());
        assert!(validator.unmet_requirements("éééé").is_empty());
    }
}
