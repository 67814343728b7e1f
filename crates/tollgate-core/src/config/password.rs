//! Password policy and hashing cost configuration.

use serde::{Deserialize, Serialize};

/// Password policy enforced at registration and reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordConfig {
    /// Minimum length in characters.
    #[serde(default = "default_min_length")]
    pub min_length: usize,
    /// Maximum length in characters.
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Require at least one letter.
    #[serde(default = "default_true")]
    pub require_letter: bool,
    /// Require at least one ASCII digit.
    #[serde(default = "default_true")]
    pub require_digit: bool,
    /// Require at least one uppercase letter.
    #[serde(default)]
    pub require_uppercase: bool,
    /// Require at least one non-alphanumeric character.
    #[serde(default)]
    pub require_symbol: bool,
    /// Minimum zxcvbn score (0-4) accepted by the entropy screen.
    #[serde(default = "default_min_score")]
    pub min_entropy_score: u8,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_memory")]
    pub argon2_memory_kib: u32,
    /// Argon2 iteration count.
    #[serde(default = "default_iterations")]
    pub argon2_iterations: u32,
    /// Argon2 lanes.
    #[serde(default = "default_parallelism")]
    pub argon2_parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            max_length: default_max_length(),
            require_letter: true,
            require_digit: true,
            require_uppercase: false,
            require_symbol: false,
            min_entropy_score: default_min_score(),
            argon2_memory_kib: default_memory(),
            argon2_iterations: default_iterations(),
            argon2_parallelism: default_parallelism(),
        }
    }
}

fn default_min_length() -> usize {
    12
}

fn default_max_length() -> usize {
    128
}

fn default_true() -> bool {
    true
}

fn default_min_score() -> u8 {
    2
}

fn default_memory() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}
