//! Secret hashing capability.

use std::fmt;

use crate::result::AppResult;

/// What a secret is being hashed for.
///
/// Passwords get a salted, slow hash; lookup tokens (refresh and reset
/// tokens) get a deterministic digest so rows can be found by hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashPurpose {
    /// A user password.
    Password,
    /// An opaque refresh token.
    RefreshToken,
    /// A single-use password reset token.
    ResetToken,
}

impl fmt::Display for HashPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Password => write!(f, "password"),
            Self::RefreshToken => write!(f, "refresh_token"),
            Self::ResetToken => write!(f, "reset_token"),
        }
    }
}

/// Hash and verify secrets.
pub trait SecretHasher: Send + Sync + 'static {
    /// Hash a secret for the given purpose.
    fn hash_secret(&self, value: &str, purpose: HashPurpose) -> AppResult<String>;

    /// Verify a plaintext password against a stored password hash.
    ///
    /// Returns `Ok(false)` on mismatch; `Err` only when the stored hash is
    /// unreadable.
    fn verify_password(&self, value: &str, hash: &str) -> AppResult<bool>;
}
