//! Argon2id password hashing and SHA-256 token digests.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use sha2::{Digest, Sha256};

use tollgate_core::config::PasswordConfig;
use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::traits::{HashPurpose, SecretHasher};

/// Hashes passwords with Argon2id and lookup tokens with SHA-256.
///
/// Token digests must be deterministic so a session row can be found by the
/// hash of the presented refresh token; passwords get a random salt.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    /// Create a hasher with the configured Argon2 cost.
    pub fn new(config: &PasswordConfig) -> AppResult<Self> {
        let params = Params::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| AppError::configuration(format!("Invalid Argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

/// Hex-encoded SHA-256 of a token.
pub fn digest_token(raw: &str) -> String {
    Sha256::digest(raw.as_bytes())
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

impl SecretHasher for CredentialHasher {
    fn hash_secret(&self, value: &str, purpose: HashPurpose) -> AppResult<String> {
        match purpose {
            HashPurpose::Password => {
                let salt = SaltString::generate(&mut OsRng);
                self.argon2()
                    .hash_password(value.as_bytes(), &salt)
                    .map(|hash| hash.to_string())
                    .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
            }
            HashPurpose::RefreshToken | HashPurpose::ResetToken => Ok(digest_token(value)),
        }
    }

    fn verify_password(&self, value: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::internal(format!("Invalid password hash format: {e}")))?;

        // Cost parameters come from the stored hash, not from `self.params`.
        match Argon2::default().verify_password(value.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!(
                "Password verification failed: {e}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> CredentialHasher {
        CredentialHasher::new(&PasswordConfig {
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            ..PasswordConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_password_round_trip() {
        let hasher = cheap();
        let hash = hasher
            .hash_secret("valid pass 1234", HashPurpose::Password)
            .unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password("valid pass 1234", &hash).unwrap());
        assert!(!hasher.verify_password("valid pass 1235", &hash).unwrap());
    }

    #[test]
    fn test_token_digest_is_deterministic() {
        let hasher = cheap();
        let a = hasher.hash_secret("tok", HashPurpose::RefreshToken).unwrap();
        let b = hasher.hash_secret("tok", HashPurpose::ResetToken).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, digest_token("tok2"));
    }

    #[test]
    fn test_garbled_hash_is_an_error() {
        assert!(cheap().verify_password("x", "not-a-hash").is_err());
    }
}
