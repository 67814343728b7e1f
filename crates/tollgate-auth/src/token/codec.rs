//! Access token signing and verification.

use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use tollgate_core::config::AuthConfig;
use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::traits::Clock;
use tollgate_core::types::span::saturating_minutes;
use tollgate_entity::user::UserRole;

use super::claims::{AccessClaims, RawClaims};

/// Why an access token was rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token is missing required claims")]
    MissingClaims,

    #[error("invalid token: {0}")]
    Invalid(String),
}

/// `sign(claims) -> token`, `verify(token) -> claims | error`.
pub trait TokenSigner: Send + Sync + 'static {
    /// Sign claims into a compact token.
    fn sign(&self, claims: &AccessClaims) -> AppResult<String>;

    /// Verify a token's signature, issuer, and expiry and return its claims.
    ///
    /// Subject, tenant, session and role must all be present.
    fn verify(&self, token: &str) -> Result<AccessClaims, TokenError>;
}

/// A freshly minted access token.
#[derive(Debug, Clone)]
pub struct IssuedAccessToken {
    /// The compact token.
    pub token: String,
    /// The claims it carries.
    pub claims: AccessClaims,
}

/// HS256 JWT codec.
///
/// Expiry is checked against the injected clock rather than inside the JWT
/// library, so the whole core shares one notion of "now".
#[derive(Clone)]
pub struct JwtCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtCodec")
            .field("issuer", &self.issuer)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JwtCodec {
    /// Create a codec from the auth configuration.
    pub fn new(config: &AuthConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_issuer(&[config.jwt_issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss"]);

        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            issuer: config.jwt_issuer.clone(),
            ttl: saturating_minutes(config.access_token_ttl_minutes),
            clock,
        }
    }

    /// Mint an access token for a session.
    pub fn issue(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        session_id: Uuid,
        role: UserRole,
    ) -> AppResult<IssuedAccessToken> {
        let claims = AccessClaims::new(
            user_id,
            tenant_id,
            session_id,
            role,
            &self.issuer,
            self.clock.now(),
            self.ttl,
        );
        let token = self.sign(&claims)?;
        Ok(IssuedAccessToken { token, claims })
    }
}

impl TokenSigner for JwtCodec {
    fn sign(&self, claims: &AccessClaims) -> AppResult<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode access token: {e}")))
    }

    fn verify(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let raw = jsonwebtoken::decode::<RawClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                debug!(error = %e, "Access token rejected");
                TokenError::Invalid(e.to_string())
            })?
            .claims;

        let claims = raw.into_claims().ok_or(TokenError::MissingClaims)?;
        if claims.exp <= self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
