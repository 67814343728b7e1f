//! Password reset: single-use tokens delivered out of band.

use std::sync::Arc;

use chrono::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use tollgate_core::config::AuthConfig;
use tollgate_core::events::{DomainEvent, RevocationReason, SessionEvent, UserEvent};
use tollgate_core::traits::{Clock, EventPublisher, HashPurpose, SecretHasher};
use tollgate_core::types::span::{saturating_add, saturating_minutes};
use tollgate_database::{PasswordResetRepository, UserRepository};
use tollgate_entity::reset::CreatePasswordResetToken;
use tollgate_entity::user::model::normalize_email;

use crate::error::{AuthError, AuthResult};
use crate::policy::PolicyResolver;
use crate::session::SessionStore;
use crate::tenant::TenantDirectory;
use crate::token::generate_opaque_token;

use super::rules::PasswordRules;

/// Outcome of a successful reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetOutcome {
    /// The user whose password changed.
    pub user_id: Uuid,
    /// Sessions deleted because the tenant revokes on reset.
    pub revoked_sessions: usize,
}

/// Issues and consumes password reset tokens.
#[derive(Clone)]
pub struct PasswordResetService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<dyn PasswordResetRepository>,
    hasher: Arc<dyn SecretHasher>,
    rules: PasswordRules,
    tenants: Arc<TenantDirectory>,
    resolver: Arc<PolicyResolver>,
    sessions: Arc<SessionStore>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    token_ttl: Duration,
}

impl std::fmt::Debug for PasswordResetService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordResetService")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

impl PasswordResetService {
    /// Create the service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn PasswordResetRepository>,
        hasher: Arc<dyn SecretHasher>,
        rules: PasswordRules,
        tenants: Arc<TenantDirectory>,
        resolver: Arc<PolicyResolver>,
        sessions: Arc<SessionStore>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            users,
            tokens,
            hasher,
            rules,
            tenants,
            resolver,
            sessions,
            publisher,
            clock,
            token_ttl: saturating_minutes(config.password_reset_ttl_minutes),
        }
    }

    /// Issue a reset token for `email` if such a user exists.
    ///
    /// Always succeeds for unknown tenants, unknown emails and inactive
    /// accounts. The raw token leaves only through the
    /// `PasswordResetRequested` event.
    pub async fn request_reset(&self, tenant_id: Option<Uuid>, email: &str) -> AuthResult<()> {
        let email = normalize_email(email);

        let tenant = match self.tenants.resolve(tenant_id).await {
            Ok(tenant) => tenant,
            Err(AuthError::TenantNotFound) => {
                debug!("Reset requested for unknown tenant");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        if !self.tenants.is_allowed(&tenant) {
            debug!(tenant_id = %tenant.id, "Reset requested for inactive tenant");
            return Ok(());
        }

        let Some(user) = self.users.find_by_email(tenant.id, &email).await? else {
            debug!(tenant_id = %tenant.id, "Reset requested for unknown email");
            return Ok(());
        };
        if !user.is_active {
            debug!(user_id = %user.id, "Reset requested for inactive user");
            return Ok(());
        }

        let now = self.clock.now();
        let raw = generate_opaque_token();
        let record = self
            .tokens
            .create(&CreatePasswordResetToken {
                user_id: user.id,
                tenant_id: tenant.id,
                token_hash: self.hasher.hash_secret(&raw, HashPurpose::ResetToken)?,
                expires_at: saturating_add(now, self.token_ttl),
                created_at: now,
            })
            .await?;

        info!(user_id = %user.id, tenant_id = %tenant.id, "Password reset token issued");

        self.publisher.publish(DomainEvent::user(
            tenant.id,
            Some(user.id),
            UserEvent::PasswordResetRequested {
                user_id: user.id,
                email: user.email,
                token: raw,
                expires_at: record.expires_at,
            },
        ));

        Ok(())
    }

    /// Consume a reset token and set a new password.
    ///
    /// The token is checked for existence, then use, then expiry.
    pub async fn reset_password(
        &self,
        raw_token: &str,
        new_password: &str,
    ) -> AuthResult<PasswordResetOutcome> {
        let hash = self.hasher.hash_secret(raw_token, HashPurpose::ResetToken)?;
        let token = self
            .tokens
            .find_by_token_hash(&hash)
            .await?
            .ok_or(AuthError::PasswordResetTokenInvalid)?;

        if token.is_used() {
            return Err(AuthError::PasswordResetTokenAlreadyUsed);
        }
        let now = self.clock.now();
        if token.is_expired_at(now) {
            return Err(AuthError::PasswordResetTokenExpired);
        }

        let user = self
            .users
            .find_by_id(token.tenant_id, token.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::PasswordResetTokenInvalid)?;

        let tenant = self.tenants.resolve(Some(user.tenant_id)).await?;
        self.tenants.ensure_allowed(&tenant)?;

        self.rules.enforce(new_password, &[&user.email]).await?;
        let password_hash = self
            .hasher
            .hash_secret(new_password, HashPurpose::Password)?;

        // Claimed before any write; a concurrent consumer gets AlreadyUsed.
        if !self.tokens.mark_used(token.id, now).await? {
            return Err(AuthError::PasswordResetTokenAlreadyUsed);
        }
        self.users
            .update_password(user.tenant_id, user.id, &password_hash)
            .await?;
        let discarded = self
            .tokens
            .delete_others_for_user(user.tenant_id, user.id, token.id)
            .await?;

        info!(
            user_id = %user.id,
            tenant_id = %user.tenant_id,
            discarded_tokens = discarded,
            "Password reset completed"
        );
        self.publisher.publish(DomainEvent::user(
            user.tenant_id,
            Some(user.id),
            UserEvent::PasswordChanged { user_id: user.id },
        ));

        let policy = self.resolver.resolve_for_tenant(&tenant);
        let mut revoked_sessions = 0;
        if policy.revoke_sessions_on_password_reset {
            let revoked = self
                .sessions
                .delete_all_for_user(user.tenant_id, user.id)
                .await?;
            revoked_sessions = revoked.len();
            if revoked.is_empty() {
                debug!(user_id = %user.id, "No sessions to revoke after reset");
            } else {
                info!(
                    user_id = %user.id,
                    count = revoked_sessions,
                    "Sessions revoked after password reset"
                );
                self.publisher.publish(DomainEvent::session(
                    user.tenant_id,
                    Some(user.id),
                    SessionEvent::Revoked {
                        session_ids: revoked,
                        user_id: Some(user.id),
                        reason: RevocationReason::PasswordReset,
                    },
                ));
            }
        }

        Ok(PasswordResetOutcome {
            user_id: user.id,
            revoked_sessions,
        })
    }
}
