//! Access verification: bearer token to authenticated principal.
//!
//! A valid signature is necessary but not sufficient. The session named by
//! the token must still exist, so deleting a session revokes its access
//! tokens immediately.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use tollgate_core::events::{DomainEvent, RevocationReason, SessionEvent};
use tollgate_core::traits::{Clock, EventPublisher};
use tollgate_entity::user::UserRole;

use crate::error::{AuthError, AuthResult};
use crate::session::SessionStore;
use crate::tenant::TenantDirectory;
use crate::token::{AccessClaims, TokenSigner};

/// The authenticated caller behind an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    /// The user.
    pub user_id: Uuid,
    /// The user's tenant.
    pub tenant_id: Uuid,
    /// The session the token belongs to.
    pub session_id: Uuid,
    /// The user's current role.
    pub role: UserRole,
    /// The user's email.
    pub email: String,
    /// The verified claims.
    pub claims: AccessClaims,
}

/// Combines stateless token verification with a session-existence check.
#[derive(Clone)]
pub struct AccessGate {
    verifier: Arc<dyn TokenSigner>,
    sessions: Arc<SessionStore>,
    tenants: Arc<TenantDirectory>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    touch_on_access: bool,
}

impl std::fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGate")
            .field("touch_on_access", &self.touch_on_access)
            .finish()
    }
}

impl AccessGate {
    /// Create a gate.
    pub fn new(
        verifier: Arc<dyn TokenSigner>,
        sessions: Arc<SessionStore>,
        tenants: Arc<TenantDirectory>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        touch_on_access: bool,
    ) -> Self {
        Self {
            verifier,
            sessions,
            tenants,
            publisher,
            clock,
            touch_on_access,
        }
    }

    /// Authenticate a bearer token.
    ///
    /// Every token failure (bad signature, expiry, missing claims) is
    /// reported as `InvalidCredentials`.
    pub async fn authenticate(&self, token: &str) -> AuthResult<Principal> {
        let claims = self.verifier.verify(token).map_err(|e| {
            debug!(error = %e, "Bearer token rejected");
            AuthError::InvalidCredentials
        })?;

        let Some(found) = self
            .sessions
            .find_with_context(claims.tid, claims.sid)
            .await?
        else {
            debug!(session_id = %claims.sid, "Token names a deleted session");
            return Err(AuthError::SessionRevoked);
        };
        let (session, user, tenant) = (found.session, found.user, found.tenant);

        if session.user_id != claims.sub {
            warn!(session_id = %session.id, "Token subject does not own the session");
            return Err(AuthError::InvalidCredentials);
        }

        let now = self.clock.now();
        if session.is_expired_at(now) {
            if self.sessions.delete(session.tenant_id, session.id).await? {
                self.publisher.publish(DomainEvent::session(
                    session.tenant_id,
                    Some(session.user_id),
                    SessionEvent::Revoked {
                        session_ids: vec![session.id],
                        user_id: Some(session.user_id),
                        reason: RevocationReason::Expired,
                    },
                ));
            }
            return Err(AuthError::SessionExpired);
        }

        self.tenants.ensure_allowed(&tenant)?;
        if !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        if self.touch_on_access {
            self.sessions
                .touch(session.tenant_id, session.id, now)
                .await?;
        }

        Ok(Principal {
            user_id: user.id,
            tenant_id: tenant.id,
            session_id: session.id,
            role: user.role,
            email: user.email,
            claims,
        })
    }
}
