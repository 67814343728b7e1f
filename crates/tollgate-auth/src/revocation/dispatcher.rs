//! Administrative, role-change and federated revocation.
//!
//! Revocation bypasses session policy; the only policy consulted is whether
//! a role change forces logout.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use tollgate_core::events::{DomainEvent, RevocationReason, SessionEvent, UserEvent};
use tollgate_core::traits::EventPublisher;
use tollgate_database::UserRepository;
use tollgate_entity::user::model::normalize_email;
use tollgate_entity::user::{User, UserRole};

use crate::error::{AuthError, AuthResult};
use crate::policy::PolicyResolver;
use crate::session::SessionStore;
use crate::tenant::TenantDirectory;

/// Result of a role-change revocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RoleChangeOutcome {
    /// Sessions were deleted.
    Revoked {
        /// Number of sessions deleted.
        count: usize,
    },
    /// Nothing was deleted.
    Skipped {
        /// Why nothing happened.
        reason: String,
    },
}

/// Identity asserted by an external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FederatedIdentity {
    /// Tenant the provider is configured for.
    pub tenant_id: Uuid,
    /// User ID, when the provider knows it.
    pub user_id: Option<Uuid>,
    /// Email, used when no user ID is given.
    pub email: Option<String>,
}

/// Result of a federated revocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FederatedRevocationOutcome {
    /// The user's sessions were deleted.
    Revoked {
        /// The resolved user.
        user_id: Uuid,
        /// Number of sessions deleted.
        count: usize,
    },
    /// No user matches the identity anywhere.
    UserNotFound,
    /// The identity was unusable or resolved outside the requested tenant.
    IgnoredInvalid {
        /// Why the request was ignored.
        reason: String,
    },
}

/// Fan-in point for every revocation path.
#[derive(Clone)]
pub struct RevocationDispatcher {
    users: Arc<dyn UserRepository>,
    sessions: Arc<SessionStore>,
    tenants: Arc<TenantDirectory>,
    resolver: Arc<PolicyResolver>,
    publisher: Arc<dyn EventPublisher>,
}

impl std::fmt::Debug for RevocationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocationDispatcher").finish()
    }
}

impl RevocationDispatcher {
    /// Create a dispatcher.
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<SessionStore>,
        tenants: Arc<TenantDirectory>,
        resolver: Arc<PolicyResolver>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            users,
            sessions,
            tenants,
            resolver,
            publisher,
        }
    }

    /// Delete one session within a tenant.
    pub async fn revoke_session(
        &self,
        tenant_id: Uuid,
        session_id: Uuid,
        actor_id: Option<Uuid>,
    ) -> AuthResult<()> {
        let session = self
            .sessions
            .find_by_id(tenant_id, session_id)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if !self.sessions.delete(tenant_id, session_id).await? {
            return Err(AuthError::SessionNotFound);
        }

        info!(
            tenant_id = %tenant_id,
            session_id = %session_id,
            actor_id = ?actor_id,
            "Session revoked by admin"
        );
        self.publish(
            tenant_id,
            actor_id,
            vec![session_id],
            Some(session.user_id),
            RevocationReason::Admin,
        );
        Ok(())
    }

    /// Delete every session of one user. Returns how many were deleted.
    pub async fn revoke_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        actor_id: Option<Uuid>,
    ) -> AuthResult<usize> {
        self.revoke_all_for_user(tenant_id, user_id, actor_id, RevocationReason::Admin)
            .await
    }

    /// Delete every session of a tenant. Returns how many were deleted.
    pub async fn revoke_tenant(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
    ) -> AuthResult<usize> {
        let revoked = self.sessions.delete_all_for_tenant(tenant_id).await?;
        let count = revoked.len();
        info!(
            tenant_id = %tenant_id,
            actor_id = ?actor_id,
            count = count,
            "Tenant sessions revoked"
        );
        if count > 0 {
            self.publish(tenant_id, actor_id, revoked, None, RevocationReason::Admin);
        }
        Ok(count)
    }

    /// Revoke a user's sessions after a role change, if the tenant asks for it.
    pub async fn on_role_change(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        actor_id: Option<Uuid>,
    ) -> AuthResult<RoleChangeOutcome> {
        let tenant = self.tenants.resolve(Some(tenant_id)).await?;
        let policy = self.resolver.resolve_for_tenant(&tenant);

        if !policy.force_logout_on_role_change {
            info!(
                tenant_id = %tenant_id,
                user_id = %user_id,
                "Role changed; tenant does not force logout"
            );
            return Ok(RoleChangeOutcome::Skipped {
                reason: "tenant policy does not force logout on role change".to_string(),
            });
        }

        let count = self
            .revoke_all_for_user(tenant_id, user_id, actor_id, RevocationReason::RoleChange)
            .await?;
        Ok(RoleChangeOutcome::Revoked { count })
    }

    /// Change a user's role, then apply the role-change revocation policy.
    pub async fn change_role(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        role: UserRole,
        actor_id: Option<Uuid>,
    ) -> AuthResult<RoleChangeOutcome> {
        let user = self
            .users
            .find_by_id(tenant_id, user_id)
            .await?
            .ok_or_else(|| {
                AuthError::Validation(format!("user {user_id} not found in tenant"))
            })?;

        if user.role == role {
            return Ok(RoleChangeOutcome::Skipped {
                reason: "role unchanged".to_string(),
            });
        }

        self.users.update_role(tenant_id, user_id, role).await?;
        info!(
            tenant_id = %tenant_id,
            user_id = %user_id,
            from = %user.role,
            to = %role,
            "User role changed"
        );
        self.publisher.publish(DomainEvent::user(
            tenant_id,
            actor_id,
            UserEvent::RoleChanged {
                user_id,
                from: user.role.as_str().to_string(),
                to: role.as_str().to_string(),
            },
        ));

        self.on_role_change(tenant_id, user_id, actor_id).await
    }

    /// Revoke the sessions of a user asserted by an identity provider.
    ///
    /// A user found outside `identity.tenant_id` is never touched.
    pub async fn revoke_federated(
        &self,
        identity: &FederatedIdentity,
    ) -> AuthResult<FederatedRevocationOutcome> {
        let user = match self.resolve_federated(identity).await? {
            Ok(user) => user,
            Err(outcome) => {
                warn!(
                    tenant_id = %identity.tenant_id,
                    outcome = ?outcome,
                    "Federated revocation not applied"
                );
                return Ok(outcome);
            }
        };

        let revoked = self
            .sessions
            .delete_all_for_user(user.tenant_id, user.id)
            .await?;
        let count = revoked.len();
        info!(
            tenant_id = %user.tenant_id,
            user_id = %user.id,
            count = count,
            "Federated revocation applied"
        );
        self.publish(
            user.tenant_id,
            None,
            revoked,
            Some(user.id),
            RevocationReason::Federated,
        );

        Ok(FederatedRevocationOutcome::Revoked {
            user_id: user.id,
            count,
        })
    }

    async fn resolve_federated(
        &self,
        identity: &FederatedIdentity,
    ) -> AuthResult<Result<User, FederatedRevocationOutcome>> {
        let tenant_id = identity.tenant_id;

        if let Some(user_id) = identity.user_id {
            return Ok(match self.users.find_by_id_unscoped(user_id).await? {
                Some(user) if user.tenant_id == tenant_id => Ok(user),
                Some(_) => Err(cross_tenant()),
                None => Err(FederatedRevocationOutcome::UserNotFound),
            });
        }

        let Some(email) = identity.email.as_deref().map(normalize_email) else {
            return Ok(Err(FederatedRevocationOutcome::IgnoredInvalid {
                reason: "identity has neither user id nor email".to_string(),
            }));
        };

        if let Some(user) = self.users.find_by_email(tenant_id, &email).await? {
            return Ok(Ok(user));
        }
        let elsewhere = self.users.find_by_email_unscoped(&email).await?;
        Ok(Err(if elsewhere.is_empty() {
            FederatedRevocationOutcome::UserNotFound
        } else {
            cross_tenant()
        }))
    }

    async fn revoke_all_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        actor_id: Option<Uuid>,
        reason: RevocationReason,
    ) -> AuthResult<usize> {
        let revoked = self.sessions.delete_all_for_user(tenant_id, user_id).await?;
        let count = revoked.len();
        info!(
            tenant_id = %tenant_id,
            user_id = %user_id,
            reason = %reason,
            count = count,
            "User sessions revoked"
        );
        if count > 0 {
            self.publish(tenant_id, actor_id, revoked, Some(user_id), reason);
        }
        Ok(count)
    }

    fn publish(
        &self,
        tenant_id: Uuid,
        actor_id: Option<Uuid>,
        session_ids: Vec<Uuid>,
        user_id: Option<Uuid>,
        reason: RevocationReason,
    ) {
        self.publisher.publish(DomainEvent::session(
            tenant_id,
            actor_id,
            SessionEvent::Revoked {
                session_ids,
                user_id,
                reason,
            },
        ));
    }
}

fn cross_tenant() -> FederatedRevocationOutcome {
    FederatedRevocationOutcome::IgnoredInvalid {
        reason: "identity resolves to a user in another tenant".to_string(),
    }
}
