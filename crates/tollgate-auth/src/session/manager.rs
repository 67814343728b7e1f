//! Session lifecycle manager: register, login, refresh and logout flows.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use tollgate_core::config::ConcurrentSessionStrategy;
use tollgate_core::error::ErrorKind;
use tollgate_core::events::{DomainEvent, RevocationReason, SessionEvent, UserEvent};
use tollgate_core::traits::{AbuseGuard, Clock, EventPublisher, HashPurpose, SecretHasher};
use tollgate_core::types::{RequestContext, SessionLimit};
use tollgate_database::UserRepository;
use tollgate_entity::session::{Session, SessionPolicy, TimeoutKind};
use tollgate_entity::tenant::Tenant;
use tollgate_entity::user::model::normalize_email;
use tollgate_entity::user::{CreateUser, User, UserRole};

use crate::error::{AuthError, AuthResult};
use crate::password::PasswordRules;
use crate::policy::PolicyResolver;
use crate::tenant::TenantDirectory;
use crate::token::{IssuedAccessToken, JwtCodec};

use super::binding::binding_violations;
use super::request::{
    AuthenticatedSession, LoginRequest, RegisterRequest, RotatedSession, SessionSummary,
};
use super::store::{IssuedSession, SessionStore};

/// Drives sessions through issuance, rotation and termination.
///
/// Every check that rejects a presented session deletes its row before the
/// error is returned, so a retry cannot succeed against it.
#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserRepository>,
    sessions: Arc<SessionStore>,
    tenants: Arc<TenantDirectory>,
    resolver: Arc<PolicyResolver>,
    codec: Arc<JwtCodec>,
    hasher: Arc<dyn SecretHasher>,
    rules: PasswordRules,
    abuse: Arc<dyn AbuseGuard>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("resolver", &self.resolver)
            .finish()
    }
}

impl SessionManager {
    /// Creates a new session manager with all required dependencies.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: Arc<SessionStore>,
        tenants: Arc<TenantDirectory>,
        resolver: Arc<PolicyResolver>,
        codec: Arc<JwtCodec>,
        hasher: Arc<dyn SecretHasher>,
        rules: PasswordRules,
        abuse: Arc<dyn AbuseGuard>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            sessions,
            tenants,
            resolver,
            codec,
            hasher,
            rules,
            abuse,
            publisher,
            clock,
        }
    }

    /// Register a user and open their first session.
    ///
    /// Without an explicit tenant the default tenant is used, and created if
    /// it does not exist yet.
    pub async fn register(
        &self,
        req: RegisterRequest,
        ctx: &RequestContext,
    ) -> AuthResult<AuthenticatedSession> {
        let key = abuse_key("register", ctx, &req.email);
        self.guarded(&key, self.register_inner(req, ctx)).await
    }

    async fn register_inner(
        &self,
        mut req: RegisterRequest,
        ctx: &RequestContext,
    ) -> AuthResult<AuthenticatedSession> {
        req.email = normalize_email(&req.email);
        req.validate()
            .map_err(|e| AuthError::Validation(e.to_string()))?;

        let tenant = self.tenants.resolve_or_provision(req.tenant_id).await?;
        self.tenants.ensure_allowed(&tenant)?;

        let email = req.email.clone();
        if self.users.find_by_email(tenant.id, &email).await?.is_some() {
            return Err(AuthError::UserExists);
        }

        let mut context = vec![email.as_str()];
        if let Some(name) = req.display_name.as_deref() {
            context.push(name);
        }
        self.rules.enforce(&req.password, &context).await?;

        let password_hash = self
            .hasher
            .hash_secret(&req.password, HashPurpose::Password)?;
        let user = match self
            .users
            .create(&CreateUser {
                tenant_id: tenant.id,
                email,
                password_hash,
                role: UserRole::Member,
                display_name: req.display_name,
            })
            .await
        {
            Ok(user) => user,
            Err(e) if e.kind == ErrorKind::Conflict => return Err(AuthError::UserExists),
            Err(e) => return Err(e.into()),
        };

        info!(user_id = %user.id, tenant_id = %tenant.id, "User registered");
        self.publisher.publish(DomainEvent::user(
            tenant.id,
            Some(user.id),
            UserEvent::Registered {
                user_id: user.id,
                email: user.email.clone(),
            },
        ));

        let now = self.clock.now();
        let issued = self.sessions.issue(user.id, tenant.id, ctx, now).await?;
        self.finish_issue(issued, user, ctx)
    }

    /// Authenticate with email and password and open a new session.
    pub async fn login(
        &self,
        req: LoginRequest,
        ctx: &RequestContext,
    ) -> AuthResult<AuthenticatedSession> {
        let key = abuse_key("login", ctx, &req.email);
        self.guarded(&key, self.login_inner(req, ctx)).await
    }

    async fn login_inner(
        &self,
        req: LoginRequest,
        ctx: &RequestContext,
    ) -> AuthResult<AuthenticatedSession> {
        req.validate()
            .map_err(|e| AuthError::Validation(e.to_string()))?;

        let tenant = self.tenants.resolve(req.tenant_id).await?;
        let email = normalize_email(&req.email);

        let Some(user) = self.users.find_by_email(tenant.id, &email).await? else {
            return Err(self.login_failed(&tenant, &email, ctx, "unknown email"));
        };
        if !self.hasher.verify_password(&req.password, &user.password_hash)? {
            return Err(self.login_failed(&tenant, &email, ctx, "wrong password"));
        }
        if !user.is_active {
            return Err(self.login_failed(&tenant, &email, ctx, "inactive user"));
        }

        self.tenants.ensure_allowed(&tenant)?;

        let now = self.clock.now();
        let policy = self.resolver.resolve_for_tenant(&tenant);
        self.enforce_concurrency(&tenant, &user, &policy, now)
            .await?;

        self.users.touch_last_login(tenant.id, user.id, now).await?;
        let issued = self.sessions.issue(user.id, tenant.id, ctx, now).await?;
        self.finish_issue(issued, user, ctx)
    }

    /// Apply the concurrent-session policy before a new session is created.
    ///
    /// Check, evict and create are separate statements; concurrent logins
    /// may transiently exceed the maximum.
    async fn enforce_concurrency(
        &self,
        tenant: &Tenant,
        user: &User,
        policy: &SessionPolicy,
        now: DateTime<Utc>,
    ) -> AuthResult<()> {
        let limit = policy.max_concurrent_sessions;
        let SessionLimit::Fixed(max) = limit else {
            return Ok(());
        };

        let current = self.sessions.count_active(tenant.id, user.id, now).await?;
        if !limit.is_reached_by(current) {
            return Ok(());
        }

        match policy.concurrent_session_strategy {
            ConcurrentSessionStrategy::RejectNewest => {
                warn!(
                    user_id = %user.id,
                    tenant_id = %tenant.id,
                    max = max,
                    current = current,
                    "Concurrent session limit reached"
                );
                Err(AuthError::SessionConcurrentLimit { max, current })
            }
            ConcurrentSessionStrategy::EvictOldest => {
                let excess = limit.excess_for_new(current);
                let evicted = self
                    .sessions
                    .evict_oldest(tenant.id, user.id, excess, now)
                    .await?;
                info!(
                    user_id = %user.id,
                    tenant_id = %tenant.id,
                    evicted = evicted.len(),
                    "Evicted oldest sessions"
                );
                if !evicted.is_empty() {
                    self.publish_revoked(tenant.id, user.id, evicted, RevocationReason::Evicted);
                }
                Ok(())
            }
        }
    }

    fn finish_issue(
        &self,
        issued: IssuedSession,
        user: User,
        ctx: &RequestContext,
    ) -> AuthResult<AuthenticatedSession> {
        let session = issued.session;
        let access = self.mint(&session, user.role)?;

        info!(
            user_id = %user.id,
            tenant_id = %session.tenant_id,
            session_id = %session.id,
            "Session issued"
        );
        self.publisher.publish(DomainEvent::session(
            session.tenant_id,
            Some(user.id),
            SessionEvent::Created {
                session_id: session.id,
                user_id: user.id,
                ip_address: ctx.ip_address.clone(),
            },
        ));

        Ok(AuthenticatedSession {
            access_expires_at: access.claims.expires_at(),
            access_token: access.token,
            refresh_token: issued.refresh_token,
            session_id: session.id,
            user,
        })
    }

    /// Exchange a refresh token for a new token pair.
    ///
    /// The presented token is consumed: whatever the outcome, it will not
    /// authorize another rotation.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        ctx: &RequestContext,
    ) -> AuthResult<RotatedSession> {
        let now = self.clock.now();

        let session = self
            .sessions
            .find_by_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if session.is_expired_at(now) {
            self.terminate(&session, RevocationReason::Expired).await?;
            return Err(AuthError::SessionExpired);
        }

        let user = self
            .users
            .find_by_id(session.tenant_id, session.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AuthError::InvalidCredentials)?;

        let tenant = self
            .tenants
            .find(session.tenant_id)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        self.tenants.ensure_allowed(&tenant)?;

        let policy = self.resolver.resolve_for_tenant(&tenant);
        if let Some(kind) = policy.timeout_violation(&session, now) {
            let (reason, err) = match kind {
                TimeoutKind::Idle => (RevocationReason::IdleTimeout, AuthError::SessionIdleTimeout),
                TimeoutKind::Absolute => (
                    RevocationReason::AbsoluteTimeout,
                    AuthError::SessionAbsoluteTimeout,
                ),
            };
            self.terminate(&session, reason).await?;
            return Err(err);
        }

        let violated = binding_violations(policy.binding_mode, &session, ctx);
        if !violated.is_empty() {
            self.terminate(&session, RevocationReason::BindingViolation)
                .await?;
            return Err(AuthError::SessionBindingViolation {
                attributes: violated,
            });
        }

        if self.resolver.exceeds_role_ceiling(&session, user.role, now) {
            debug!(role = %user.role, "Role session ceiling reached");
            self.terminate(&session, RevocationReason::AbsoluteTimeout)
                .await?;
            return Err(AuthError::SessionExpired);
        }

        let Some(rotated) = self.sessions.rotate(&session, now).await? else {
            warn!(
                session_id = %session.id,
                user_id = %user.id,
                "Refresh token already consumed"
            );
            return Err(AuthError::InvalidCredentials);
        };
        let access = self.mint(&rotated.session, user.role)?;

        info!(
            user_id = %user.id,
            tenant_id = %tenant.id,
            old_session_id = %session.id,
            session_id = %rotated.session.id,
            "Session rotated"
        );
        self.publisher.publish(DomainEvent::session(
            tenant.id,
            Some(user.id),
            SessionEvent::Rotated {
                old_session_id: session.id,
                new_session_id: rotated.session.id,
                user_id: user.id,
            },
        ));

        Ok(RotatedSession {
            access_expires_at: access.claims.expires_at(),
            access_token: access.token,
            refresh_token: rotated.refresh_token,
            session_id: rotated.session.id,
            old_session_id: session.id,
            user,
        })
    }

    /// End the session unlocked by `refresh_token`.
    ///
    /// A token that no longer matches a session yields `SessionRevoked`.
    pub async fn logout(&self, refresh_token: &str) -> AuthResult<Uuid> {
        let session = self
            .sessions
            .delete_by_refresh_token(refresh_token)
            .await?
            .ok_or(AuthError::SessionRevoked)?;

        info!(
            session_id = %session.id,
            user_id = %session.user_id,
            "User logged out"
        );
        self.publish_revoked(
            session.tenant_id,
            session.user_id,
            vec![session.id],
            RevocationReason::Logout,
        );
        Ok(session.id)
    }

    /// List a user's open sessions, oldest first, marking the caller's own.
    pub async fn list_sessions(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        current: Option<Uuid>,
    ) -> AuthResult<Vec<SessionSummary>> {
        let now = self.clock.now();
        Ok(self
            .sessions
            .list_for_user(tenant_id, user_id)
            .await?
            .into_iter()
            .filter(|s| !s.is_expired_at(now))
            .map(|s| SessionSummary::from_session(s, current))
            .collect())
    }

    fn mint(&self, session: &Session, role: UserRole) -> AuthResult<IssuedAccessToken> {
        Ok(self
            .codec
            .issue(session.user_id, session.tenant_id, session.id, role)?)
    }

    async fn terminate(&self, session: &Session, reason: RevocationReason) -> AuthResult<()> {
        let deleted = self.sessions.delete(session.tenant_id, session.id).await?;
        warn!(
            session_id = %session.id,
            user_id = %session.user_id,
            tenant_id = %session.tenant_id,
            reason = %reason,
            deleted = deleted,
            "Session terminated"
        );
        if deleted {
            self.publish_revoked(session.tenant_id, session.user_id, vec![session.id], reason);
        }
        Ok(())
    }

    fn publish_revoked(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        session_ids: Vec<Uuid>,
        reason: RevocationReason,
    ) {
        self.publisher.publish(DomainEvent::session(
            tenant_id,
            Some(user_id),
            SessionEvent::Revoked {
                session_ids,
                user_id: Some(user_id),
                reason,
            },
        ));
    }

    fn login_failed(
        &self,
        tenant: &Tenant,
        email: &str,
        ctx: &RequestContext,
        cause: &'static str,
    ) -> AuthError {
        debug!(tenant_id = %tenant.id, cause = cause, "Login rejected");
        self.publisher.publish(DomainEvent::session(
            tenant.id,
            None,
            SessionEvent::LoginFailed {
                email: email.to_string(),
                ip_address: ctx.ip_address.clone(),
            },
        ));
        AuthError::InvalidCredentials
    }

    /// Consult the abuse guard before `op` and count the failures it reports.
    async fn guarded<T>(
        &self,
        key: &str,
        op: impl Future<Output = AuthResult<T>>,
    ) -> AuthResult<T> {
        let verdict = self.abuse.check(key).await;
        if !verdict.allowed {
            warn!(
                limit = verdict.limit,
                retry_after_secs = verdict.retry_after_secs,
                "Request blocked by abuse guard"
            );
            return Err(AuthError::RateLimited {
                retry_after_secs: verdict.retry_after_secs,
            });
        }

        let result = op.await;
        if let Err(e) = &result {
            if counts_as_abuse(e) {
                self.abuse.record_failure(key).await;
            }
        }
        result
    }
}

fn abuse_key(action: &str, ctx: &RequestContext, email: &str) -> String {
    match &ctx.ip_address {
        Some(ip) => format!("{action}:{ip}:{}", normalize_email(email)),
        None => format!("{action}:{}", normalize_email(email)),
    }
}

fn counts_as_abuse(err: &AuthError) -> bool {
    matches!(
        err,
        AuthError::InvalidCredentials
            | AuthError::UserExists
            | AuthError::PasswordPolicyViolation { .. }
            | AuthError::Validation(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abuse_key_includes_ip_when_known() {
        let ctx = RequestContext::from_ip("1.1.1.1");
        assert_eq!(abuse_key("login", &ctx, " A@x.com"), "login:1.1.1.1:a@x.com");
        assert_eq!(
            abuse_key("login", &RequestContext::default(), "a@x.com"),
            "login:a@x.com"
        );
    }

    #[test]
    fn test_only_caller_mistakes_count_as_abuse() {
        assert!(counts_as_abuse(&AuthError::InvalidCredentials));
        assert!(!counts_as_abuse(&AuthError::SessionConcurrentLimit {
            max: 1,
            current: 1
        }));
        assert!(!counts_as_abuse(&AuthError::TenantNotFound));
    }
}
