//! Session persistence keyed by refresh-token digests.
//!
//! Callers hand raw refresh tokens to this layer; only their digests ever
//! reach the repository.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use tollgate_core::result::AppResult;
use tollgate_core::traits::{HashPurpose, SecretHasher};
use tollgate_core::types::RequestContext;
use tollgate_core::types::span::{saturating_add, saturating_days};
use tollgate_database::SessionRepository;
use tollgate_entity::session::{CreateSession, Session, SessionWithContext};

use crate::token::generate_opaque_token;

/// A session row plus the raw refresh token that unlocks it.
///
/// The raw token exists only in memory and is returned to the caller once.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// The persisted row.
    pub session: Session,
    /// The raw refresh token.
    pub refresh_token: String,
}

/// Tenant-scoped session persistence.
#[derive(Clone)]
pub struct SessionStore {
    repo: Arc<dyn SessionRepository>,
    hasher: Arc<dyn SecretHasher>,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl SessionStore {
    /// Create a store with a refresh window of `refresh_ttl_days`.
    pub fn new(
        repo: Arc<dyn SessionRepository>,
        hasher: Arc<dyn SecretHasher>,
        refresh_ttl_days: u64,
    ) -> Self {
        Self {
            repo,
            hasher,
            refresh_ttl: saturating_days(refresh_ttl_days),
        }
    }

    /// Digest of a raw refresh token.
    pub fn hash_token(&self, raw: &str) -> AppResult<String> {
        self.hasher.hash_secret(raw, HashPurpose::RefreshToken)
    }

    fn new_row(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        ctx: &RequestContext,
        created_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<(CreateSession, String)> {
        let refresh_token = generate_opaque_token();
        let data = CreateSession {
            user_id,
            tenant_id,
            token_hash: self.hash_token(&refresh_token)?,
            expires_at: saturating_add(now, self.refresh_ttl),
            created_at,
            ip_address: ctx.ip_address.clone(),
            device_fingerprint: ctx.device_fingerprint.clone(),
            user_agent: ctx.user_agent.clone(),
        };
        Ok((data, refresh_token))
    }

    /// Persist a new session for a user with a fresh refresh token.
    pub async fn issue(
        &self,
        user_id: Uuid,
        tenant_id: Uuid,
        ctx: &RequestContext,
        now: DateTime<Utc>,
    ) -> AppResult<IssuedSession> {
        let (data, refresh_token) = self.new_row(user_id, tenant_id, ctx, now, now)?;
        let session = self.repo.create(&data).await?;
        debug!(session_id = %session.id, user_id = %user_id, "Session row created");
        Ok(IssuedSession {
            session,
            refresh_token,
        })
    }

    /// Replace `old` with a new row under a fresh refresh token.
    ///
    /// The replacement keeps the original creation time and bound request
    /// attributes so absolute timeouts and binding survive rotation. Returns
    /// `None` when `old` was already consumed by someone else.
    pub async fn rotate(
        &self,
        old: &Session,
        now: DateTime<Utc>,
    ) -> AppResult<Option<IssuedSession>> {
        let bound = RequestContext {
            ip_address: old.ip_address.clone(),
            device_fingerprint: old.device_fingerprint.clone(),
            user_agent: old.user_agent.clone(),
        };
        let (data, refresh_token) =
            self.new_row(old.user_id, old.tenant_id, &bound, old.created_at, now)?;

        let rotated = self
            .repo
            .rotate(old.tenant_id, old.id, &old.token_hash, &data, now)
            .await?;
        Ok(rotated.map(|session| IssuedSession {
            session,
            refresh_token,
        }))
    }

    /// Find the session unlocked by a raw refresh token.
    pub async fn find_by_refresh_token(&self, raw: &str) -> AppResult<Option<Session>> {
        let hash = self.hash_token(raw)?;
        self.repo.find_by_token_hash(&hash).await
    }

    /// Delete the session unlocked by a raw refresh token and return it.
    pub async fn delete_by_refresh_token(&self, raw: &str) -> AppResult<Option<Session>> {
        let hash = self.hash_token(raw)?;
        self.repo.delete_by_token_hash(&hash).await
    }

    /// Find a session by ID within a tenant.
    pub async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> AppResult<Option<Session>> {
        self.repo.find_by_id(tenant_id, id).await
    }

    /// Find a session with its owning user and tenant.
    pub async fn find_with_context(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<SessionWithContext>> {
        self.repo.find_with_context(tenant_id, id).await
    }

    /// List a user's sessions, oldest first.
    pub async fn list_for_user(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<Vec<Session>> {
        self.repo.list_for_user(tenant_id, user_id).await
    }

    /// List a tenant's sessions, oldest first.
    pub async fn list_for_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<Session>> {
        self.repo.list_for_tenant(tenant_id).await
    }

    /// Count a user's sessions whose refresh window is open at `now`.
    pub async fn count_active(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        self.repo.count_active(tenant_id, user_id, now).await
    }

    /// Delete one session.
    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> AppResult<bool> {
        self.repo.delete(tenant_id, id).await
    }

    /// Delete all of a user's sessions.
    pub async fn delete_all_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Vec<Uuid>> {
        self.repo.delete_all_for_user(tenant_id, user_id).await
    }

    /// Delete all of a tenant's sessions.
    pub async fn delete_all_for_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<Uuid>> {
        self.repo.delete_all_for_tenant(tenant_id).await
    }

    /// Delete a user's `count` oldest sessions that are still open at `now`.
    pub async fn evict_oldest(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        count: u64,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>> {
        self.repo
            .delete_oldest_for_user(tenant_id, user_id, count, now)
            .await
    }

    /// Record activity on a session.
    pub async fn touch(&self, tenant_id: Uuid, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        self.repo.touch(tenant_id, id, at).await
    }

    /// Delete every session whose refresh window closed.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        self.repo.delete_expired(now).await
    }
}
