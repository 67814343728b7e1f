//! In-memory implementation of every store trait, guarded by a Tokio mutex.
//!
//! Each trait method takes the lock once, so every call is atomic with
//! respect to every other call, which is what the rotation and reset
//! consumption contracts require. Unique constraints of the relational
//! schema (tenant slug, tenant + email, session token digest) are enforced.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_entity::reset::{CreatePasswordResetToken, PasswordResetToken};
use tollgate_entity::session::{CreateSession, Session, SessionWithContext};
use tollgate_entity::tenant::{CreateTenant, Tenant, TenantStatus};
use tollgate_entity::user::{CreateUser, User, UserProfile, UserRole};

use crate::repositories::{
    PasswordResetRepository, SessionRepository, TenantRepository, UserRepository,
};

#[derive(Debug, Default)]
struct Tables {
    tenants: HashMap<Uuid, Tenant>,
    users: HashMap<Uuid, User>,
    profiles: HashMap<Uuid, UserProfile>,
    sessions: HashMap<Uuid, Session>,
    reset_tokens: HashMap<Uuid, PasswordResetToken>,
}

impl Tables {
    fn insert_session(
        &mut self,
        data: &CreateSession,
        last_active_at: Option<DateTime<Utc>>,
    ) -> AppResult<Session> {
        if self.sessions.values().any(|s| s.token_hash == data.token_hash) {
            return Err(AppError::conflict("Failed to create session: duplicate entry"));
        }
        let session = Session {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            tenant_id: data.tenant_id,
            token_hash: data.token_hash.clone(),
            expires_at: data.expires_at,
            created_at: data.created_at,
            last_active_at,
            ip_address: data.ip_address.clone(),
            device_fingerprint: data.device_fingerprint.clone(),
            user_agent: data.user_agent.clone(),
        };
        self.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    fn user_sessions_oldest_first(&self, tenant_id: Uuid, user_id: Uuid) -> Vec<Session> {
        let mut sessions: Vec<Session> = self
            .sessions
            .values()
            .filter(|s| s.tenant_id == tenant_id && s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.created_at, s.id));
        sessions
    }

    fn user_mut(&mut self, tenant_id: Uuid, id: Uuid) -> Option<&mut User> {
        self.users
            .get_mut(&id)
            .filter(|user| user.tenant_id == tenant_id)
    }
}

/// Process-local store. Cloning shares the underlying tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every session row.
    pub async fn all_sessions(&self) -> Vec<Session> {
        let tables = self.tables.lock().await;
        let mut sessions: Vec<Session> = tables.sessions.values().cloned().collect();
        sessions.sort_by_key(|s| (s.created_at, s.id));
        sessions
    }

    /// Number of session rows.
    pub async fn session_count(&self) -> usize {
        self.tables.lock().await.sessions.len()
    }

    /// Snapshot of every reset token row.
    pub async fn all_reset_tokens(&self) -> Vec<PasswordResetToken> {
        self.tables
            .lock()
            .await
            .reset_tokens
            .values()
            .cloned()
            .collect()
    }

    /// Overwrite a session row in place. Used to stage clock-skewed fixtures.
    pub async fn put_session(&self, session: Session) {
        self.tables
            .lock()
            .await
            .sessions
            .insert(session.id, session);
    }

    /// Delete a user row, leaving its sessions in place.
    pub async fn remove_user(&self, id: Uuid) -> bool {
        let mut tables = self.tables.lock().await;
        tables.profiles.remove(&id);
        tables.users.remove(&id).is_some()
    }
}

#[async_trait]
impl TenantRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Tenant>> {
        Ok(self.tables.lock().await.tenants.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Tenant>> {
        let tables = self.tables.lock().await;
        Ok(tables.tenants.values().find(|t| t.slug == slug).cloned())
    }

    async fn create(&self, data: &CreateTenant) -> AppResult<Tenant> {
        let mut tables = self.tables.lock().await;
        if tables.tenants.values().any(|t| t.slug == data.slug) {
            return Err(AppError::conflict("Failed to create tenant: duplicate entry"));
        }
        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            slug: data.slug.clone(),
            name: data.name.clone(),
            status: data.status,
            settings: data.settings.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.tenants.insert(tenant.id, tenant.clone());
        Ok(tenant)
    }

    async fn find_or_create(&self, data: &CreateTenant) -> AppResult<Tenant> {
        if let Some(existing) = TenantRepository::find_by_slug(self, &data.slug).await? {
            return Ok(existing);
        }
        match TenantRepository::create(self, data).await {
            Ok(tenant) => Ok(tenant),
            // Lost a race with a concurrent provisioner.
            Err(_) => TenantRepository::find_by_slug(self, &data.slug)
                .await?
                .ok_or_else(|| AppError::internal("Tenant vanished during provisioning")),
        }
    }

    async fn update_status(&self, id: Uuid, status: TenantStatus) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(match tables.tenants.get_mut(&id) {
            Some(tenant) => {
                tenant.status = status;
                tenant.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn update_settings(&self, id: Uuid, settings: &serde_json::Value) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(match tables.tenants.get_mut(&id) {
            Some(tenant) => {
                tenant.settings = settings.clone();
                tenant.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn list(&self) -> AppResult<Vec<Tenant>> {
        let tables = self.tables.lock().await;
        let mut tenants: Vec<Tenant> = tables.tenants.values().cloned().collect();
        tenants.sort_by_key(|t| t.created_at);
        Ok(tenants)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> AppResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .get(&id)
            .filter(|u| u.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_by_id_unscoped(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, tenant_id: Uuid, email: &str) -> AppResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.tenant_id == tenant_id && u.email == email)
            .cloned())
    }

    async fn find_by_email_unscoped(&self, email: &str) -> AppResult<Vec<User>> {
        let tables = self.tables.lock().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| u.email == email)
            .cloned()
            .collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        let mut tables = self.tables.lock().await;
        let taken = tables
            .users
            .values()
            .any(|u| u.tenant_id == data.tenant_id && u.email == data.email);
        if taken {
            return Err(AppError::conflict("Failed to create user: duplicate entry"));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            tenant_id: data.tenant_id,
            email: data.email.clone(),
            password_hash: data.password_hash.clone(),
            role: data.role,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        tables.profiles.insert(
            user.id,
            UserProfile {
                user_id: user.id,
                tenant_id: user.tenant_id,
                display_name: data.display_name.clone(),
                created_at: now,
            },
        );
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_profile(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .profiles
            .get(&user_id)
            .filter(|p| p.tenant_id == tenant_id)
            .cloned())
    }

    async fn update_password(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        password_hash: &str,
    ) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(match tables.user_mut(tenant_id, id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn update_role(&self, tenant_id: Uuid, id: Uuid, role: UserRole) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(match tables.user_mut(tenant_id, id) {
            Some(user) => {
                user.role = role;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn set_active(&self, tenant_id: Uuid, id: Uuid, active: bool) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(match tables.user_mut(tenant_id, id) {
            Some(user) => {
                user.is_active = active;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn touch_last_login(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if let Some(user) = tables.user_mut(tenant_id, id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn create(&self, data: &CreateSession) -> AppResult<Session> {
        self.tables.lock().await.insert_session(data, None)
    }

    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> AppResult<Option<Session>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sessions
            .get(&id)
            .filter(|s| s.tenant_id == tenant_id)
            .cloned())
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Session>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sessions
            .values()
            .find(|s| s.token_hash == token_hash)
            .cloned())
    }

    async fn find_with_context(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<SessionWithContext>> {
        let tables = self.tables.lock().await;
        let Some(session) = tables.sessions.get(&id).filter(|s| s.tenant_id == tenant_id) else {
            return Ok(None);
        };
        let user = tables
            .users
            .get(&session.user_id)
            .filter(|u| u.tenant_id == tenant_id);
        let tenant = tables.tenants.get(&tenant_id);
        Ok(match (user, tenant) {
            (Some(user), Some(tenant)) => Some(SessionWithContext {
                session: session.clone(),
                user: user.clone(),
                tenant: tenant.clone(),
            }),
            _ => None,
        })
    }

    async fn list_for_user(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<Vec<Session>> {
        Ok(self
            .tables
            .lock()
            .await
            .user_sessions_oldest_first(tenant_id, user_id))
    }

    async fn list_for_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<Session>> {
        let tables = self.tables.lock().await;
        let mut sessions: Vec<Session> = tables
            .sessions
            .values()
            .filter(|s| s.tenant_id == tenant_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.created_at, s.id));
        Ok(sessions)
    }

    async fn count_active(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .sessions
            .values()
            .filter(|s| s.tenant_id == tenant_id && s.user_id == user_id && s.expires_at > now)
            .count() as u64)
    }

    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        let owned = tables
            .sessions
            .get(&id)
            .is_some_and(|s| s.tenant_id == tenant_id);
        Ok(owned && tables.sessions.remove(&id).is_some())
    }

    async fn delete_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Session>> {
        let mut tables = self.tables.lock().await;
        let id = tables
            .sessions
            .values()
            .find(|s| s.token_hash == token_hash)
            .map(|s| s.id);
        Ok(id.and_then(|id| tables.sessions.remove(&id)))
    }

    async fn delete_all_for_user(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<Vec<Uuid>> {
        let mut tables = self.tables.lock().await;
        let ids: Vec<Uuid> = tables
            .user_sessions_oldest_first(tenant_id, user_id)
            .into_iter()
            .map(|s| s.id)
            .collect();
        for id in &ids {
            tables.sessions.remove(id);
        }
        Ok(ids)
    }

    async fn delete_all_for_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<Uuid>> {
        let mut tables = self.tables.lock().await;
        let ids: Vec<Uuid> = tables
            .sessions
            .values()
            .filter(|s| s.tenant_id == tenant_id)
            .map(|s| s.id)
            .collect();
        for id in &ids {
            tables.sessions.remove(id);
        }
        Ok(ids)
    }

    async fn delete_oldest_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        count: u64,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>> {
        let mut tables = self.tables.lock().await;
        let ids: Vec<Uuid> = tables
            .user_sessions_oldest_first(tenant_id, user_id)
            .into_iter()
            .filter(|s| s.expires_at > now)
            .take(usize::try_from(count).unwrap_or(usize::MAX))
            .map(|s| s.id)
            .collect();
        for id in &ids {
            tables.sessions.remove(id);
        }
        Ok(ids)
    }

    async fn rotate(
        &self,
        tenant_id: Uuid,
        old_id: Uuid,
        old_token_hash: &str,
        replacement: &CreateSession,
        active_at: DateTime<Utc>,
    ) -> AppResult<Option<Session>> {
        let mut tables = self.tables.lock().await;
        let current = tables
            .sessions
            .get(&old_id)
            .is_some_and(|s| s.tenant_id == tenant_id && s.token_hash == old_token_hash);
        if !current {
            return Ok(None);
        }
        tables.sessions.remove(&old_id);
        tables.insert_session(replacement, Some(active_at)).map(Some)
    }

    async fn touch(&self, tenant_id: Uuid, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(match tables.sessions.get_mut(&id) {
            Some(session) if session.tenant_id == tenant_id => {
                session.last_active_at = Some(at);
                true
            }
            _ => false,
        })
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.expires_at > now);
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[async_trait]
impl PasswordResetRepository for MemoryStore {
    async fn create(&self, data: &CreatePasswordResetToken) -> AppResult<PasswordResetToken> {
        let mut tables = self.tables.lock().await;
        if tables
            .reset_tokens
            .values()
            .any(|t| t.token_hash == data.token_hash)
        {
            return Err(AppError::conflict("Failed to create reset token: duplicate entry"));
        }
        let token = PasswordResetToken {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            tenant_id: data.tenant_id,
            token_hash: data.token_hash.clone(),
            expires_at: data.expires_at,
            used_at: None,
            created_at: data.created_at,
        };
        tables.reset_tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<PasswordResetToken>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reset_tokens
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    async fn mark_used(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(match tables.reset_tokens.get_mut(&id) {
            Some(token) if token.used_at.is_none() => {
                token.used_at = Some(at);
                true
            }
            _ => false,
        })
    }

    async fn delete_others_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        keep: Uuid,
    ) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.reset_tokens.len();
        tables
            .reset_tokens
            .retain(|id, t| *id == keep || t.tenant_id != tenant_id || t.user_id != user_id);
        Ok((before - tables.reset_tokens.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.reset_tokens.len();
        tables.reset_tokens.retain(|_, t| t.expires_at > now);
        Ok((before - tables.reset_tokens.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn create_session(
        tenant_id: Uuid,
        user_id: Uuid,
        hash: &str,
        at: DateTime<Utc>,
    ) -> CreateSession {
        CreateSession {
            user_id,
            tenant_id,
            token_hash: hash.to_string(),
            expires_at: at + Duration::days(30),
            created_at: at,
            ip_address: Some("10.0.0.1".into()),
            device_fingerprint: None,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn test_rotate_consumes_old_row_once() {
        let store = MemoryStore::new();
        let (tenant, user) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();
        let original = SessionRepository::create(&store, &create_session(tenant, user, "a", now))
            .await
            .unwrap();

        let first = store
            .rotate(tenant, original.id, "a", &create_session(tenant, user, "b", now), now)
            .await
            .unwrap();
        let replacement = first.expect("first rotation wins");
        assert_eq!(replacement.last_active_at, Some(now));

        let second = store
            .rotate(tenant, original.id, "a", &create_session(tenant, user, "c", now), now)
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_rotate_rejects_other_tenant() {
        let store = MemoryStore::new();
        let (tenant, user) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();
        let original = SessionRepository::create(&store, &create_session(tenant, user, "a", now))
            .await
            .unwrap();

        let other = Uuid::new_v4();
        let rotated = store
            .rotate(other, original.id, "a", &create_session(other, user, "b", now), now)
            .await
            .unwrap();
        assert!(rotated.is_none());
        assert!(SessionRepository::find_by_id(&store, tenant, original.id)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_duplicate_token_hash_conflicts() {
        let store = MemoryStore::new();
        let (tenant, user) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();
        SessionRepository::create(&store, &create_session(tenant, user, "a", now))
            .await
            .unwrap();
        let err = SessionRepository::create(&store, &create_session(tenant, user, "a", now))
            .await
            .unwrap_err();
        assert_eq!(err.kind, tollgate_core::error::ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_delete_oldest_takes_earliest_created() {
        let store = MemoryStore::new();
        let (tenant, user) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();
        let mut ids = Vec::new();
        for (i, hash) in ["a", "b", "c"].iter().enumerate() {
            let at = now + Duration::minutes(i as i64);
            let s = SessionRepository::create(&store, &create_session(tenant, user, hash, at))
                .await
                .unwrap();
            ids.push(s.id);
        }

        let evicted = store
            .delete_oldest_for_user(tenant, user, 2, now)
            .await
            .unwrap();
        assert_eq!(evicted, ids[..2].to_vec());
        let remaining = store.list_for_user(tenant, user).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, ids[2]);
    }

    #[tokio::test]
    async fn test_user_email_unique_per_tenant() {
        let store = MemoryStore::new();
        let data = CreateUser {
            tenant_id: Uuid::new_v4(),
            email: "a@x.com".into(),
            password_hash: "hash".into(),
            role: UserRole::Member,
            display_name: None,
        };
        let user = UserRepository::create(&store, &data).await.unwrap();
        assert!(UserRepository::create(&store, &data).await.is_err());

        let elsewhere = CreateUser {
            tenant_id: Uuid::new_v4(),
            ..data
        };
        UserRepository::create(&store, &elsewhere).await.unwrap();
        assert_eq!(store.find_by_email_unscoped("a@x.com").await.unwrap().len(), 2);
        assert!(store.find_profile(user.tenant_id, user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_mark_used_is_single_shot() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let token = PasswordResetRepository::create(
            &store,
            &CreatePasswordResetToken {
                user_id: Uuid::new_v4(),
                tenant_id: Uuid::new_v4(),
                token_hash: "r".into(),
                expires_at: now + Duration::hours(1),
                created_at: now,
            },
        )
        .await
        .unwrap();

        assert!(store.mark_used(token.id, now).await.unwrap());
        assert!(!store.mark_used(token.id, now).await.unwrap());
    }
}
