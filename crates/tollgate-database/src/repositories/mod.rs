//! Store adapter traits and their PostgreSQL implementations.
//!
//! Every query that touches users, sessions, or reset tokens carries a
//! tenant predicate, except the lookups keyed by a secret digest (the
//! digest itself identifies the tenant) and the explicitly `unscoped`
//! lookups used to detect cross-tenant requests.

pub mod password_reset;
pub mod session;
pub mod tenant;
pub mod user;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use tollgate_core::error::{AppError, ErrorKind};
use tollgate_core::result::AppResult;
use tollgate_entity::reset::{CreatePasswordResetToken, PasswordResetToken};
use tollgate_entity::session::{CreateSession, Session, SessionWithContext};
use tollgate_entity::tenant::{CreateTenant, Tenant, TenantStatus};
use tollgate_entity::user::{CreateUser, User, UserProfile, UserRole};

pub use password_reset::PgPasswordResetRepository;
pub use session::PgSessionRepository;
pub use tenant::PgTenantRepository;
pub use user::PgUserRepository;

/// Tenant rows. Read by the core; written by provisioning and suspension.
#[async_trait]
pub trait TenantRepository: Send + Sync + 'static {
    /// Find a tenant by ID.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Tenant>>;

    /// Find a tenant by slug.
    async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Tenant>>;

    /// Create a tenant. Fails with a conflict if the slug is taken.
    async fn create(&self, data: &CreateTenant) -> AppResult<Tenant>;

    /// Return the tenant with `data.slug`, creating it if absent.
    async fn find_or_create(&self, data: &CreateTenant) -> AppResult<Tenant>;

    /// Change a tenant's status. Returns `false` if the tenant does not exist.
    async fn update_status(&self, id: Uuid, status: TenantStatus) -> AppResult<bool>;

    /// Replace a tenant's settings blob. Returns `false` if the tenant does not exist.
    async fn update_settings(&self, id: Uuid, settings: &serde_json::Value) -> AppResult<bool>;

    /// List all tenants ordered by creation.
    async fn list(&self) -> AppResult<Vec<Tenant>>;
}

/// User rows, scoped by tenant.
#[async_trait]
pub trait UserRepository: Send + Sync + 'static {
    /// Find a user by ID within a tenant.
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by ID in any tenant.
    async fn find_by_id_unscoped(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find a user by normalized email within a tenant.
    async fn find_by_email(&self, tenant_id: Uuid, email: &str) -> AppResult<Option<User>>;

    /// Find users with this normalized email in any tenant.
    async fn find_by_email_unscoped(&self, email: &str) -> AppResult<Vec<User>>;

    /// Create a user and its profile row. Fails with a conflict if the
    /// email is already registered in the tenant.
    async fn create(&self, data: &CreateUser) -> AppResult<User>;

    /// Find the profile row of a user.
    async fn find_profile(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<Option<UserProfile>>;

    /// Replace the password hash.
    async fn update_password(&self, tenant_id: Uuid, id: Uuid, password_hash: &str)
    -> AppResult<bool>;

    /// Change the role.
    async fn update_role(&self, tenant_id: Uuid, id: Uuid, role: UserRole) -> AppResult<bool>;

    /// Activate or deactivate the account.
    async fn set_active(&self, tenant_id: Uuid, id: Uuid, active: bool) -> AppResult<bool>;

    /// Record a successful login.
    async fn touch_last_login(&self, tenant_id: Uuid, id: Uuid, at: DateTime<Utc>)
    -> AppResult<()>;
}

/// Session rows. Deleting a row is the single revocation primitive.
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    /// Insert a session row. Fails with a conflict if the token hash exists.
    async fn create(&self, data: &CreateSession) -> AppResult<Session>;

    /// Find a session by ID within a tenant.
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> AppResult<Option<Session>>;

    /// Find a session by refresh-token digest.
    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Session>>;

    /// Find a session with its owning user and tenant.
    async fn find_with_context(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<SessionWithContext>>;

    /// List a user's sessions, oldest first.
    async fn list_for_user(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<Vec<Session>>;

    /// List a tenant's sessions, oldest first.
    async fn list_for_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<Session>>;

    /// Count a user's sessions whose refresh window is still open at `now`.
    async fn count_active(&self, tenant_id: Uuid, user_id: Uuid, now: DateTime<Utc>)
    -> AppResult<u64>;

    /// Delete one session. Returns `false` if it did not exist.
    async fn delete(&self, tenant_id: Uuid, id: Uuid) -> AppResult<bool>;

    /// Delete the session holding this refresh-token digest and return it.
    async fn delete_by_token_hash(&self, token_hash: &str) -> AppResult<Option<Session>>;

    /// Delete all of a user's sessions and return their IDs.
    async fn delete_all_for_user(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Delete all of a tenant's sessions and return their IDs.
    async fn delete_all_for_tenant(&self, tenant_id: Uuid) -> AppResult<Vec<Uuid>>;

    /// Delete up to `count` of a user's oldest sessions still open at `now`
    /// and return their IDs.
    async fn delete_oldest_for_user(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        count: u64,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>>;

    /// Atomically replace a session: delete `old_id` only if it still holds
    /// `old_token_hash`, then insert `replacement` with `last_active_at`
    /// set to `active_at`.
    ///
    /// Returns `None`, and inserts nothing, when the old row was already
    /// gone. A presented refresh token can therefore rotate at most once.
    async fn rotate(
        &self,
        tenant_id: Uuid,
        old_id: Uuid,
        old_token_hash: &str,
        replacement: &CreateSession,
        active_at: DateTime<Utc>,
    ) -> AppResult<Option<Session>>;

    /// Set `last_active_at`. Returns `false` if the session does not exist.
    async fn touch(&self, tenant_id: Uuid, id: Uuid, at: DateTime<Utc>) -> AppResult<bool>;

    /// Delete every session whose refresh window closed before `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Password reset token rows.
#[async_trait]
pub trait PasswordResetRepository: Send + Sync + 'static {
    /// Store a new reset token.
    async fn create(&self, data: &CreatePasswordResetToken) -> AppResult<PasswordResetToken>;

    /// Find a token by digest, consumed or not.
    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<PasswordResetToken>>;

    /// Mark a token used. Returns `false` if it was already used or is gone.
    async fn mark_used(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<bool>;

    /// Delete a user's tokens other than `keep`.
    async fn delete_others_for_user(&self, tenant_id: Uuid, user_id: Uuid, keep: Uuid)
    -> AppResult<u64>;

    /// Delete tokens that expired before `now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64>;
}

/// Map a sqlx error, turning unique violations into conflicts.
pub(crate) fn map_db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| {
        let unique = e
            .as_database_error()
            .is_some_and(|db| db.is_unique_violation());
        if unique {
            AppError::with_source(ErrorKind::Conflict, format!("{context}: duplicate entry"), e)
        } else {
            AppError::with_source(ErrorKind::Database, context, e)
        }
    }
}
