mod common;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use tollgate_auth::{AuthError, AuthServices, LoginRequest, RegisterRequest, Stores};
use tollgate_core::error::AppError;
use tollgate_core::result::AppResult;
use tollgate_core::traits::ManualClock;
use tollgate_database::{MemoryStore, UserRepository};
use tollgate_entity::user::{CreateUser, User, UserProfile, UserRole};

use common::{PASSWORD, config, ctx};

/// Delegates to the memory store but cannot record logins.
struct NoLoginTouch(MemoryStore);

#[async_trait]
impl UserRepository for NoLoginTouch {
    async fn find_by_id(&self, tenant_id: Uuid, id: Uuid) -> AppResult<Option<User>> {
        self.0.find_by_id(tenant_id, id).await
    }

    async fn find_by_id_unscoped(&self, id: Uuid) -> AppResult<Option<User>> {
        self.0.find_by_id_unscoped(id).await
    }

    async fn find_by_email(&self, tenant_id: Uuid, email: &str) -> AppResult<Option<User>> {
        self.0.find_by_email(tenant_id, email).await
    }

    async fn find_by_email_unscoped(&self, email: &str) -> AppResult<Vec<User>> {
        self.0.find_by_email_unscoped(email).await
    }

    async fn create(&self, data: &CreateUser) -> AppResult<User> {
        UserRepository::create(&self.0, data).await
    }

    async fn find_profile(&self, tenant_id: Uuid, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        self.0.find_profile(tenant_id, user_id).await
    }

    async fn update_password(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        password_hash: &str,
    ) -> AppResult<bool> {
        self.0.update_password(tenant_id, id, password_hash).await
    }

    async fn update_role(&self, tenant_id: Uuid, id: Uuid, role: UserRole) -> AppResult<bool> {
        self.0.update_role(tenant_id, id, role).await
    }

    async fn set_active(&self, tenant_id: Uuid, id: Uuid, active: bool) -> AppResult<bool> {
        self.0.set_active(tenant_id, id, active).await
    }

    async fn touch_last_login(
        &self,
        _tenant_id: Uuid,
        _id: Uuid,
        _at: DateTime<Utc>,
    ) -> AppResult<()> {
        Err(AppError::database("connection reset"))
    }
}

#[tokio::test]
async fn test_failed_login_bookkeeping_leaves_no_session() {
    let store = MemoryStore::new();
    let stores = Stores {
        users: Arc::new(NoLoginTouch(store.clone())),
        ..Stores::memory(&store)
    };
    let services = AuthServices::builder(config(), stores)
        .clock(Arc::new(ManualClock::default()))
        .build()
        .unwrap();

    services
        .sessions
        .register(
            RegisterRequest {
                email: "a@x.com".into(),
                password: PASSWORD.into(),
                display_name: None,
                tenant_id: None,
            },
            &ctx(),
        )
        .await
        .unwrap();
    assert_eq!(store.session_count().await, 1);

    let err = services
        .sessions
        .login(
            LoginRequest {
                email: "a@x.com".into(),
                password: PASSWORD.into(),
                tenant_id: None,
            },
            &ctx(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Internal(_)));
    assert_eq!(store.session_count().await, 1);
}
