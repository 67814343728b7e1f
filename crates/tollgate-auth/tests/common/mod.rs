#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{Value, json};
use uuid::Uuid;

use tollgate_auth::events::RecordingPublisher;
use tollgate_auth::password::DenylistScreen;
use tollgate_auth::{
    AuthResult, AuthServices, AuthenticatedSession, LoginRequest, RegisterRequest, Stores,
};
use tollgate_core::config::{AppConfig, PasswordConfig};
use tollgate_core::traits::ManualClock;
use tollgate_core::types::RequestContext;
use tollgate_database::MemoryStore;
use tollgate_entity::tenant::{CreateTenant, Tenant, TenantStatus};

pub const PASSWORD: &str = "valid pass 1234";

pub struct Harness {
    pub store: MemoryStore,
    pub clock: ManualClock,
    pub events: RecordingPublisher,
    pub services: AuthServices,
}

pub fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config.password = PasswordConfig {
        argon2_memory_kib: 64,
        argon2_iterations: 1,
        argon2_parallelism: 1,
        ..PasswordConfig::default()
    };
    config
}

pub fn harness() -> Harness {
    harness_with(config())
}

pub fn harness_with(config: AppConfig) -> Harness {
    let store = MemoryStore::new();
    let clock = ManualClock::default();
    let events = RecordingPublisher::new();
    let services = AuthServices::builder(config, Stores::memory(&store))
        .clock(Arc::new(clock.clone()))
        .publisher(Arc::new(events.clone()))
        .screen(Arc::new(DenylistScreen::new(["password1234", "letmein12345"])))
        .build()
        .expect("services build");
    Harness {
        store,
        clock,
        events,
        services,
    }
}

pub fn ctx() -> RequestContext {
    RequestContext::from_ip("1.1.1.1").with_device("device-a")
}

pub fn session_settings(session: Value) -> Value {
    json!({ "session": session })
}

impl Harness {
    pub async fn tenant(&self, slug: &str, settings: Value) -> Tenant {
        self.services
            .tenants
            .create(&CreateTenant {
                slug: slug.to_string(),
                name: slug.to_string(),
                status: TenantStatus::Active,
                settings,
            })
            .await
            .expect("create tenant")
    }

    pub async fn register(
        &self,
        tenant_id: Option<Uuid>,
        email: &str,
    ) -> AuthResult<AuthenticatedSession> {
        self.services
            .sessions
            .register(
                RegisterRequest {
                    email: email.to_string(),
                    password: PASSWORD.to_string(),
                    display_name: None,
                    tenant_id,
                },
                &ctx(),
            )
            .await
    }

    pub async fn login(
        &self,
        tenant_id: Option<Uuid>,
        email: &str,
        password: &str,
    ) -> AuthResult<AuthenticatedSession> {
        self.login_from(tenant_id, email, password, &ctx()).await
    }

    pub async fn login_from(
        &self,
        tenant_id: Option<Uuid>,
        email: &str,
        password: &str,
        ctx: &RequestContext,
    ) -> AuthResult<AuthenticatedSession> {
        self.services
            .sessions
            .login(
                LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                    tenant_id,
                },
                ctx,
            )
            .await
    }
}
