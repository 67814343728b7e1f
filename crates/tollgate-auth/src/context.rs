//! Service wiring: builds every component of the session authority from
//! configuration and a set of store adapters.

use std::sync::Arc;

use tracing::info;

use tollgate_core::config::AppConfig;
use tollgate_core::result::AppResult;
use tollgate_core::traits::{AbuseGuard, Clock, EventPublisher, SecretHasher, SystemClock};
use tollgate_database::{
    MemoryStore, PasswordResetRepository, PgRepositories, SessionRepository, TenantRepository,
    UserRepository,
};

use crate::abuse::{MemoryAbuseGuard, NoopAbuseGuard};
use crate::events::TracingPublisher;
use crate::gate::AccessGate;
use crate::password::{
    CredentialHasher, EntropyScreen, PasswordResetService, PasswordRules, PasswordScreen,
    PasswordValidator,
};
use crate::policy::PolicyResolver;
use crate::revocation::RevocationDispatcher;
use crate::session::{SessionCleanup, SessionManager, SessionStore};
use crate::tenant::TenantDirectory;
use crate::token::JwtCodec;

/// The store adapters the core runs against.
#[derive(Clone)]
pub struct Stores {
    /// Tenant rows.
    pub tenants: Arc<dyn TenantRepository>,
    /// User rows.
    pub users: Arc<dyn UserRepository>,
    /// Session rows.
    pub sessions: Arc<dyn SessionRepository>,
    /// Reset token rows.
    pub reset_tokens: Arc<dyn PasswordResetRepository>,
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish()
    }
}

impl Stores {
    /// All four adapters backed by one in-memory store.
    pub fn memory(store: &MemoryStore) -> Self {
        Self {
            tenants: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            sessions: Arc::new(store.clone()),
            reset_tokens: Arc::new(store.clone()),
        }
    }

    /// The PostgreSQL adapters.
    pub fn postgres(repos: PgRepositories) -> Self {
        Self {
            tenants: Arc::new(repos.tenants),
            users: Arc::new(repos.users),
            sessions: Arc::new(repos.sessions),
            reset_tokens: Arc::new(repos.reset_tokens),
        }
    }
}

/// Every service of the session authority, sharing one set of collaborators.
#[derive(Debug, Clone)]
pub struct AuthServices {
    /// Register, login, refresh, logout.
    pub sessions: Arc<SessionManager>,
    /// Bearer token verification.
    pub gate: Arc<AccessGate>,
    /// Administrative, role-change and federated revocation.
    pub revocation: Arc<RevocationDispatcher>,
    /// Password reset flow.
    pub password_reset: Arc<PasswordResetService>,
    /// Tenant resolution and suspension.
    pub tenants: Arc<TenantDirectory>,
    /// Expired-row sweep.
    pub cleanup: Arc<SessionCleanup>,
    /// Session persistence, for listing and inspection.
    pub session_store: Arc<SessionStore>,
    /// Policy resolution.
    pub policy: Arc<PolicyResolver>,
    /// Access token codec.
    pub tokens: Arc<JwtCodec>,
}

impl AuthServices {
    /// Start building services for `config` over `stores`.
    pub fn builder(config: AppConfig, stores: Stores) -> AuthServicesBuilder {
        AuthServicesBuilder {
            config,
            stores,
            clock: None,
            publisher: None,
            screen: None,
            hasher: None,
            abuse: None,
        }
    }
}

/// Collects optional collaborators; anything left unset gets a default.
pub struct AuthServicesBuilder {
    config: AppConfig,
    stores: Stores,
    clock: Option<Arc<dyn Clock>>,
    publisher: Option<Arc<dyn EventPublisher>>,
    screen: Option<Arc<dyn PasswordScreen>>,
    hasher: Option<Arc<dyn SecretHasher>>,
    abuse: Option<Arc<dyn AbuseGuard>>,
}

impl std::fmt::Debug for AuthServicesBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthServicesBuilder")
            .field("config", &self.config)
            .finish()
    }
}

impl AuthServicesBuilder {
    /// Use this clock instead of the system clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Publish events here instead of the tracing log.
    pub fn publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Screen passwords with this instead of the zxcvbn entropy screen.
    pub fn screen(mut self, screen: Arc<dyn PasswordScreen>) -> Self {
        self.screen = Some(screen);
        self
    }

    /// Hash secrets with this instead of the configured argon2id hasher.
    pub fn hasher(mut self, hasher: Arc<dyn SecretHasher>) -> Self {
        self.hasher = Some(hasher);
        self
    }

    /// Use this abuse guard instead of the configured one.
    pub fn abuse_guard(mut self, abuse: Arc<dyn AbuseGuard>) -> Self {
        self.abuse = Some(abuse);
        self
    }

    /// Wire everything together.
    pub fn build(self) -> AppResult<AuthServices> {
        let Self {
            config,
            stores,
            clock,
            publisher,
            screen,
            hasher,
            abuse,
        } = self;

        let clock: Arc<dyn Clock> = clock.unwrap_or_else(|| Arc::new(SystemClock));
        let publisher: Arc<dyn EventPublisher> =
            publisher.unwrap_or_else(|| Arc::new(TracingPublisher));
        let screen: Arc<dyn PasswordScreen> = screen
            .unwrap_or_else(|| Arc::new(EntropyScreen::new(config.password.min_entropy_score)));
        let hasher: Arc<dyn SecretHasher> = match hasher {
            Some(hasher) => hasher,
            None => Arc::new(CredentialHasher::new(&config.password)?),
        };
        let abuse: Arc<dyn AbuseGuard> = match abuse {
            Some(abuse) => abuse,
            None if config.abuse.enabled => {
                Arc::new(MemoryAbuseGuard::new(&config.abuse, Arc::clone(&clock)))
            }
            None => Arc::new(NoopAbuseGuard),
        };

        let policy = Arc::new(PolicyResolver::new(config.session.clone()));
        let tokens = Arc::new(JwtCodec::new(&config.auth, Arc::clone(&clock)));
        let rules = PasswordRules::new(PasswordValidator::new(config.password.clone()), screen);

        let session_store = Arc::new(SessionStore::new(
            Arc::clone(&stores.sessions),
            Arc::clone(&hasher),
            config.auth.refresh_token_ttl_days,
        ));
        let tenants = Arc::new(TenantDirectory::new(
            Arc::clone(&stores.tenants),
            Arc::clone(&session_store),
            Arc::clone(&publisher),
            &config.auth,
        ));

        let sessions = Arc::new(SessionManager::new(
            Arc::clone(&stores.users),
            Arc::clone(&session_store),
            Arc::clone(&tenants),
            Arc::clone(&policy),
            Arc::clone(&tokens),
            Arc::clone(&hasher),
            rules.clone(),
            abuse,
            Arc::clone(&publisher),
            Arc::clone(&clock),
        ));
        let gate = Arc::new(AccessGate::new(
            tokens.clone(),
            Arc::clone(&session_store),
            Arc::clone(&tenants),
            Arc::clone(&publisher),
            Arc::clone(&clock),
            config.session.touch_on_access,
        ));
        let revocation = Arc::new(RevocationDispatcher::new(
            Arc::clone(&stores.users),
            Arc::clone(&session_store),
            Arc::clone(&tenants),
            Arc::clone(&policy),
            Arc::clone(&publisher),
        ));
        let password_reset = Arc::new(PasswordResetService::new(
            Arc::clone(&stores.users),
            Arc::clone(&stores.reset_tokens),
            Arc::clone(&hasher),
            rules,
            Arc::clone(&tenants),
            Arc::clone(&policy),
            Arc::clone(&session_store),
            Arc::clone(&publisher),
            Arc::clone(&clock),
            &config.auth,
        ));
        let cleanup = Arc::new(SessionCleanup::new(
            Arc::clone(&session_store),
            Arc::clone(&stores.reset_tokens),
            clock,
        ));

        info!(
            abuse_guard = config.abuse.enabled,
            refresh_ttl_days = config.auth.refresh_token_ttl_days,
            "Session authority initialized"
        );

        Ok(AuthServices {
            sessions,
            gate,
            revocation,
            password_reset,
            tenants,
            cleanup,
            session_store,
            policy,
            tokens,
        })
    }
}
