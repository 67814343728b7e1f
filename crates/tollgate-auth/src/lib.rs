//! # tollgate-auth
//!
//! The session authority: issues, rotates, times out, binds and revokes
//! user sessions backed by opaque refresh tokens and short-lived signed
//! access tokens.
//!
//! ## Modules
//!
//! - `policy`: tenant settings plus role to concrete session thresholds
//! - `token`: JWT access tokens and opaque refresh secrets
//! - `password`: argon2id hashing, password rules, screening, reset flow
//! - `session`: persistence, the lifecycle manager, binding and cleanup
//! - `gate`: bearer token to authenticated principal
//! - `revocation`: admin, role-change and federated revocation
//! - `tenant`: tenant resolution, status gating and suspension
//! - `abuse`: login/registration failure limiting
//! - `events`: event publisher implementations
//! - `context`: wiring of all of the above

pub mod abuse;
pub mod context;
pub mod error;
pub mod events;
pub mod gate;
pub mod password;
pub mod policy;
pub mod revocation;
pub mod session;
pub mod tenant;
pub mod token;

pub use context::{AuthServices, AuthServicesBuilder, Stores};
pub use error::{AuthError, AuthResult, BindingAttribute};
pub use gate::{AccessGate, Principal};
pub use password::{PasswordResetOutcome, PasswordResetService};
pub use policy::PolicyResolver;
pub use revocation::{
    FederatedIdentity, FederatedRevocationOutcome, RevocationDispatcher, RoleChangeOutcome,
};
pub use session::{
    AuthenticatedSession, LoginRequest, RegisterRequest, RotatedSession, SessionCleanup,
    SessionManager, SessionStore, SessionSummary,
};
pub use tenant::TenantDirectory;
pub use token::{AccessClaims, JwtCodec};
