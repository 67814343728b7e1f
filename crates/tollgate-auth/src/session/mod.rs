//! Session lifecycle: persistence, issuance, rotation and cleanup.

pub mod binding;
pub mod cleanup;
pub mod manager;
pub mod request;
pub mod store;

pub use binding::binding_violations;
pub use cleanup::{CleanupReport, SessionCleanup};
pub use manager::SessionManager;
pub use request::{
    AuthenticatedSession, LoginRequest, RegisterRequest, RotatedSession, SessionSummary,
};
pub use store::{IssuedSession, SessionStore};
