//! # tollgate-database
//!
//! Tenant-scoped store adapters for Tollgate: the repository traits the
//! session core is written against, their PostgreSQL implementations, an
//! in-memory implementation, and pool/migration management.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;

pub use connection::{DatabasePool, PgRepositories};
pub use memory::MemoryStore;
pub use repositories::{
    PasswordResetRepository, PgPasswordResetRepository, PgSessionRepository, PgTenantRepository,
    PgUserRepository, SessionRepository, TenantRepository, UserRepository,
};
