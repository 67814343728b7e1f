//! Tenant resolution, status gating and suspension.

pub mod directory;

pub use directory::TenantDirectory;
