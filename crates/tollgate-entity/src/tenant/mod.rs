//! Tenant domain entities.

pub mod model;
pub mod settings;
pub mod status;

pub use model::{CreateTenant, Tenant};
pub use settings::SessionPolicyOverrides;
pub use status::TenantStatus;
