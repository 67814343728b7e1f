//! User domain entities.

pub mod model;
pub mod profile;
pub mod role;

pub use model::{CreateUser, User};
pub use profile::UserProfile;
pub use role::UserRole;
