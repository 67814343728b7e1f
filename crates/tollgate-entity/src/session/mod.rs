//! Session domain entities.

pub mod model;
pub mod policy;

pub use model::{CreateSession, Session, SessionWithContext};
pub use policy::{SessionPolicy, TimeoutKind};
