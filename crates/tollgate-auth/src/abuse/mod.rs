//! Abuse guard implementations.

pub mod memory;

pub use memory::{MemoryAbuseGuard, NoopAbuseGuard};
