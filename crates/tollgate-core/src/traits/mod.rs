//! Capabilities consumed by the session authority.
//!
//! Implementations live in other crates (or in callers); the core only
//! depends on these shapes.

pub mod abuse;
pub mod clock;
pub mod hasher;
pub mod publisher;

pub use abuse::{AbuseGuard, AbuseVerdict};
pub use clock::{Clock, ManualClock, SystemClock};
pub use hasher::{HashPurpose, SecretHasher};
pub use publisher::EventPublisher;
