//! Shared value types.

pub mod request;
pub mod session_limit;
pub mod span;

pub use request::RequestContext;
pub use session_limit::SessionLimit;
