//! # tollgate-core
//!
//! Core crate for Tollgate. Contains the unified error system, configuration
//! schemas, domain events, request context types, and the traits for the
//! capabilities the session authority consumes (hashing, event publication,
//! abuse limiting, time).
//!
//! This crate has **no** internal dependencies on other Tollgate crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
