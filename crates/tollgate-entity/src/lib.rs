//! # tollgate-entity
//!
//! Domain entity models for Tollgate. Every struct in this crate represents
//! a database row or a derived value object. Row types additionally derive
//! `sqlx::FromRow`.

pub mod reset;
pub mod session;
pub mod tenant;
pub mod user;
