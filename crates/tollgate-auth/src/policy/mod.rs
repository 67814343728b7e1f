//! Session policy resolution.

pub mod resolver;

pub use resolver::PolicyResolver;
