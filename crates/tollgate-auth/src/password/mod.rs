//! Password hashing, policy enforcement and the reset flow.

pub mod hasher;
pub mod reset;
pub mod rules;
pub mod screen;
pub mod validator;

pub use hasher::{CredentialHasher, digest_token};
pub use reset::{PasswordResetOutcome, PasswordResetService};
pub use rules::PasswordRules;
pub use screen::{DenylistScreen, EntropyScreen, PasswordScreen};
pub use validator::PasswordValidator;
