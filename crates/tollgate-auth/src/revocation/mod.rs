//! Revocation entry points. All of them end in session row deletion.

pub mod dispatcher;

pub use dispatcher::{
    FederatedIdentity, FederatedRevocationOutcome, RevocationDispatcher, RoleChangeOutcome,
};
