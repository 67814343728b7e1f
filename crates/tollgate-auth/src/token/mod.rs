//! Token codec: signed access tokens and opaque refresh secrets.

pub mod claims;
pub mod codec;
pub mod refresh;

pub use claims::AccessClaims;
pub use codec::{IssuedAccessToken, JwtCodec, TokenError, TokenSigner};
pub use refresh::generate_opaque_token;
