//! Access credential signing/verification and refresh secrets.

pub mod claims;
pub mod decoder;
pub mod encoder;
pub mod issuer;
pub mod secret;

pub use claims::AccessClaims;
pub use decoder::JwtDecoder;
pub use encoder::{AccessToken, JwtEncoder};
pub use issuer::TokenIssuer;
