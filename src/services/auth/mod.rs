/*
 * Responsibility
 * - Access token signing and verification (HS512, single shared secret)
 * - Conversion of a verified token into an AuthenticationContext
 * - Extraction from HTTP requests lives in middleware, not here
 */
pub mod claims;
pub mod clock;
pub mod factory;
pub mod token_codec;

pub use claims::{AuthenticationContext, RequestMetadata, TokenClaims, VerifiedClaims};
pub use factory::build_token_codec;
pub use token_codec::{TokenCodec, TokenError};
