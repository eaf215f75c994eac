//! Dual-key token issuing and validation for microservices.
//!
//! Tokens are compact HS256 JWS strings signed with either a per-service
//! access key or a global key shared between services.

mod claims;
mod codec;
mod config;
mod key;
mod service;

pub use claims::{Claims, EXPIRATION, ISSUED_AT};
pub use codec::{decode_token, encode_token};
pub use config::{
    TokenConfig, ACCESS_KEY_VAR, DEFAULT_EXPIRATION_HOURS_VAR, GLOBAL_KEY_VAR, LEEWAY_SECS_VAR,
};
pub use key::{hmac_key, HmacSha256, KeyKind, MIN_KEY_LEN};
pub use service::{strip_bearer, TokenService, TokenStatus, BEARER_PREFIX};

pub use error::AuthError;
