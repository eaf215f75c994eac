//! Dual-key token service.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use error::AuthError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::claims::{Claims, EXPIRATION, ISSUED_AT};
use crate::codec::{decode_token, encode_token};
use crate::config::TokenConfig;
use crate::key::{hmac_key, HmacSha256, KeyKind};

/// Authorization scheme prefix accepted in front of a token.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Outcome of [`TokenService::validate_token`], convertible to an HTTP-style code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenStatus {
    /// Correctly signed and not expired (200)
    Ok,
    /// Wrong key or tampered token (401)
    SignatureInvalid,
    /// Correctly signed but past its expiration (423)
    Expired,
}

impl TokenStatus {
    pub const fn code(self) -> u16 {
        match self {
            TokenStatus::Ok => 200,
            TokenStatus::SignatureInvalid => 401,
            TokenStatus::Expired => 423,
        }
    }

    pub const fn is_ok(self) -> bool {
        matches!(self, TokenStatus::Ok)
    }
}

impl From<TokenStatus> for u16 {
    fn from(status: TokenStatus) -> Self {
        status.code()
    }
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Remove a leading `"Bearer "` scheme, if present.
pub fn strip_bearer(token: &str) -> &str {
    token.strip_prefix(BEARER_PREFIX).unwrap_or(token)
}

/// Issues and validates HS256 tokens signed with either the access or the
/// global key.
///
/// Every method that accepts a token strips a `"Bearer "` prefix first. The
/// service holds no mutable state and can be shared freely across threads.
#[derive(Clone)]
pub struct TokenService {
    access_key: HmacSha256,
    global_key: HmacSha256,
    default_expiration_hours: i64,
    leeway_secs: u64,
}

impl TokenService {
    /// Create a service from its configuration.
    ///
    /// Fails with [`AuthError::WeakKey`] if either secret is shorter than
    /// [`MIN_KEY_LEN`](crate::MIN_KEY_LEN) bytes.
    pub fn new(config: TokenConfig) -> Result<Self, AuthError> {
        Ok(Self {
            access_key: hmac_key(&config.access_key, KeyKind::Access)?,
            global_key: hmac_key(&config.global_key, KeyKind::Global)?,
            default_expiration_hours: config.default_expiration_hours,
            leeway_secs: config.leeway_secs,
        })
    }

    pub fn default_expiration_hours(&self) -> i64 {
        self.default_expiration_hours
    }

    /// Issue a token that expires `expiration_hours` hours from now.
    ///
    /// `claims` must serialize to a JSON object. Its `iat` and `exp` entries,
    /// if any, are replaced.
    pub fn issue<C: Serialize + ?Sized>(
        &self,
        claims: &C,
        expiration_hours: i64,
        kind: KeyKind,
    ) -> Result<String, AuthError> {
        let mut claims = Claims::from_serializable(claims)?;

        let now = Utc::now();
        let expires_at = TimeDelta::try_hours(expiration_hours)
            .and_then(|window| now.checked_add_signed(window))
            .ok_or_else(|| {
                AuthError::Serialization(format!(
                    "expiration of {} hours is out of range",
                    expiration_hours
                ))
            })?;

        claims.insert(ISSUED_AT, now.timestamp());
        claims.insert(EXPIRATION, expires_at.timestamp());

        let token = encode_token(&claims, self.key(kind))?;
        tracing::debug!(
            "Issued {} token with {} claims, expires at {}",
            kind,
            claims.len(),
            expires_at
        );
        Ok(token)
    }

    /// Issue a token using the configured default expiration.
    pub fn issue_with_default_expiry<C: Serialize + ?Sized>(
        &self,
        claims: &C,
        kind: KeyKind,
    ) -> Result<String, AuthError> {
        self.issue(claims, self.default_expiration_hours, kind)
    }

    /// Verify the signature, decode the claims, and reject expired tokens.
    pub fn extract_all_claims(&self, token: &str, kind: KeyKind) -> Result<Claims, AuthError> {
        let claims = self.verify(token, kind)?;

        if let Some(exp) = claims.expiration_secs()? {
            if self.has_expired(exp, Utc::now()) {
                tracing::warn!("Rejected {} token that expired at {}", kind, exp);
                return Err(AuthError::TokenExpired { expired_at: exp });
            }
        }

        Ok(claims)
    }

    /// Expiration instant of a valid, unexpired token.
    pub fn extract_expiration(
        &self,
        token: &str,
        kind: KeyKind,
    ) -> Result<DateTime<Utc>, AuthError> {
        self.extract_all_claims(token, kind)?
            .expiration()
            .ok_or_else(|| AuthError::MissingClaim(EXPIRATION.to_string()))
    }

    /// A single claim of a valid, unexpired token.
    pub fn extract_claim(
        &self,
        token: &str,
        name: &str,
        kind: KeyKind,
    ) -> Result<Option<Value>, AuthError> {
        Ok(self.extract_all_claims(token, kind)?.get(name).cloned())
    }

    /// A single claim deserialized into `T`.
    pub fn extract_claim_as<T: DeserializeOwned>(
        &self,
        token: &str,
        name: &str,
        kind: KeyKind,
    ) -> Result<Option<T>, AuthError> {
        self.extract_all_claims(token, kind)?.get_as(name)
    }

    /// Whether a correctly signed token is past its expiration.
    ///
    /// Expiry is reported as `Ok(true)`. A bad signature or malformed token
    /// is still an error, as is a token without an `exp` claim.
    pub fn is_token_expired(&self, token: &str, kind: KeyKind) -> Result<bool, AuthError> {
        let exp = self
            .verify(token, kind)?
            .expiration_secs()?
            .ok_or_else(|| AuthError::MissingClaim(EXPIRATION.to_string()))?;

        Ok(self.has_expired(exp, Utc::now()))
    }

    /// Whether a correctly signed token is still within its lifetime.
    pub fn is_token_valid(&self, token: &str, kind: KeyKind) -> Result<bool, AuthError> {
        Ok(!self.is_token_expired(token, kind)?)
    }

    /// Map a token to 200 / 401 / 423.
    ///
    /// Failures other than a bad signature (for example a malformed token)
    /// are returned as errors.
    pub fn validate_token(&self, token: &str, kind: KeyKind) -> Result<TokenStatus, AuthError> {
        match self.is_token_valid(token, kind) {
            Ok(true) => Ok(TokenStatus::Ok),
            Ok(false) => Ok(TokenStatus::Expired),
            Err(AuthError::SignatureInvalid) => Ok(TokenStatus::SignatureInvalid),
            Err(e) => Err(e),
        }
    }

    /// Whether the caller presented an unexpired token signed with the global key.
    ///
    /// An absent or empty token is `Ok(false)`. A token that is present but
    /// not signed with the global key is an error.
    pub fn is_microservice(&self, token: Option<&str>) -> Result<bool, AuthError> {
        match token.map(strip_bearer) {
            Some(token) if !token.is_empty() => self.is_token_valid(token, KeyKind::Global),
            _ => Ok(false),
        }
    }

    fn verify(&self, token: &str, kind: KeyKind) -> Result<Claims, AuthError> {
        decode_token(strip_bearer(token), self.key(kind)).map_err(|e| {
            tracing::warn!("Failed to verify {} token: {}", kind, e);
            e
        })
    }

    fn has_expired(&self, exp: i64, now: DateTime<Utc>) -> bool {
        let deadline_ms = exp
            .saturating_add(self.leeway_secs.min(i64::MAX as u64) as i64)
            .saturating_mul(1000);
        now.timestamp_millis() > deadline_ms
    }

    fn key(&self, kind: KeyKind) -> &HmacSha256 {
        match kind {
            KeyKind::Access => &self.access_key,
            KeyKind::Global => &self.global_key,
        }
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("default_expiration_hours", &self.default_expiration_hours)
            .field("leeway_secs", &self.leeway_secs)
            .finish_non_exhaustive()
    }
}
