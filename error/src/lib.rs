//! Common error types for token issuing and validation.
//!
//! This crate provides unified error handling across the token crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Token-related errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong key, tampered token, or an algorithm other than HS256.
    #[error("Token signature is invalid")]
    SignatureInvalid,

    /// Correctly signed, but past its expiration instant.
    #[error("Token expired at {expired_at}")]
    TokenExpired {
        /// Embedded `exp` claim (seconds since epoch)
        expired_at: i64,
    },

    /// Segment count, header, or payload could not be decoded.
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Claims could not be encoded or decoded.
    #[error("Claims serialization failed: {0}")]
    Serialization(String),

    /// Secret too short for HMAC-SHA256.
    #[error("The {kind} key is {len} bytes; HS256 requires at least 32")]
    WeakKey { kind: String, len: usize },

    #[error("Missing claim: {0}")]
    MissingClaim(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AuthError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::SignatureInvalid => "AUTH_SIGNATURE_INVALID",
            AuthError::TokenExpired { .. } => "AUTH_TOKEN_EXPIRED",
            AuthError::Malformed(_) => "AUTH_MALFORMED_TOKEN",
            AuthError::Serialization(_) => "AUTH_SERIALIZATION_FAILED",
            AuthError::WeakKey { .. } => "AUTH_WEAK_KEY",
            AuthError::MissingClaim(_) => "AUTH_MISSING_CLAIM",
            AuthError::Configuration(_) => "AUTH_CONFIGURATION",
        }
    }
}

/// Error response for CLI and API clients.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Add details to the error response.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<AuthError> for ErrorResponse {
    fn from(err: AuthError) -> Self {
        let message = match &err {
            AuthError::SignatureInvalid => "Token signature is invalid",
            AuthError::TokenExpired { .. } => "Token has expired",
            AuthError::Malformed(_) => "Token is malformed",
            AuthError::Serialization(_) => "Failed to serialize claims",
            AuthError::WeakKey { .. } => "Signing key is too short",
            AuthError::MissingClaim(_) => "Token is missing a required claim",
            AuthError::Configuration(_) => "Invalid configuration",
        };
        let response = Self::new(err.code(), message);
        match err {
            AuthError::SignatureInvalid => response,
            other => response.with_details(other.to_string()),
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Auth(e) => e.into(),
            AppError::Validation(msg) => Self::new("VALIDATION", "Invalid input").with_details(msg),
            AppError::Internal(msg) => Self::new("INTERNAL", "Internal error").with_details(msg),
        }
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_response_carries_details() {
        let response = ErrorResponse::from(AuthError::TokenExpired { expired_at: 1_700_000_000 });
        assert_eq!(response.code, "AUTH_TOKEN_EXPIRED");
        assert_eq!(response.details.as_deref(), Some("Token expired at 1700000000"));
    }

    #[test]
    fn test_signature_response_has_no_details() {
        let response = ErrorResponse::from(AuthError::SignatureInvalid);
        assert_eq!(response.code, "AUTH_SIGNATURE_INVALID");
        assert!(response.details.is_none());
    }

    #[test]
    fn test_app_error_wraps_auth_code() {
        let err: AppError = AuthError::MissingClaim("exp".into()).into();
        let response = ErrorResponse::from(err);
        assert_eq!(response.code, "AUTH_MISSING_CLAIM");
    }
}
