//! Signing key selection and construction.

use std::fmt;
use std::str::FromStr;

use error::AuthError;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

/// HMAC-SHA256 key used to sign and verify tokens.
pub type HmacSha256 = Hmac<Sha256>;

/// Minimum secret length in bytes for HS256 (256 bits).
pub const MIN_KEY_LEN: usize = 32;

/// Which of the two secrets signs or verifies a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    /// Per-service key for this service's direct clients
    Access,
    /// Key shared across services for service-to-service calls
    Global,
}

impl KeyKind {
    pub fn as_str(self) -> &'static str {
        match self {
            KeyKind::Access => "access",
            KeyKind::Global => "global",
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyKind {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "access" => Ok(KeyKind::Access),
            "global" => Ok(KeyKind::Global),
            other => Err(AuthError::Configuration(format!(
                "unknown key kind '{}', expected 'access' or 'global'",
                other
            ))),
        }
    }
}

/// Build the HMAC key for a secret.
pub fn hmac_key(secret: &str, kind: KeyKind) -> Result<HmacSha256, AuthError> {
    if secret.len() < MIN_KEY_LEN {
        tracing::error!("The {} key is too short for HS256 ({} bytes)", kind, secret.len());
        return Err(AuthError::WeakKey {
            kind: kind.to_string(),
            len: secret.len(),
        });
    }

    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| {
        tracing::error!("Failed to create HMAC key: {}", e);
        AuthError::Configuration(format!("invalid {} key: {}", kind, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_kind_parse() {
        assert_eq!("access".parse::<KeyKind>().unwrap(), KeyKind::Access);
        assert_eq!("GLOBAL".parse::<KeyKind>().unwrap(), KeyKind::Global);
        assert!("refresh".parse::<KeyKind>().is_err());
        assert_eq!(KeyKind::Global.to_string(), "global");
    }

    #[test]
    fn test_short_key_rejected() {
        let err = hmac_key("short", KeyKind::Access).unwrap_err();
        assert!(matches!(err, AuthError::WeakKey { len: 5, .. }));
        assert!(hmac_key(&"k".repeat(MIN_KEY_LEN), KeyKind::Access).is_ok());
    }
}
