//! Compact token encoding and decoding.
//!
//! These functions work on a raw token string and a prepared HMAC key. They
//! neither strip an `Authorization` scheme prefix nor check expiration;
//! [`TokenService`](crate::TokenService) layers both on top.

use error::AuthError;
use jwt::{FromBase64, Header, SignWithKey, VerifyingAlgorithm};

use crate::claims::Claims;
use crate::key::HmacSha256;

/// Encode claims into a signed HS256 token.
pub fn encode_token(claims: &Claims, key: &HmacSha256) -> Result<String, AuthError> {
    claims.sign_with_key(key).map_err(|e| {
        tracing::error!("Failed to encode token: {}", e);
        AuthError::Serialization(e.to_string())
    })
}

/// Verify a token's signature and decode its claims.
///
/// The signature is checked over the raw header and payload segments
/// before the payload is decoded, so any change to either segment is a
/// signature failure rather than a decoding failure.
pub fn decode_token(token: &str, key: &HmacSha256) -> Result<Claims, AuthError> {
    let mut segments = token.split('.');
    let (header_str, claims_str, signature_str) =
        match (segments.next(), segments.next(), segments.next(), segments.next()) {
            (Some(h), Some(c), Some(s), None) => (h, c, s),
            _ => {
                tracing::warn!("Token does not have three segments");
                return Err(AuthError::Malformed(
                    "expected three dot-separated segments".to_string(),
                ));
            }
        };

    let header = Header::from_base64(header_str).map_err(|e| {
        tracing::warn!("Failed to decode token header: {}", e);
        AuthError::Malformed(format!("invalid header: {}", e))
    })?;

    let expected = VerifyingAlgorithm::algorithm_type(key);
    if header.algorithm != expected {
        tracing::warn!(
            "Algorithm mismatch: token uses {:?}, key expects {:?}",
            header.algorithm,
            expected
        );
        return Err(AuthError::SignatureInvalid);
    }

    match VerifyingAlgorithm::verify(key, header_str, claims_str, signature_str) {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!("Token signature mismatch");
            return Err(AuthError::SignatureInvalid);
        }
        Err(e) => {
            tracing::warn!("Failed to decode token signature: {}", e);
            return Err(AuthError::SignatureInvalid);
        }
    }

    Claims::from_base64(claims_str).map_err(|e| {
        tracing::warn!("Failed to decode token payload: {}", e);
        AuthError::Malformed(format!("invalid payload: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{hmac_key, KeyKind};
    use serde_json::json;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";
    const OTHER_SECRET: &str = "fedcba9876543210fedcba9876543210";

    fn key(secret: &str) -> HmacSha256 {
        hmac_key(secret, KeyKind::Access).unwrap()
    }

    fn replace_char(token: &str, index: usize) -> String {
        let mut chars: Vec<char> = token.chars().collect();
        chars[index] = if chars[index] == 'A' { 'B' } else { 'A' };
        chars.into_iter().collect()
    }

    #[test]
    fn test_encode_decode_token() {
        let claims = Claims::new().with("user", "u-1").with("admin", true);
        let token = encode_token(&claims, &key(SECRET)).expect("Failed to encode");

        assert!(token.starts_with("eyJhbGciOiJIUzI1NiJ9."));
        let decoded = decode_token(&token, &key(SECRET)).expect("Failed to decode");
        assert_eq!(decoded.get("user"), Some(&json!("u-1")));
        assert_eq!(decoded.get("admin"), Some(&json!(true)));
    }

    #[test]
    fn test_wrong_key() {
        let token = encode_token(&Claims::new().with("a", 1), &key(SECRET)).unwrap();
        assert!(matches!(
            decode_token(&token, &key(OTHER_SECRET)),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_tampered_payload() {
        let token = encode_token(&Claims::new().with("role", "user"), &key(SECRET)).unwrap();
        let payload_start = token.find('.').unwrap() + 1;
        let tampered = replace_char(&token, payload_start + 3);

        assert!(matches!(
            decode_token(&tampered, &key(SECRET)),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_tampered_signature() {
        let token = encode_token(&Claims::new().with("role", "user"), &key(SECRET)).unwrap();
        let signature_start = token.rfind('.').unwrap() + 1;
        let tampered = replace_char(&token, signature_start);

        assert!(matches!(
            decode_token(&tampered, &key(SECRET)),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_unsigned_algorithm_rejected() {
        let token = encode_token(&Claims::new().with("role", "user"), &key(SECRET)).unwrap();
        let rest = &token[token.find('.').unwrap()..];
        let forged = format!("eyJhbGciOiJub25lIn0{}", rest);

        assert!(matches!(
            decode_token(&forged, &key(SECRET)),
            Err(AuthError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_structure_errors_are_malformed() {
        let k = key(SECRET);
        assert!(matches!(decode_token("", &k), Err(AuthError::Malformed(_))));
        assert!(matches!(decode_token("a.b", &k), Err(AuthError::Malformed(_))));
        assert!(matches!(decode_token("a.b.c.d", &k), Err(AuthError::Malformed(_))));

        let token = encode_token(&Claims::new(), &k).unwrap();
        let prefixed = format!("Bearer {}", token);
        assert!(matches!(decode_token(&prefixed, &k), Err(AuthError::Malformed(_))));
    }
}
