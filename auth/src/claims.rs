//! Token claims.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use error::AuthError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved claim holding the issue instant (seconds since epoch).
pub const ISSUED_AT: &str = "iat";

/// Reserved claim holding the expiration instant (seconds since epoch).
pub const EXPIRATION: &str = "exp";

/// Claims carried in a token payload.
///
/// Values are arbitrary JSON. The reserved `iat` and `exp` entries are
/// written by the issuer and override caller-supplied values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(BTreeMap<String, Value>);

impl Claims {
    /// Create an empty claim set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert any serializable value into claims.
    ///
    /// The value must serialize to a JSON object.
    pub fn from_serializable<C: Serialize + ?Sized>(claims: &C) -> Result<Self, AuthError> {
        match serde_json::to_value(claims) {
            Ok(Value::Object(map)) => Ok(map.into_iter().collect()),
            Ok(other) => Err(AuthError::Serialization(format!(
                "claims must be a JSON object, got {}",
                json_kind(&other)
            ))),
            Err(e) => Err(AuthError::Serialization(e.to_string())),
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a claim, returning the previous value if any.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Get a claim by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Get a claim deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AuthError> {
        self.0
            .get(name)
            .map(|v| {
                serde_json::from_value(v.clone())
                    .map_err(|e| AuthError::Serialization(format!("claim '{}': {}", name, e)))
            })
            .transpose()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Issue instant, if present and numeric.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp(ISSUED_AT).ok().flatten()
    }

    /// Expiration instant, if present and numeric.
    pub fn expiration(&self) -> Option<DateTime<Utc>> {
        self.timestamp(EXPIRATION).ok().flatten()
    }

    /// Raw `exp` seconds. A non-numeric `exp` makes the token malformed.
    pub(crate) fn expiration_secs(&self) -> Result<Option<i64>, AuthError> {
        self.numeric(EXPIRATION)
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }

    fn timestamp(&self, name: &str) -> Result<Option<DateTime<Utc>>, AuthError> {
        Ok(self
            .numeric(name)?
            .and_then(|secs| DateTime::from_timestamp(secs, 0)))
    }

    fn numeric(&self, name: &str) -> Result<Option<i64>, AuthError> {
        match self.0.get(name) {
            None => Ok(None),
            Some(v) => v
                .as_i64()
                .or_else(|| v.as_f64().map(|f| f as i64))
                .map(Some)
                .ok_or_else(|| AuthError::Malformed(format!("'{}' claim is not a number", name))),
        }
    }
}

impl From<BTreeMap<String, Value>> for Claims {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Claims {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Claims {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_serializable_struct() {
        #[derive(Serialize)]
        struct Login {
            user_id: u64,
            role: &'static str,
        }

        let claims = Claims::from_serializable(&Login { user_id: 7, role: "admin" }).unwrap();
        assert_eq!(claims.get("user_id"), Some(&json!(7)));
        assert_eq!(claims.get("role"), Some(&json!("admin")));
    }

    #[test]
    fn test_from_serializable_rejects_non_object() {
        let result = Claims::from_serializable(&vec![1, 2, 3]);
        assert!(matches!(result, Err(AuthError::Serialization(msg)) if msg.contains("an array")));
    }

    #[test]
    fn test_from_serializable_rejects_non_string_keys() {
        let mut map = BTreeMap::new();
        map.insert(vec![1u8], "x");
        assert!(matches!(
            Claims::from_serializable(&map),
            Err(AuthError::Serialization(_))
        ));
    }

    #[test]
    fn test_get_as() {
        let claims = Claims::new().with("scopes", json!(["read", "write"]));
        let scopes: Option<Vec<String>> = claims.get_as("scopes").unwrap();
        assert_eq!(scopes, Some(vec!["read".to_string(), "write".to_string()]));

        let missing: Option<String> = claims.get_as("nope").unwrap();
        assert!(missing.is_none());

        assert!(claims.get_as::<u32>("scopes").is_err());
    }

    #[test]
    fn test_timestamps() {
        let claims = Claims::new().with(ISSUED_AT, 1_700_000_000).with(EXPIRATION, 1_700_003_600);
        assert_eq!(claims.issued_at().unwrap().timestamp(), 1_700_000_000);
        assert_eq!(claims.expiration().unwrap().timestamp(), 1_700_003_600);
        assert_eq!(claims.expiration_secs().unwrap(), Some(1_700_003_600));
    }

    #[test]
    fn test_non_numeric_exp_is_malformed() {
        let claims = Claims::new().with(EXPIRATION, "tomorrow");
        assert!(claims.expiration().is_none());
        assert!(matches!(claims.expiration_secs(), Err(AuthError::Malformed(_))));
    }
}
