//! Token service configuration.

use std::fmt;

use error::AuthError;
use serde::{Deserialize, Serialize};

/// Environment variable holding the shared inter-service secret.
pub const GLOBAL_KEY_VAR: &str = "TOKEN_GLOBAL_KEY";
/// Environment variable holding this service's own secret.
pub const ACCESS_KEY_VAR: &str = "TOKEN_ACCESS_KEY";
pub const DEFAULT_EXPIRATION_HOURS_VAR: &str = "TOKEN_DEFAULT_EXPIRATION_HOURS";
pub const LEEWAY_SECS_VAR: &str = "TOKEN_LEEWAY_SECS";

const DEFAULT_EXPIRATION_HOURS: i64 = 24;

/// Token service configuration.
///
/// Passed once to [`TokenService::new`](crate::TokenService::new) and never
/// mutated afterwards.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Secret shared across services
    pub global_key: String,
    /// Secret for this service's direct clients
    pub access_key: String,
    /// Expiration used by `issue_with_default_expiry`, in hours
    #[serde(default = "default_expiration_hours")]
    pub default_expiration_hours: i64,
    /// Clock skew tolerated when checking expiration, in seconds
    #[serde(default)]
    pub leeway_secs: u64,
}

fn default_expiration_hours() -> i64 {
    DEFAULT_EXPIRATION_HOURS
}

impl TokenConfig {
    /// Create a new configuration with default expiry settings.
    pub fn new(global_key: impl Into<String>, access_key: impl Into<String>) -> Self {
        Self {
            global_key: global_key.into(),
            access_key: access_key.into(),
            default_expiration_hours: DEFAULT_EXPIRATION_HOURS,
            leeway_secs: 0,
        }
    }

    /// Set the default expiration window.
    pub fn with_default_expiration_hours(mut self, hours: i64) -> Self {
        self.default_expiration_hours = hours;
        self
    }

    /// Set the tolerated clock skew.
    pub fn with_leeway_secs(mut self, secs: u64) -> Self {
        self.leeway_secs = secs;
        self
    }

    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, AuthError> {
        let required = |name: &str| {
            var(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AuthError::Configuration(format!("{} is not set", name)))
        };

        let mut config = Self::new(required(GLOBAL_KEY_VAR)?, required(ACCESS_KEY_VAR)?);

        if let Some(hours) = var(DEFAULT_EXPIRATION_HOURS_VAR) {
            if let Ok(n) = hours.parse() {
                config.default_expiration_hours = n;
            }
        }

        if let Some(leeway) = var(LEEWAY_SECS_VAR) {
            if let Ok(n) = leeway.parse() {
                config.leeway_secs = n;
            }
        }

        Ok(config)
    }
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("global_key", &"<redacted>")
            .field("access_key", &"<redacted>")
            .field("default_expiration_hours", &self.default_expiration_hours)
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}
