//! Token authority configuration
//!
//! **Environment Variables**:
//! - `AUTH_SECRET_KEY`: HMAC signing secret (REQUIRED)
//! - `AUTH_ISSUER`: issuer written into every token (default: `auth-gate`)
//! - `AUTH_TOKEN_VALID_SECS`: token lifetime in seconds (default: 86400)
//! - `AUTH_ALGORITHM`: `HS256`, `HS384` or `HS512` (default: `HS256`)

use crate::error::AuthError;
use jsonwebtoken::Algorithm;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

const ENV_PREFIX: &str = "AUTH_";

fn default_issuer() -> String {
    "auth-gate".to_string()
}

fn default_token_valid_secs() -> u64 {
    24 * 60 * 60
}

fn default_algorithm() -> Algorithm {
    Algorithm::HS256
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    pub secret_key: String,
    #[serde(default = "default_issuer")]
    pub issuer: String,
    #[serde(default = "default_token_valid_secs")]
    pub token_valid_secs: u64,
    #[serde(default = "default_algorithm")]
    pub algorithm: Algorithm,
}

impl AuthConfig {
    /// Load from `AUTH_*` environment variables, reading `.env` first if present
    pub fn from_env() -> Result<Self, AuthError> {
        dotenvy::dotenv().ok();

        let config = envy::prefixed(ENV_PREFIX)
            .from_env::<AuthConfig>()
            .map_err(|e| AuthError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from explicit `(KEY, value)` pairs using the same `AUTH_` names
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, AuthError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let config = envy::prefixed(ENV_PREFIX)
            .from_iter::<_, AuthConfig>(pairs.into_iter().map(|(k, v)| (k.into(), v.into())))
            .map_err(|e| AuthError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn token_validity(&self) -> Duration {
        Duration::from_secs(self.token_valid_secs)
    }

    fn validate(&self) -> Result<(), AuthError> {
        if self.secret_key.is_empty() {
            return Err(AuthError::Config("AUTH_SECRET_KEY must not be empty".into()));
        }
        if self.token_valid_secs == 0 {
            return Err(AuthError::Config(
                "AUTH_TOKEN_VALID_SECS must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("token_valid_secs", &self.token_valid_secs)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}
