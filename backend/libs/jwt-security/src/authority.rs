//! Token Authority: mints and verifies HMAC-signed identity tokens
//!
//! ## Security Design
//!
//! - **HMAC family only**: the header algorithm is inspected before any
//!   signature work; `none` and asymmetric algorithms are rejected outright
//! - **Explicit clock**: `issue_at` / `verify_at` take the current time so
//!   expiry is deterministic; `issue` / `verify` use the system clock
//! - **Immutable**: key material is fixed at construction, every operation
//!   takes `&self`, so one instance is shared by all concurrent calls

use crate::claims::{Claims, UnverifiedClaims, UserIdentity};
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::secret_validation::{validate_secret_strength, SecretStrength};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use tonic::metadata::MetadataMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// Metadata key (gRPC) and header name (HTTP) that carry the token
pub const TOKEN_KEY: &str = "token";

const HMAC_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Only the `alg` field matters before the signature has been checked
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

fn is_hmac(algorithm: Algorithm) -> bool {
    HMAC_ALGORITHMS.contains(&algorithm)
}

/// Token carried under the `token` metadata key.
///
/// Values that are not visible ASCII count as no token at all.
pub fn token_from_metadata(metadata: &MetadataMap) -> Option<&str> {
    metadata.get(TOKEN_KEY).and_then(|value| value.to_str().ok())
}

#[derive(Clone)]
pub struct TokenAuthority {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    validity: Duration,
    algorithm: Algorithm,
}

impl TokenAuthority {
    /// Create an HS256 authority.
    ///
    /// Weak secrets are accepted but logged; use
    /// [`generate_secret`](crate::generate_secret) to provision a strong one.
    pub fn new(secret: impl AsRef<[u8]>, issuer: impl Into<String>, validity: Duration) -> Self {
        let secret = secret.as_ref();
        let issuer = issuer.into();

        if validate_secret_strength(secret) == SecretStrength::Weak {
            warn!(issuer = %issuer, "Token authority configured with a weak signing secret");
        }

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer,
            validity,
            algorithm: Algorithm::HS256,
        }
    }

    /// Switch to another HMAC algorithm
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Result<Self, AuthError> {
        if !is_hmac(algorithm) {
            return Err(AuthError::Config(format!(
                "unsupported signing algorithm {algorithm:?}, expected an HMAC algorithm"
            )));
        }
        self.algorithm = algorithm;
        Ok(self)
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        Self::new(
            config.secret_key.as_bytes(),
            config.issuer.clone(),
            config.token_validity(),
        )
        .with_algorithm(config.algorithm)
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn validity(&self) -> Duration {
        self.validity
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Issue a token for `identity`, valid from now for the configured lifetime
    pub fn issue(&self, identity: &UserIdentity) -> Result<String, AuthError> {
        self.issue_at(identity, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, identity: &UserIdentity, now: DateTime<Utc>) -> Result<String, AuthError> {
        let issued_at = now.timestamp();
        let lifetime = i64::try_from(self.validity.as_secs()).unwrap_or(i64::MAX);

        let claims = Claims {
            iss: self.issuer.clone(),
            sub: identity.display_name(),
            jti: Uuid::new_v4().to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp: issued_at.saturating_add(lifetime),
            user_id: identity.user_id,
            username: identity.username.clone(),
            user_agent: identity.user_agent.clone().unwrap_or_default(),
            ip: identity.ip.clone().unwrap_or_default(),
            email: identity.email.clone(),
            role: identity.role,
        };

        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(AuthError::Signing)?;

        debug!(
            user_id = claims.user_id,
            role = %claims.role,
            jti = %claims.jti,
            "Issued token"
        );

        Ok(token)
    }

    /// Verify `token` against the system clock
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify `token` as if the current time were `now`.
    ///
    /// Valid when the header names an HMAC algorithm, the signature matches
    /// the secret, and `nbf <= now < exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let alg = Self::header_algorithm(token)?;
        match alg.parse::<Algorithm>() {
            Ok(algorithm) if is_hmac(algorithm) => {}
            _ => {
                return Err(AuthError::Signature(format!(
                    "unexpected token signing method {alg}"
                )))
            }
        }

        let mut validation = Validation::new(self.algorithm);
        validation.algorithms = HMAC_ALGORITHMS.to_vec();
        validation.required_spec_claims = HashSet::new();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        let claims: Claims = decode::<UnverifiedClaims>(token, &self.decoding_key, &validation)
            .map_err(Self::map_decode_error)?
            .claims
            .into();

        let now = now.timestamp();
        if now < claims.nbf || now >= claims.exp {
            return Err(AuthError::ExpiredToken);
        }

        debug!(
            user_id = claims.user_id,
            role = %claims.role,
            jti = %claims.jti,
            "Token verified"
        );

        Ok(claims)
    }

    /// Read the token from the `token` metadata entry and verify it
    pub fn extract_from_metadata(&self, metadata: &MetadataMap) -> Result<Claims, AuthError> {
        let token = token_from_metadata(metadata)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        self.verify(token)
    }

    /// Decode the header segment without trusting it
    fn header_algorithm(token: &str) -> Result<String, AuthError> {
        let mut segments = token.split('.');
        let (Some(header), Some(_), Some(_), None) =
            (segments.next(), segments.next(), segments.next(), segments.next())
        else {
            return Err(AuthError::MalformedToken(
                "expected three dot-separated segments".into(),
            ));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(header)
            .map_err(|e| AuthError::MalformedToken(format!("header is not base64url: {e}")))?;
        let header: RawHeader = serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::MalformedToken(format!("header is not valid JSON: {e}")))?;

        Ok(header.alg)
    }

    fn map_decode_error(err: jsonwebtoken::errors::Error) -> AuthError {
        match err.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat => AuthError::Signature(err.to_string()),
            ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => AuthError::ExpiredToken,
            _ => AuthError::MalformedToken(err.to_string()),
        }
    }
}

impl fmt::Debug for TokenAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthority")
            .field("issuer", &self.issuer)
            .field("validity", &self.validity)
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}
