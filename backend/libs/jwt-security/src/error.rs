//! Error taxonomy for token issuance, verification and gate decisions

use thiserror::Error;
use tonic::Status;

/// Message returned to callers whose role is not allowed on an endpoint.
///
/// Identical for every role mismatch; the policy table is never revealed.
pub const UNAUTHENTICATED_MESSAGE: &str = "unauthenticated request";

#[derive(Debug, Error)]
pub enum AuthError {
    /// No token under the `token` metadata key / header, or an empty one
    #[error("token not found")]
    MissingToken,

    /// Token could not be parsed into header, claims and signature
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// Signature did not verify, or the token was signed with an unexpected algorithm
    #[error("invalid token signature: {0}")]
    Signature(String),

    /// Outside the `nbf..exp` window
    #[error("token is expired or not yet valid")]
    ExpiredToken,

    /// Verified, but the role is not allowed on this endpoint
    #[error("{}", UNAUTHENTICATED_MESSAGE)]
    RoleMismatch,

    /// Token issuance failed (key or payload rejected by the signer)
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// The operating system randomness source is unavailable
    #[error("random source unavailable: {0}")]
    RandomSource(String),

    /// Invalid or missing configuration
    #[error("invalid auth configuration: {0}")]
    Config(String),
}

impl AuthError {
    /// Whether this error is a per-call authentication/authorization denial
    /// (as opposed to an operational failure of issuance or provisioning).
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            AuthError::MissingToken
                | AuthError::MalformedToken(_)
                | AuthError::Signature(_)
                | AuthError::ExpiredToken
                | AuthError::RoleMismatch
        )
    }

    /// Text that may be shown to the remote caller.
    ///
    /// Token-level failures describe the caller's own credential. Role
    /// mismatches collapse to [`UNAUTHENTICATED_MESSAGE`]. Operational errors
    /// never leak their cause.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::MissingToken
            | AuthError::MalformedToken(_)
            | AuthError::Signature(_)
            | AuthError::ExpiredToken => self.to_string(),
            AuthError::RoleMismatch => UNAUTHENTICATED_MESSAGE.to_string(),
            AuthError::Signing(_) | AuthError::RandomSource(_) | AuthError::Config(_) => {
                "internal authentication error".to_string()
            }
        }
    }
}

impl From<AuthError> for Status {
    fn from(err: AuthError) -> Self {
        if err.is_denial() {
            Status::unauthenticated(err.public_message())
        } else {
            Status::internal(err.public_message())
        }
    }
}
