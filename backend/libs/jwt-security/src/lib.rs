//! Token Authority and Authorization Gate core
//!
//! **Security Features**:
//! - HMAC-signed identity tokens with issuer, unique id and a fixed lifetime
//! - Algorithm substitution defense (`none` / asymmetric headers rejected)
//! - Explicit time window check (`nbf <= now < exp`); expiry is the only
//!   invalidation mechanism
//! - Role-based gate shared by every transport adapter
//! - Secret strength grading and OS-random secret generation
//!
//! ## Usage
//!
//! ```rust
//! use jwt_security::{AccessPolicy, AuthGate, TokenAuthority, UserIdentity, UserRole};
//! use std::time::Duration;
//!
//! # fn main() -> Result<(), jwt_security::AuthError> {
//! let secret = jwt_security::generate_secret(32)?;
//! let authority = TokenAuthority::new(&secret, "fleet", Duration::from_secs(3600));
//!
//! let token = authority.issue(&UserIdentity {
//!     user_id: 7,
//!     username: "ops".into(),
//!     role: UserRole::Admin,
//!     ..Default::default()
//! })?;
//!
//! let gate = AuthGate::new(
//!     AccessPolicy::new(authority).allow("/fleet.v1.VehicleService/Delete", [UserRole::Admin]),
//! );
//! let claims = gate.authorize("/fleet.v1.VehicleService/Delete", Some(&token))?;
//! assert_eq!(claims.map(|c| c.user_id()), Some(7));
//! # Ok(())
//! # }
//! ```

mod authority;
mod claims;
pub mod config;
mod error;
pub mod gate;
pub mod secret_validation;

pub use authority::{token_from_metadata, TokenAuthority, TOKEN_KEY};
pub use claims::{Claims, UserIdentity, UserRole};
pub use config::AuthConfig;
pub use error::{AuthError, UNAUTHENTICATED_MESSAGE};
pub use gate::{AccessPolicy, AuthGate, AuthServer};
pub use secret_validation::{generate_secret, validate_secret_strength, SecretStrength};

// Re-export for configuring alternative HMAC algorithms
pub use jsonwebtoken::Algorithm;
