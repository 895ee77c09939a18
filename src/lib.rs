//! Token authority and authorization gate
//!
//! Umbrella over the workspace libraries:
//!
//! - [`jwt_security`]: token issuance and verification, the access policy and
//!   the gate decision shared by every adapter
//! - [`grpc_auth_gate`]: tonic adapters for single-request and streaming calls,
//!   a tower layer for whole servers, and client-side token injection
//! - [`actix_middleware`]: actix-web middleware and the `Authenticated` extractor
//!
//! ```rust
//! use auth_gate::{AccessPolicy, AuthGate, TokenAuthority, UserIdentity, UserRole};
//! use std::time::Duration;
//!
//! let authority = TokenAuthority::new(
//!     "J8Kq2mPvRx4TnZs9YwLcGf7DhBe3Xa6W",
//!     "fleet-api",
//!     Duration::from_secs(3600),
//! );
//! let token = authority
//!     .issue(&UserIdentity {
//!         user_id: 1,
//!         role: UserRole::Admin,
//!         ..Default::default()
//!     })
//!     .unwrap();
//!
//! let gate = AuthGate::new(AccessPolicy::new(authority).allow("/admin", [UserRole::Admin]));
//! let claims = gate.authorize("/admin", Some(&token)).unwrap();
//! assert_eq!(claims.map(|c| c.user_id()), Some(1));
//! ```

pub use actix_middleware;
pub use grpc_auth_gate;
pub use jwt_security;

pub use actix_middleware::{Authenticated, TokenAuthMiddleware};
pub use grpc_auth_gate::{
    AuthenticatedStream, ClaimsExt, GrpcAuthGate, GrpcAuthLayer, TokenClientInterceptor,
};
pub use jwt_security::{
    AccessPolicy, AuthConfig, AuthError, AuthGate, AuthServer, Claims, TokenAuthority,
    UserIdentity, UserRole, TOKEN_KEY,
};
