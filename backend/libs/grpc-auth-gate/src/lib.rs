//! Token authorization for gRPC services
//!
//! Carries a signed token from caller to handler in the `token` metadata
//! entry and gates each method against the hosting service's access policy.
//!
//! ## Core Components
//!
//! - **TokenClientInterceptor**: attaches the caller's token to outgoing requests
//! - **GrpcAuthGate**: explicit per-handler gate for single-request and streaming calls
//! - **AuthenticatedStream**: inbound stream carrying the identity that opened it
//! - **GrpcAuthLayer**: tower layer that gates every method of a tonic server
//! - **ClaimsExt**: handler-side access to the verified [`Claims`]
//!
//! ## Design
//!
//! - **One decision**: all adapters delegate to [`AuthGate::authorize`], so a
//!   token accepted by one is accepted by all
//! - **Fail-fast**: denials return `Status::unauthenticated` before the handler runs
//! - **Opaque denials**: a wrong role looks like any other authentication failure
//!
//! ## Usage Example
//!
//! ### Client Side
//!
//! ```rust,no_run
//! use grpc_auth_gate::TokenClientInterceptor;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let interceptor = TokenClientInterceptor::new("eyJhbGc...")?;
//!
//! let channel = tonic::transport::Channel::from_static("http://[::1]:50051")
//!     .connect()
//!     .await?;
//!
//! // let mut client = VehicleServiceClient::with_interceptor(channel, interceptor);
//! # Ok(())
//! # }
//! ```
//!
//! ### Server Side
//!
//! ```rust,no_run
//! use grpc_auth_gate::GrpcAuthLayer;
//! use jwt_security::{AccessPolicy, AuthConfig, TokenAuthority, UserRole};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let authority = TokenAuthority::from_config(&AuthConfig::from_env()?)?;
//! let policy = AccessPolicy::new(authority)
//!     .allow("/fleet.v1.VehicleService/Delete", [UserRole::Admin])
//!     .allow(
//!         "/fleet.v1.VehicleService/Update",
//!         [UserRole::Admin, UserRole::Operator],
//!     );
//!
//! let _builder = tonic::transport::Server::builder().layer(GrpcAuthLayer::new(policy));
//! # Ok(())
//! # }
//! ```

mod client;
mod extensions;
mod layer;
mod server;
mod stream;

pub use client::TokenClientInterceptor;
pub use extensions::ClaimsExt;
pub use layer::{GrpcAuthLayer, GrpcAuthService};
pub use server::GrpcAuthGate;
pub use stream::AuthenticatedStream;

pub use jwt_security::{AccessPolicy, AuthGate, AuthServer, Claims, UserRole, TOKEN_KEY};

// Re-export tonic Status for convenience
pub use tonic::Status;
