//! Single-call gate for gRPC handlers
//!
//! Reads the `token` metadata entry, runs the shared gate decision and, on
//! success, stores the verified [`Claims`] in the request extensions before
//! the handler body runs.

use jwt_security::{token_from_metadata, AuthGate, AuthServer, Claims};
use tonic::metadata::MetadataMap;
use tonic::{Request, Status};

/// gRPC front of the authorization gate.
///
/// Generic over the hosting service's [`AuthServer`] implementation, so a
/// service that does not expose an access policy and token authority cannot
/// be wired in.
///
/// ## Design
///
/// - **Fail-fast**: any denial returns `Status::unauthenticated` and the
///   handler never sees the request
/// - **Opaque denials**: a caller with the wrong role gets the same status
///   code as one with a bad token
/// - **Cheap to clone**: the policy and authority live behind an `Arc`
///
/// ## Usage
///
/// ```rust,no_run
/// use grpc_auth_gate::{ClaimsExt, GrpcAuthGate};
/// use jwt_security::AccessPolicy;
/// use tonic::{Request, Response, Status};
///
/// struct VehicleService {
///     auth: GrpcAuthGate<AccessPolicy>,
/// }
///
/// impl VehicleService {
///     async fn delete(&self, request: Request<()>) -> Result<Response<()>, Status> {
///         let request = self
///             .auth
///             .authorize_unary("/fleet.v1.VehicleService/Delete", request)?;
///         let claims = request.require_claims()?;
///         tracing::info!(user_id = claims.user_id(), "Deleting vehicle");
///         Ok(Response::new(()))
///     }
/// }
/// ```
pub struct GrpcAuthGate<S> {
    gate: AuthGate<S>,
}

impl<S> Clone for GrpcAuthGate<S> {
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
        }
    }
}

impl<S: AuthServer> GrpcAuthGate<S> {
    pub fn new(server: S) -> Self {
        Self {
            gate: AuthGate::new(server),
        }
    }

    pub fn from_gate(gate: AuthGate<S>) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &AuthGate<S> {
        &self.gate
    }

    /// Gate a single-request call to `full_method` (`/package.Service/Method`).
    ///
    /// Public endpoints pass through untouched. Protected endpoints return the
    /// request with [`Claims`] in its extensions, or `Status::unauthenticated`.
    pub fn authorize_unary<T>(
        &self,
        full_method: &str,
        mut request: Request<T>,
    ) -> Result<Request<T>, Status> {
        if let Some(claims) = self.decide(full_method, request.metadata())? {
            request.extensions_mut().insert(claims);
        }
        Ok(request)
    }

    pub(crate) fn decide(
        &self,
        full_method: &str,
        metadata: &MetadataMap,
    ) -> Result<Option<Claims>, Status> {
        self.gate
            .authorize(full_method, token_from_metadata(metadata))
            .map_err(Status::from)
    }
}
