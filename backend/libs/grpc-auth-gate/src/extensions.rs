//! Handler-side access to the verified identity
//!
//! Claims are stored by type in the request extensions, either by
//! [`GrpcAuthGate`](crate::GrpcAuthGate) or by [`GrpcAuthLayer`](crate::GrpcAuthLayer)
//! (tonic copies HTTP extensions into the handler's `Request`).

use jwt_security::Claims;
use tonic::{Request, Status};

/// Extension trait for reading [`Claims`] from gRPC requests
///
/// ```rust,no_run
/// use grpc_auth_gate::ClaimsExt;
/// use tonic::{Request, Response, Status};
///
/// async fn get_vehicle(request: Request<()>) -> Result<Response<()>, Status> {
///     let claims = request.require_claims()?;
///     tracing::debug!(user_id = claims.user_id(), "Fetching vehicle");
///     Ok(Response::new(()))
/// }
/// ```
pub trait ClaimsExt {
    /// Claims attached by the gate, `None` on public methods
    fn claims(&self) -> Option<&Claims>;

    /// Claims attached by the gate.
    ///
    /// ## Errors
    ///
    /// `Status::unauthenticated` when nothing was attached, i.e. the method is
    /// public in the access policy or the gate was not installed.
    fn require_claims(&self) -> Result<&Claims, Status>;
}

impl<T> ClaimsExt for Request<T> {
    fn claims(&self) -> Option<&Claims> {
        self.extensions().get::<Claims>()
    }

    fn require_claims(&self) -> Result<&Claims, Status> {
        self.claims()
            .ok_or_else(|| Status::unauthenticated("No verified claims on this request"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jwt_security::{TokenAuthority, UserIdentity, UserRole};
    use std::time::Duration;

    fn verified_claims() -> Claims {
        let authority = TokenAuthority::new(
            "J8Kq2mPvRx4TnZs9YwLcGf7DhBe3Xa6W",
            "grpc-test",
            Duration::from_secs(60),
        );
        let token = authority
            .issue(&UserIdentity {
                user_id: 3,
                email: "ops@example.com".into(),
                role: UserRole::Viewer,
                ..Default::default()
            })
            .unwrap();
        authority.verify(&token).unwrap()
    }

    #[test]
    fn test_claims_missing() {
        let request = Request::new(());

        assert!(request.claims().is_none());
        let status = request.require_claims().unwrap_err();
        assert_eq!(status.code(), tonic::Code::Unauthenticated);
    }

    #[test]
    fn test_claims_present() {
        let mut request = Request::new(());
        request.extensions_mut().insert(verified_claims());

        let claims = request.require_claims().unwrap();
        assert_eq!(claims.user_id(), 3);
        assert_eq!(claims.email(), "ops@example.com");
    }
}
