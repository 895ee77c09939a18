//! Tower layer gating every method of a tonic server
//!
//! Runs below tonic's routing, so it sees the raw HTTP/2 request: the full
//! method name is the URI path and the `token` metadata entry is an ordinary
//! header. Works the same for unary and streaming methods because the
//! decision happens before the body (and therefore any message) is read.

use futures::future::{ready, Either, Ready};
use http::header::{HeaderValue, CONTENT_TYPE};
use jwt_security::{AuthError, AuthGate, AuthServer, TOKEN_KEY};
use std::task::{Context, Poll};
use tonic::{Code, Status};
use tower::{Layer, Service};

/// Layer for `tonic::transport::Server::builder().layer(..)`
///
/// ```rust,no_run
/// use grpc_auth_gate::GrpcAuthLayer;
/// use jwt_security::{AccessPolicy, AuthConfig, TokenAuthority, UserRole};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let authority = TokenAuthority::from_config(&AuthConfig::from_env()?)?;
/// let policy = AccessPolicy::new(authority)
///     .allow("/fleet.v1.VehicleService/Delete", [UserRole::Admin]);
///
/// let _builder = tonic::transport::Server::builder().layer(GrpcAuthLayer::new(policy));
/// // .add_service(VehicleServiceServer::new(service)).serve(addr)
/// # Ok(())
/// # }
/// ```
pub struct GrpcAuthLayer<S> {
    gate: AuthGate<S>,
}

impl<S: AuthServer> GrpcAuthLayer<S> {
    pub fn new(server: S) -> Self {
        Self {
            gate: AuthGate::new(server),
        }
    }

    pub fn from_gate(gate: AuthGate<S>) -> Self {
        Self { gate }
    }
}

impl<S> Clone for GrpcAuthLayer<S> {
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
        }
    }
}

impl<S, Inner> Layer<Inner> for GrpcAuthLayer<S> {
    type Service = GrpcAuthService<S, Inner>;

    fn layer(&self, inner: Inner) -> Self::Service {
        GrpcAuthService {
            inner,
            gate: self.gate.clone(),
        }
    }
}

pub struct GrpcAuthService<S, Inner> {
    inner: Inner,
    gate: AuthGate<S>,
}

impl<S, Inner: Clone> Clone for GrpcAuthService<S, Inner> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            gate: self.gate.clone(),
        }
    }
}

impl<S, Inner, ReqBody, ResBody> Service<http::Request<ReqBody>> for GrpcAuthService<S, Inner>
where
    S: AuthServer,
    Inner: Service<http::Request<ReqBody>, Response = http::Response<ResBody>>,
    ResBody: Default,
{
    type Response = http::Response<ResBody>;
    type Error = Inner::Error;
    type Future = Either<Ready<Result<Self::Response, Self::Error>>, Inner::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<ReqBody>) -> Self::Future {
        let token = req
            .headers()
            .get(TOKEN_KEY)
            .and_then(|value| value.to_str().ok());

        match self.gate.authorize(req.uri().path(), token) {
            Ok(claims) => {
                if let Some(claims) = claims {
                    req.extensions_mut().insert(claims);
                }
                Either::Right(self.inner.call(req))
            }
            Err(err) => Either::Left(ready(Ok(unauthenticated_response(err)))),
        }
    }
}

/// Trailers-only gRPC response carrying `UNAUTHENTICATED`
fn unauthenticated_response<B: Default>(err: AuthError) -> http::Response<B> {
    let status = Status::from(err);
    let mut response = http::Response::new(B::default());
    let headers = response.headers_mut();

    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/grpc"));
    if let Err(e) = status.add_header(headers) {
        tracing::warn!(error = %e, "Failed to encode gRPC status headers");
        headers.insert("grpc-status", HeaderValue::from(Code::Unauthenticated as i32));
    }

    response
}
