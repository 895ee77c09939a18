use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::StatusCode,
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use jwt_security::{AuthError, AuthGate, AuthServer, Claims, TOKEN_KEY, UNAUTHENTICATED_MESSAGE};
use std::ops::Deref;

/// Verified identity extracted from the request
///
/// Available in handlers behind [`TokenAuthMiddleware`] on protected paths.
/// Use `Option<Authenticated>` on paths that may be public.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Claims);

impl Deref for Authenticated {
    type Target = Claims;

    fn deref(&self) -> &Claims {
        &self.0
    }
}

/// Token Authorization Middleware
///
/// Reads the `token` header, gates the request path against the host's
/// access policy and stores the verified [`Claims`] in the request
/// extensions. A denied request is answered here with `401` and the
/// downstream service is never called.
pub struct TokenAuthMiddleware<A> {
    gate: AuthGate<A>,
}

impl<A: AuthServer> TokenAuthMiddleware<A> {
    pub fn new(server: A) -> Self {
        Self {
            gate: AuthGate::new(server),
        }
    }

    pub fn from_gate(gate: AuthGate<A>) -> Self {
        Self { gate }
    }
}

impl<A> Clone for TokenAuthMiddleware<A> {
    fn clone(&self) -> Self {
        Self {
            gate: self.gate.clone(),
        }
    }
}

impl<S, B, A> Transform<S, ServiceRequest> for TokenAuthMiddleware<A>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    A: AuthServer + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = TokenAuthMiddlewareService<S, A>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TokenAuthMiddlewareService {
            service,
            gate: self.gate.clone(),
        }))
    }
}

pub struct TokenAuthMiddlewareService<S, A> {
    service: S,
    gate: AuthGate<A>,
}

impl<S, B, A> Service<ServiceRequest> for TokenAuthMiddlewareService<S, A>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    A: AuthServer + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let token = req
            .headers()
            .get(TOKEN_KEY)
            .and_then(|h| h.to_str().ok());

        // Same requoted path the router matches on, so an encoded form of a
        // protected path cannot reach its handler as a public one
        match self.gate.authorize(req.match_info().as_str(), token) {
            Ok(claims) => {
                if let Some(claims) = claims {
                    req.extensions_mut().insert(claims);
                }
                let fut = self.service.call(req);
                Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
            }
            Err(err) => {
                let response = req.into_response(deny_response(&err)).map_into_right_body();
                Box::pin(ready(Ok(response)))
            }
        }
    }
}

fn deny_response(err: &AuthError) -> HttpResponse {
    let status = if err.is_denial() {
        StatusCode::UNAUTHORIZED
    } else {
        tracing::error!(error = %err, "Token check failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };

    HttpResponse::build(status)
        .content_type("text/plain; charset=utf-8")
        .body(err.public_message())
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Claims>() {
            Some(claims) => ready(Ok(Authenticated(claims.clone()))),
            None => ready(Err(actix_web::error::ErrorUnauthorized(
                UNAUTHENTICATED_MESSAGE,
            ))),
        }
    }
}
