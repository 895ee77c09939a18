//! Streaming-call gate
//!
//! A client stream delivers many messages over one call, so the verified
//! identity is bound to the stream itself: [`AuthenticatedStream`] is built
//! before the handler polls the first message and carries the claims for the
//! whole lifetime of the stream.

use crate::server::GrpcAuthGate;
use futures::Stream;
use jwt_security::{AuthServer, Claims};
use pin_project::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use tonic::{Request, Status};

/// Inbound stream wrapped with the identity that opened it
#[pin_project]
#[derive(Debug)]
pub struct AuthenticatedStream<St> {
    #[pin]
    inner: St,
    claims: Option<Claims>,
}

impl<St> AuthenticatedStream<St> {
    /// Verified identity, or `None` for public methods
    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    pub fn get_ref(&self) -> &St {
        &self.inner
    }

    pub fn into_inner(self) -> St {
        self.inner
    }
}

impl<St: Stream> Stream for AuthenticatedStream<St> {
    type Item = St::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<S: AuthServer> GrpcAuthGate<S> {
    /// Gate a client- or bidirectional-streaming call to `full_method`.
    ///
    /// The decision runs once, before any message is read. On success the
    /// stream is wrapped so every later read sees the same claims; they are
    /// also placed in the request extensions. On denial the inbound stream is
    /// dropped unread.
    pub fn authorize_streaming<St>(
        &self,
        full_method: &str,
        request: Request<St>,
    ) -> Result<Request<AuthenticatedStream<St>>, Status> {
        let claims = self.decide(full_method, request.metadata())?;

        let (metadata, mut extensions, inner) = request.into_parts();
        if let Some(claims) = &claims {
            extensions.insert(claims.clone());
        }

        Ok(Request::from_parts(
            metadata,
            extensions,
            AuthenticatedStream { inner, claims },
        ))
    }
}
