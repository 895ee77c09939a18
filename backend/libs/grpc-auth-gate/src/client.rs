//! Client-side token interceptor
//!
//! Injects the caller's token into the `token` metadata entry of every
//! outgoing gRPC request.

use jwt_security::TOKEN_KEY;
use tonic::metadata::{AsciiMetadataValue, MetadataMap};
use tonic::service::Interceptor;
use tonic::{Request, Status};

/// Client-side interceptor that attaches a token to outgoing requests
///
/// ## Usage
///
/// ```rust,no_run
/// use grpc_auth_gate::TokenClientInterceptor;
/// use tonic::transport::Channel;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let interceptor = TokenClientInterceptor::new("eyJhbGc...")?;
///
/// let channel = Channel::from_static("http://[::1]:50051")
///     .connect()
///     .await?;
///
/// // let mut client = VehicleServiceClient::with_interceptor(channel, interceptor);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct TokenClientInterceptor {
    /// Parsed once at construction time
    token: AsciiMetadataValue,
}

impl TokenClientInterceptor {
    /// Create an interceptor for `token`.
    ///
    /// ## Errors
    ///
    /// `Status::invalid_argument` if the token is not valid metadata ASCII.
    /// Tokens from [`TokenAuthority::issue`](jwt_security::TokenAuthority::issue)
    /// (base64url segments) always pass.
    pub fn new(token: impl Into<String>) -> Result<Self, Status> {
        let token = AsciiMetadataValue::try_from(token.into())
            .map_err(|_| Status::invalid_argument("token contains invalid metadata characters"))?;
        Ok(Self { token })
    }

    /// Reuse a token already parsed from metadata
    pub fn from_value(token: AsciiMetadataValue) -> Self {
        Self { token }
    }

    /// Pick up the token of an incoming request, for forwarding it to
    /// downstream services
    pub fn forward_from(metadata: &MetadataMap) -> Result<Self, Status> {
        metadata
            .get(TOKEN_KEY)
            .filter(|value| !value.is_empty())
            .cloned()
            .map(Self::from_value)
            .ok_or_else(|| Status::unauthenticated("token not found"))
    }
}

impl Interceptor for TokenClientInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        request.metadata_mut().insert(TOKEN_KEY, self.token.clone());
        Ok(request)
    }
}
