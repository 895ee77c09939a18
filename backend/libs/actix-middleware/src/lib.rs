//! # Actix Middleware Library
//!
//! HTTP front of the token authorization gate for Actix services
//!
//! ## Modules
//! - `token_auth`: token authorization middleware and the `Authenticated` extractor

pub mod token_auth;

pub use token_auth::{Authenticated, TokenAuthMiddleware, TokenAuthMiddlewareService};
