//! Token generation and introspection.
//!
//! - Opaque, time-bound tokens for authorization codes and access tokens
//! - Access token introspection (RFC 7662)

pub mod generator;
pub mod introspection;

pub use generator::{
    DEFAULT_TOKEN_BYTES, MAX_TOKEN_LIFETIME, MIN_TOKEN_BYTES, Token, TokenGenerator,
};
pub use introspection::{IntrospectionRequest, IntrospectionResponse};
