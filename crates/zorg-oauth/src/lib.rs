//! # zorg-oauth
//!
//! OAuth 2.0 authorization-code flow for a healthcare-provider authorization
//! server.
//!
//! This crate provides:
//! - Session lifecycle from authorization request to access token
//! - Validation against a dynamically supplied capability descriptor (OCL)
//! - Single-use, time-bound authorization codes and access tokens
//! - A pluggable resource availability check
//! - Storage traits with optimistic concurrency
//!
//! ## Modules
//!
//! - [`config`] - Token lifetimes, logging and config loading
//! - [`error`] - Protocol and internal error types
//! - [`http`] - Axum response rendering
//! - [`oauth`] - Session model and the flow [`Server`](oauth::Server)
//! - [`ocl`] - Capability descriptor and its accessor
//! - [`observability`] - Tracing setup
//! - [`resource`] - Resource availability predicate
//! - [`storage`] - Storage traits for sessions
//! - [`token`] - Token generation and introspection
//! - [`validation`] - Request validation rules
//!
//! Backends implementing [`storage::DataStore`] live in separate crates,
//! e.g. `zorg-oauth-memory`.

pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod observability;
pub mod ocl;
pub mod resource;
pub mod storage;
pub mod token;
pub mod validation;

pub use config::{AppConfig, ConfigError, LoggingConfig, OAuthConfig};
pub use error::{AuthError, ErrorCategory, OAuthError, OAuthErrorCode};
pub use oauth::{
    AuthorizationGrant, AuthorizationRequest, AuthorizationResponse, NewOAuthSession,
    OAuthSession, Server, SessionRef, SessionState, TokenRequest, TokenResponse,
};
pub use ocl::{
    CapabilityDescriptor, CapabilityDescriptorSource, RegisteredClient, StaticDescriptorSource,
};
pub use resource::{ClientData, FnResourceAvailability, ResourceAvailability};
pub use storage::DataStore;
pub use token::{IntrospectionResponse, Token, TokenGenerator};

/// Type alias for flow results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use zorg_oauth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::config::{AppConfig, OAuthConfig};
    pub use crate::error::{AuthError, OAuthError, OAuthErrorCode};
    pub use crate::oauth::{
        AuthorizationGrant, AuthorizationRequest, NewOAuthSession, OAuthSession, Server,
        SessionState, TokenRequest, TokenResponse,
    };
    pub use crate::ocl::{CapabilityDescriptor, CapabilityDescriptorSource, RegisteredClient};
    pub use crate::resource::{ClientData, ResourceAvailability};
    pub use crate::storage::DataStore;
}
