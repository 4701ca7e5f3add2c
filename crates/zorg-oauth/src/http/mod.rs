//! HTTP rendering of flow results.
//!
//! Routing is left to the embedding application; this module only turns
//! [`AuthError`](crate::error::AuthError), [`TokenResponse`](crate::oauth::TokenResponse)
//! and [`IntrospectionResponse`](crate::token::IntrospectionResponse) into axum responses.

pub mod response;

pub use response::{ErrorBody, grant_redirect_response};
