//! Storage traits for the authorization-code flow.
//!
//! # Implementations
//!
//! - `zorg-oauth-memory` - in-memory backend

pub mod session;

pub use session::DataStore;
