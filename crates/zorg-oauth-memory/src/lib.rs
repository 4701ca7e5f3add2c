//! In-memory session storage for zorg-oauth.
//!
//! This crate provides an implementation of the [`DataStore`] trait from
//! `zorg-oauth` backed by sharded concurrent maps. Sessions are lost on
//! restart, so it suits tests and single-node deployments without
//! persistence requirements.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use zorg_oauth::Server;
//! use zorg_oauth_memory::InMemoryDataStore;
//!
//! let store = Arc::new(InMemoryDataStore::new());
//! let server = Server::new(store, descriptor_source, availability, &config.oauth)?;
//! ```

pub mod store;

pub use store::InMemoryDataStore;

// Re-export the DataStore trait for convenience
pub use zorg_oauth::DataStore;

/// Type alias for a shareable DataStore instance.
pub type DynDataStore = std::sync::Arc<dyn DataStore>;

/// Creates a new in-memory DataStore instance.
pub fn create_data_store() -> DynDataStore {
    std::sync::Arc::new(InMemoryDataStore::new())
}
