//! Capability descriptor accessor.
//!
//! The flow never caches the descriptor itself; it asks the source on every
//! authorization request so that revoked registrations take effect at once.

use std::sync::Arc;

use arc_swap::ArcSwap;
use async_trait::async_trait;

use super::descriptor::CapabilityDescriptor;
use crate::AuthResult;

/// Supplies the currently valid capability descriptor.
///
/// Implementations may fetch the document over the network, read it from a
/// cache, or hold it in memory.
#[async_trait]
pub trait CapabilityDescriptorSource: Send + Sync {
    /// Returns the current descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the descriptor cannot be obtained.
    async fn get_ocl(&self) -> AuthResult<Arc<CapabilityDescriptor>>;
}

/// In-memory descriptor that can be swapped atomically.
///
/// Readers never block; [`replace`](Self::replace) publishes a new
/// descriptor for all subsequent requests.
#[derive(Debug)]
pub struct StaticDescriptorSource {
    current: ArcSwap<CapabilityDescriptor>,
}

impl StaticDescriptorSource {
    /// Creates a source serving `descriptor`.
    #[must_use]
    pub fn new(descriptor: CapabilityDescriptor) -> Self {
        Self {
            current: ArcSwap::from_pointee(descriptor),
        }
    }

    /// Publishes a new descriptor.
    pub fn replace(&self, descriptor: CapabilityDescriptor) {
        let clients = descriptor.clients.len();
        self.current.store(Arc::new(descriptor));
        tracing::info!(clients, "Capability descriptor replaced");
    }

    /// Returns the current descriptor without going through the trait.
    #[must_use]
    pub fn snapshot(&self) -> Arc<CapabilityDescriptor> {
        self.current.load_full()
    }
}

impl Default for StaticDescriptorSource {
    fn default() -> Self {
        Self::new(CapabilityDescriptor::default())
    }
}

#[async_trait]
impl CapabilityDescriptorSource for StaticDescriptorSource {
    async fn get_ocl(&self) -> AuthResult<Arc<CapabilityDescriptor>> {
        Ok(self.current.load_full())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocl::descriptor::RegisteredClient;

    #[tokio::test]
    async fn test_static_source_serves_descriptor() {
        let source = StaticDescriptorSource::new(CapabilityDescriptor::new(vec![
            RegisteredClient::new("medmij-app"),
        ]));

        let descriptor = source.get_ocl().await.unwrap();
        assert!(descriptor.client("medmij-app").is_some());
    }

    #[tokio::test]
    async fn test_replace_takes_effect() {
        let source = StaticDescriptorSource::new(CapabilityDescriptor::new(vec![
            RegisteredClient::new("medmij-app"),
        ]));
        let before = source.get_ocl().await.unwrap();

        source.replace(CapabilityDescriptor::default());

        let after = source.get_ocl().await.unwrap();
        assert!(after.client("medmij-app").is_none());
        // Readers holding the old snapshot keep it
        assert!(before.client("medmij-app").is_some());
        assert!(source.snapshot().clients.is_empty());
    }
}
