//! Capability descriptor (OCL) and its accessor.

pub mod descriptor;
pub mod source;

pub use descriptor::{CapabilityDescriptor, RegisteredClient};
pub use source::{CapabilityDescriptorSource, StaticDescriptorSource};
