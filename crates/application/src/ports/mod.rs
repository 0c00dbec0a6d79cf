//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the execution layer and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod transport;

pub use transport::{DispatchMode, Transport, TransportError};
