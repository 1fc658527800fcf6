//! Port definitions for the application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement them.

mod kv_backend;

#[cfg(test)]
pub use kv_backend::MockKvBackendPort;
pub use kv_backend::{KvBackendPort, RecordStream};
