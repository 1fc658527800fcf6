//! Application layer - the chaotic store and its ports
//!
//! Contains the chaos decision engine, the chaotic key-value store service,
//! and the port the storage backend must implement. Adapters in the
//! infrastructure layer implement the port.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
