//! Domain layer for SchroKV
//!
//! Contains the record entity and the chaos-marker vocabulary. This layer
//! has no knowledge of the storage backend or of the probabilistic machinery
//! layered on top of it.

pub mod entities;
pub mod value_objects;

pub use entities::*;
pub use value_objects::*;
