//! Application services

mod chaos_engine;
mod chaos_stats;
mod chaos_store;

pub use chaos_engine::{ChaosEngine, ChaosPolicy, ChaosVariant, ChaosVerdict, DEFAULT_CHAOS_RATE};
pub use chaos_stats::{ChaosEvent, ChaosRecorder, ChaosStats};
pub use chaos_store::ChaosKvStore;
