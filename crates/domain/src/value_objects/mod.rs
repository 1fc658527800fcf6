//! Value objects

mod chaos_marker;

pub use chaos_marker::{CHAOS_MARKER, is_misdirected, misdirect};
