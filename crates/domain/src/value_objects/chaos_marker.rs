//! Chaos marker - the fixed prefix that tags misdirected writes
//!
//! When a write is misdirected, the alternate key or value is derived by
//! prefixing the requested one with this marker. The marker makes the
//! corruption discoverable in a dump without changing upsert semantics.

/// Fixed prefix applied to misdirected keys and values
pub const CHAOS_MARKER: &str = "chaos_";

/// Derive the alternate key or value for a misdirected write
pub fn misdirect(original: &str) -> String {
    format!("{CHAOS_MARKER}{original}")
}

/// Check whether a key or value carries the chaos marker
pub fn is_misdirected(candidate: &str) -> bool {
    candidate.starts_with(CHAOS_MARKER)
}
