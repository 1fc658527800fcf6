//! Chaos accounting - counters and the observable side channel
//!
//! Every corrupted operation leaves two traces: a human-readable note (also
//! logged under the `chaos` target) and a bump in the counters. Neither ever
//! affects the value an operation returns.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// What a corrupted operation really did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChaosEvent {
    /// A put performed no write at all but reported success
    SilentDrop { key: String },
    /// A put landed under a different key
    KeyMisdirected { requested: String, actual: String },
    /// A put stored a different value under the requested key
    ValueMisdirected { key: String },
    /// A get returned the value of a different key
    ReadRedirected { requested: String, actual: String },
    /// A delete removed a different record
    DeleteRedirected { requested: String, actual: String },
}

impl std::fmt::Display for ChaosEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SilentDrop { key } => {
                write!(f, "put('{key}') silently dropped")
            },
            Self::KeyMisdirected { requested, actual } => {
                write!(f, "put('{requested}') stored under '{actual}'")
            },
            Self::ValueMisdirected { key } => {
                write!(f, "put('{key}') stored a corrupted value")
            },
            Self::ReadRedirected { requested, actual } => {
                write!(f, "get('{requested}') returned the value of '{actual}'")
            },
            Self::DeleteRedirected { requested, actual } => {
                write!(f, "delete('{requested}') removed '{actual}' instead")
            },
        }
    }
}

/// Snapshot of the chaos counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChaosStats {
    /// Total operations processed (put + get + delete)
    pub total_operations: u64,
    /// Operations that were corrupted
    pub chaos_fired: u64,
    /// Puts that wrote nothing
    pub silent_drops: u64,
    /// Puts redirected to a marker-prefixed key
    pub keys_misdirected: u64,
    /// Puts that stored a marker-prefixed value
    pub values_misdirected: u64,
    /// Gets answered with a random record's value
    pub reads_redirected: u64,
    /// Deletes that removed a random record
    pub deletes_redirected: u64,
}

impl ChaosStats {
    /// Calculate the observed chaos rate
    #[allow(clippy::cast_precision_loss)]
    pub fn observed_chaos_rate(&self) -> f64 {
        if self.total_operations == 0 {
            0.0
        } else {
            self.chaos_fired as f64 / self.total_operations as f64
        }
    }
}

/// Thread-safe recorder behind the store
///
/// Counters are atomics so concurrent callers can share one recorder without
/// locking; the last event sits behind a lock because it is a compound value.
#[derive(Debug, Default)]
pub struct ChaosRecorder {
    total_operations: AtomicU64,
    chaos_fired: AtomicU64,
    silent_drops: AtomicU64,
    keys_misdirected: AtomicU64,
    values_misdirected: AtomicU64,
    reads_redirected: AtomicU64,
    deletes_redirected: AtomicU64,
    last_event: RwLock<Option<ChaosEvent>>,
}

impl ChaosRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one operation passing through the store
    pub fn record_operation(&self) {
        self.total_operations.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a corrupted operation and keep its note as the last event
    pub fn record_event(&self, event: ChaosEvent) {
        self.chaos_fired.fetch_add(1, Ordering::Relaxed);
        let counter = match &event {
            ChaosEvent::SilentDrop { .. } => &self.silent_drops,
            ChaosEvent::KeyMisdirected { .. } => &self.keys_misdirected,
            ChaosEvent::ValueMisdirected { .. } => &self.values_misdirected,
            ChaosEvent::ReadRedirected { .. } => &self.reads_redirected,
            ChaosEvent::DeleteRedirected { .. } => &self.deletes_redirected,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        *self.last_event.write() = Some(event);
    }

    /// The note left by the most recent corruption, if any
    pub fn last_event(&self) -> Option<ChaosEvent> {
        self.last_event.read().clone()
    }

    /// Snapshot the counters
    pub fn snapshot(&self) -> ChaosStats {
        ChaosStats {
            total_operations: self.total_operations.load(Ordering::Relaxed),
            chaos_fired: self.chaos_fired.load(Ordering::Relaxed),
            silent_drops: self.silent_drops.load(Ordering::Relaxed),
            keys_misdirected: self.keys_misdirected.load(Ordering::Relaxed),
            values_misdirected: self.values_misdirected.load(Ordering::Relaxed),
            reads_redirected: self.reads_redirected.load(Ordering::Relaxed),
            deletes_redirected: self.deletes_redirected.load(Ordering::Relaxed),
        }
    }

    /// Reset counters and the last event
    pub fn reset(&self) {
        self.total_operations.store(0, Ordering::Relaxed);
        self.chaos_fired.store(0, Ordering::Relaxed);
        self.silent_drops.store(0, Ordering::Relaxed);
        self.keys_misdirected.store(0, Ordering::Relaxed);
        self.values_misdirected.store(0, Ordering::Relaxed);
        self.reads_redirected.store(0, Ordering::Relaxed);
        self.deletes_redirected.store(0, Ordering::Relaxed);
        *self.last_event.write() = None;
    }
}
