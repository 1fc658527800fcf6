//! Chaotic key-value store
//!
//! The public store facade. Every put, get, and delete independently asks the
//! decision engine for a verdict; an honest verdict performs the operation as
//! literally requested, a chaotic one performs a different operation (or none)
//! against the backend while reporting success for the original request.
//! Genuine backend failures are never hidden - chaos only changes which
//! operation runs, or whether the real outcome is reported honestly. The one
//! deliberate exception is the silent put, which fabricates a success while
//! writing nothing.

use std::sync::Arc;

use domain::misdirect;
use tracing::{debug, instrument, warn};

use crate::error::ApplicationError;
use crate::ports::{KvBackendPort, RecordStream};
use crate::services::chaos_engine::{ChaosEngine, ChaosVariant, ChaosVerdict};
use crate::services::chaos_stats::{ChaosEvent, ChaosRecorder, ChaosStats};

/// Key-value store that probabilistically corrupts its own operations
///
/// Stateless apart from the backend handle and the chaos counters; safe to
/// share across concurrent callers.
#[derive(Clone)]
pub struct ChaosKvStore {
    backend: Arc<dyn KvBackendPort>,
    engine: ChaosEngine,
    recorder: Arc<ChaosRecorder>,
}

impl std::fmt::Debug for ChaosKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChaosKvStore")
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl ChaosKvStore {
    /// Create a store over the given backend
    pub fn new(backend: Arc<dyn KvBackendPort>, engine: ChaosEngine) -> Self {
        Self {
            backend,
            engine,
            recorder: Arc::new(ChaosRecorder::new()),
        }
    }

    /// Store a value under a key
    ///
    /// Chaos may silently drop the write, redirect it to a marker-prefixed
    /// key, or corrupt the stored value. All three report success; I/O
    /// failures on the write that was actually performed still propagate.
    #[instrument(skip(self, value))]
    pub async fn put(&self, key: &str, value: &str) -> Result<(), ApplicationError> {
        self.recorder.record_operation();

        match self.engine.verdict() {
            ChaosVerdict::Honest => {
                debug!(key, "honest put");
                self.backend.upsert(key, value).await
            },
            ChaosVerdict::Chaotic(ChaosVariant::Silent) => {
                // The one fabricated success: nothing is written at all
                self.note(ChaosEvent::SilentDrop {
                    key: key.to_string(),
                });
                Ok(())
            },
            ChaosVerdict::Chaotic(ChaosVariant::MisdirectKey) => {
                let actual = misdirect(key);
                self.backend.upsert(&actual, value).await?;
                self.note(ChaosEvent::KeyMisdirected {
                    requested: key.to_string(),
                    actual,
                });
                Ok(())
            },
            ChaosVerdict::Chaotic(ChaosVariant::MisdirectValue) => {
                self.backend.upsert(key, &misdirect(value)).await?;
                self.note(ChaosEvent::ValueMisdirected {
                    key: key.to_string(),
                });
                Ok(())
            },
        }
    }

    /// Fetch the value for a key
    ///
    /// Under chaos the value of a uniformly random existing key is returned
    /// as if it belonged to the requested one. An empty backend fails the
    /// sampling step and that error propagates - chaos cannot fabricate data
    /// that does not exist. Reads never mutate the backend.
    #[instrument(skip(self))]
    pub async fn get(&self, key: &str) -> Result<String, ApplicationError> {
        self.recorder.record_operation();

        if self.engine.verdict().is_chaotic() {
            let actual = self.backend.sample_random_key().await?;
            let record = self.backend.lookup(&actual).await?;
            self.note(ChaosEvent::ReadRedirected {
                requested: key.to_string(),
                actual,
            });
            return Ok(record.value);
        }

        debug!(key, "honest get");
        let record = self.backend.lookup(key).await?;
        Ok(record.value)
    }

    /// Delete the record for a key
    ///
    /// Deleting an absent key is a no-op success. Under chaos a uniformly
    /// random existing record is removed instead; the note names which key
    /// was actually hit. Sampling failure on an empty backend propagates.
    #[instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<(), ApplicationError> {
        self.recorder.record_operation();

        if self.engine.verdict().is_chaotic() {
            let actual = self.backend.sample_random_key().await?;
            self.backend.delete_by_key(&actual).await?;
            self.note(ChaosEvent::DeleteRedirected {
                requested: key.to_string(),
                actual,
            });
            return Ok(());
        }

        debug!(key, "honest delete");
        self.backend.delete_by_key(key).await
    }

    /// Stream every record ordered by key ascending
    ///
    /// Never subject to chaos; this is the ground truth for observing what
    /// previous corruption really did.
    pub fn dump(&self) -> RecordStream {
        self.backend.scan_all()
    }

    /// Sample a uniformly random existing key (no chaos)
    ///
    /// Exposed for drivers that want to mutate random records, such as the
    /// CLI watch mode.
    pub async fn sample_random_key(&self) -> Result<String, ApplicationError> {
        self.backend.sample_random_key().await
    }

    /// Snapshot the chaos counters
    pub fn stats(&self) -> ChaosStats {
        self.recorder.snapshot()
    }

    /// The note left by the most recent corruption, if any
    pub fn last_event(&self) -> Option<ChaosEvent> {
        self.recorder.last_event()
    }

    /// Log a chaos note and record it
    fn note(&self, event: ChaosEvent) {
        warn!(target: "chaos", "{event}");
        self.recorder.record_event(event);
    }
}
