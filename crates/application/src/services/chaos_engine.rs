//! Chaos decision engine
//!
//! A pure, stateless decision procedure: per operation it decides whether
//! chaos fires (a Bernoulli trial) and, if so, which variant applies (a
//! uniform choice over three outcomes). The randomness source is a parameter
//! so tests can drive the engine with a seeded generator; production callers
//! use the thread-local generator via the convenience methods.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Probability that any single operation is corrupted
pub const DEFAULT_CHAOS_RATE: f64 = 0.3;

/// The three mutually exclusive corruption variants
///
/// The engine is operation-agnostic; the store maps the variant onto the
/// operation at hand. For reads and deletes all variants collapse into a
/// single redirect behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChaosVariant {
    /// Perform nothing, report success anyway
    Silent,
    /// Write under a marker-prefixed key
    MisdirectKey,
    /// Write a marker-prefixed value under the requested key
    MisdirectValue,
}

impl ChaosVariant {
    /// Map a uniform index in {0, 1, 2} onto a variant
    const fn from_index(index: u8) -> Self {
        match index {
            0 => Self::Silent,
            1 => Self::MisdirectKey,
            _ => Self::MisdirectValue,
        }
    }
}

/// Outcome of a single chaos decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChaosVerdict {
    /// Perform the operation as literally requested
    Honest,
    /// Corrupt the operation with the given variant
    Chaotic(ChaosVariant),
}

impl ChaosVerdict {
    /// Check whether this verdict corrupts the operation
    pub const fn is_chaotic(&self) -> bool {
        matches!(self, Self::Chaotic(_))
    }
}

/// Policy for chaos decisions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChaosPolicy {
    /// Probability of corrupting an operation (0.0 to 1.0)
    pub chaos_rate: f64,

    /// Whether chaos is enabled at all
    pub enabled: bool,

    /// Force a specific variant whenever chaos fires (tests)
    pub forced_variant: Option<ChaosVariant>,
}

impl Default for ChaosPolicy {
    fn default() -> Self {
        Self {
            chaos_rate: DEFAULT_CHAOS_RATE,
            enabled: true,
            forced_variant: None,
        }
    }
}

impl ChaosPolicy {
    /// Create a policy that never corrupts anything
    pub fn never() -> Self {
        Self {
            chaos_rate: 0.0,
            enabled: false,
            ..Default::default()
        }
    }

    /// Create a policy that corrupts every operation
    pub fn always() -> Self {
        Self {
            chaos_rate: 1.0,
            ..Default::default()
        }
    }

    /// Create a policy that always fires with a fixed variant
    pub fn always_variant(variant: ChaosVariant) -> Self {
        Self {
            chaos_rate: 1.0,
            forced_variant: Some(variant),
            ..Default::default()
        }
    }
}

/// The chaos decision engine
///
/// Pure randomness with no side effects and no error conditions. Decisions
/// are independent across calls; there is no shared state beyond the policy.
#[derive(Debug, Clone)]
pub struct ChaosEngine {
    policy: ChaosPolicy,
}

impl ChaosEngine {
    /// Create an engine with the given policy
    pub const fn new(policy: ChaosPolicy) -> Self {
        Self { policy }
    }

    /// Create an engine that never corrupts anything
    pub fn disabled() -> Self {
        Self::new(ChaosPolicy::never())
    }

    /// Get the active policy
    pub const fn policy(&self) -> &ChaosPolicy {
        &self.policy
    }

    /// Decide the fate of one operation using the thread-local generator
    pub fn verdict(&self) -> ChaosVerdict {
        self.verdict_with(&mut rand::rng())
    }

    /// Decide the fate of one operation using the supplied generator
    ///
    /// The variant roll only happens when the trigger roll fires, so a
    /// seeded generator consumes a predictable amount of randomness.
    pub fn verdict_with<R: Rng + ?Sized>(&self, rng: &mut R) -> ChaosVerdict {
        if self.should_trigger(rng) {
            ChaosVerdict::Chaotic(self.choose_variant(rng))
        } else {
            ChaosVerdict::Honest
        }
    }

    /// Bernoulli trial with the policy's chaos rate
    fn should_trigger<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        if !self.policy.enabled || self.policy.chaos_rate <= 0.0 {
            return false;
        }
        if self.policy.chaos_rate >= 1.0 {
            return true;
        }
        rng.random::<f64>() < self.policy.chaos_rate
    }

    /// Uniform choice over the three variants, unless one is forced
    fn choose_variant<R: Rng + ?Sized>(&self, rng: &mut R) -> ChaosVariant {
        self.policy
            .forced_variant
            .unwrap_or_else(|| ChaosVariant::from_index(rng.random_range(0..3)))
    }
}
