//! Chaos configuration.

use application::{ChaosPolicy, DEFAULT_CHAOS_RATE};
use serde::{Deserialize, Serialize};

/// Shared default for boolean `true` fields across config structs
pub(crate) const fn default_true() -> bool {
    true
}

/// Chaos rate and kill switch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChaosAppConfig {
    /// Whether operations may be corrupted at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Probability of corrupting any single operation (0.0 to 1.0)
    #[serde(default = "default_chaos_rate")]
    pub chaos_rate: f64,
}

const fn default_chaos_rate() -> f64 {
    DEFAULT_CHAOS_RATE
}

impl Default for ChaosAppConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            chaos_rate: DEFAULT_CHAOS_RATE,
        }
    }
}

impl ChaosAppConfig {
    /// Translate into the engine policy
    pub fn policy(&self) -> ChaosPolicy {
        ChaosPolicy {
            chaos_rate: self.chaos_rate.clamp(0.0, 1.0),
            enabled: self.enabled,
            forced_variant: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_mirrors_config() {
        let config = ChaosAppConfig {
            enabled: false,
            chaos_rate: 0.7,
        };
        let policy = config.policy();
        assert!(!policy.enabled);
        assert!((policy.chaos_rate - 0.7).abs() < f64::EPSILON);
        assert!(policy.forced_variant.is_none());
    }

    #[test]
    fn out_of_range_rate_is_clamped() {
        let config = ChaosAppConfig {
            enabled: true,
            chaos_rate: 1.5,
        };
        assert!((config.policy().chaos_rate - 1.0).abs() < f64::EPSILON);
    }
}
