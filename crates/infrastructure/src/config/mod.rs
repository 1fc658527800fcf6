//! Application configuration
//!
//! Split into focused sub-modules:
//! - `database`: SQLite database settings
//! - `chaos`: chaos rate and kill switch
//!
//! Values come from defaults, then an optional `config.toml`, then
//! `SCHROKV_*` environment variables, in that order of precedence. Sections
//! are separated by a double underscore so field names may contain single
//! ones, e.g. `SCHROKV_CHAOS__CHAOS_RATE`.

mod chaos;
mod database;

use serde::{Deserialize, Serialize};

pub use chaos::ChaosAppConfig;
pub use database::DatabaseConfig;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Chaos settings
    #[serde(default)]
    pub chaos: ChaosAppConfig,
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("config").required(false))
            // Override with environment variables (e.g., SCHROKV_CHAOS__CHAOS_RATE)
            .add_source(environment_source());

        let config = builder.build()?;
        config.try_deserialize()
    }
}

/// The `SCHROKV_*` environment source
///
/// The section separator must be distinct from the single underscores inside
/// field names like `chaos_rate` and `max_connections`.
fn environment_source() -> config::Environment {
    config::Environment::with_prefix("SCHROKV")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_uses_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.database.path, "schrokv.db");
        assert!(config.chaos.enabled);
        assert!((config.chaos.chaos_rate - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn config_deserializes_from_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [database]
            path = "test.db"
            max_connections = 2

            [chaos]
            enabled = false
            chaos_rate = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, "test.db");
        assert_eq!(config.database.max_connections, 2);
        assert!(!config.chaos.enabled);
        assert!((config.chaos.chaos_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn environment_overrides_fields_with_underscored_names() {
        let mut env = std::collections::HashMap::new();
        env.insert("SCHROKV_CHAOS__CHAOS_RATE".to_string(), "0.9".to_string());
        env.insert(
            "SCHROKV_DATABASE__MAX_CONNECTIONS".to_string(),
            "8".to_string(),
        );

        let config: AppConfig = config::Config::builder()
            .add_source(environment_source().source(Some(env)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!((config.chaos.chaos_rate - 0.9).abs() < f64::EPSILON);
        assert_eq!(config.database.max_connections, 8);
    }

    #[test]
    fn unprefixed_environment_variables_are_ignored() {
        let mut env = std::collections::HashMap::new();
        env.insert("CHAOS__CHAOS_RATE".to_string(), "0.9".to_string());

        let config: AppConfig = config::Config::builder()
            .add_source(environment_source().source(Some(env)))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert!((config.chaos.chaos_rate - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [chaos]
            chaos_rate = 1.0
            "#,
        )
        .unwrap();

        assert_eq!(config.database.path, "schrokv.db");
        assert!(config.chaos.enabled);
        assert!((config.chaos.chaos_rate - 1.0).abs() < f64::EPSILON);
    }
}
