//! Migration run configuration.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::time::Duration;
use tourney::db::{DatabaseConfig, config::parse_env_or};
use tourney::migration::{OrchestratorSettings, TranslatorSettings};

/// Complete configuration for a migration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationSettings {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Tournaments migrated concurrently per chunk
    pub batch_size: usize,
    /// Pause between chunks
    pub batch_pause: Duration,
    /// Translation heuristics
    pub translator: TranslatorSettings,
}

impl MigrationSettings {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `database_url_override` - Optional database URL override (from CLI args)
    /// * `batch_size_override` - Optional batch size override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if a value is out of range
    pub fn from_env(
        database_url_override: Option<String>,
        batch_size_override: Option<usize>,
    ) -> Result<Self, ConfigError> {
        let mut database = DatabaseConfig::from_env();
        if let Some(url) = database_url_override {
            database = database.with_url(url);
        }

        let defaults = TranslatorSettings::default();
        let translator = TranslatorSettings {
            group_size_min: parse_env_or("MIGRATION_GROUP_SIZE_MIN", defaults.group_size_min),
            group_size_max: parse_env_or("MIGRATION_GROUP_SIZE_MAX", defaults.group_size_max),
            default_participants: parse_env_or(
                "MIGRATION_DEFAULT_PARTICIPANTS",
                defaults.default_participants,
            ),
            min_swiss_rounds: parse_env_or("MIGRATION_MIN_SWISS_ROUNDS", defaults.min_swiss_rounds),
        };

        let settings = Self {
            database,
            batch_size: batch_size_override
                .unwrap_or_else(|| parse_env_or("MIGRATION_BATCH_SIZE", 10)),
            batch_pause: Duration::from_millis(parse_env_or("MIGRATION_BATCH_PAUSE_MS", 100)),
            translator,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid {
                var: "MIGRATION_BATCH_SIZE".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.translator.group_size_min < 2 {
            return Err(ConfigError::Invalid {
                var: "MIGRATION_GROUP_SIZE_MIN".to_string(),
                reason: "Must be at least 2".to_string(),
            });
        }

        if self.translator.group_size_max < self.translator.group_size_min {
            return Err(ConfigError::Invalid {
                var: "MIGRATION_GROUP_SIZE_MAX".to_string(),
                reason: format!(
                    "Must be at least the minimum group size ({})",
                    self.translator.group_size_min
                ),
            });
        }

        if self.translator.default_participants < 2 {
            return Err(ConfigError::Invalid {
                var: "MIGRATION_DEFAULT_PARTICIPANTS".to_string(),
                reason: "Must be at least 2".to_string(),
            });
        }

        if self.translator.min_swiss_rounds == 0 {
            return Err(ConfigError::Invalid {
                var: "MIGRATION_MIN_SWISS_ROUNDS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn orchestrator(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            batch_size: self.batch_size,
            batch_pause: self.batch_pause,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> MigrationSettings {
        MigrationSettings {
            database: DatabaseConfig::development(),
            batch_size: 10,
            batch_pause: Duration::from_millis(100),
            translator: TranslatorSettings::default(),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(settings().validate().is_ok());
        assert_eq!(settings().orchestrator().batch_size, 10);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = settings();
        config.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("MIGRATION_BATCH_SIZE"));
    }

    #[test]
    fn test_inverted_group_bounds_rejected() {
        let mut config = settings();
        config.translator.group_size_min = 6;
        config.translator.group_size_max = 4;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("MIGRATION_GROUP_SIZE_MAX"));
    }

    #[test]
    fn test_swiss_rounds_must_be_positive() {
        let mut config = settings();
        config.translator.min_swiss_rounds = 0;
        assert!(config.validate().is_err());
    }
}
