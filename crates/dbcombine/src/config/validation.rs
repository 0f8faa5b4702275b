//! Configuration validation.

use super::Config;
use crate::error::{CombineError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.source.location.trim().is_empty() {
        return Err(CombineError::Config("source.location is required".into()));
    }
    if config.target.location.trim().is_empty() {
        return Err(CombineError::Config("target.location is required".into()));
    }

    // Cannot combine a database into itself
    if config.source.location.trim() == config.target.location.trim() {
        return Err(CombineError::Config(
            "source and target cannot be the same database".into(),
        ));
    }

    // Only check if explicitly set
    if let Some(0) = config.combine.batch_size {
        return Err(CombineError::Config(
            "combine.batch_size must be at least 1".into(),
        ));
    }

    for pattern in config
        .combine
        .include_tables
        .iter()
        .chain(config.combine.exclude_tables.iter())
    {
        if pattern.trim().is_empty() {
            return Err(CombineError::Config(
                "table filter patterns cannot be empty".into(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CombineConfig, DatabaseConfig};

    fn valid_config() -> Config {
        Config {
            source: DatabaseConfig::new("weather_data.sqlite"),
            target: DatabaseConfig::new("time_series.sqlite"),
            combine: CombineConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&valid_config()).is_ok());
    }

    #[test]
    fn test_missing_source_location() {
        let mut config = valid_config();
        config.source.location = "  ".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("source.location"));
    }

    #[test]
    fn test_missing_target_location() {
        let mut config = valid_config();
        config.target.location = String::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_same_database_rejected() {
        let mut config = valid_config();
        config.target.location = config.source.location.clone();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("same database"));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = valid_config();
        config.combine.batch_size = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let mut config = valid_config();
        config.combine.exclude_tables = vec!["".to_string()];
        assert!(validate(&config).is_err());
    }
}
