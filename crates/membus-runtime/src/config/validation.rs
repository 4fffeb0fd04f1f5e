//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{LogFormat, LogOutput, LoggingConfig, MembusConfig};

/// Validates the entire configuration.
pub fn validate_config(config: &MembusConfig) -> ConfigResult<()> {
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.format == LogFormat::Json && !cfg!(feature = "json-log") {
        return Err(ConfigError::validation(
            "JSON log format requires the `json-log` feature",
        ));
    }

    if logging.output == LogOutput::File {
        match &logging.file_path {
            None => return Err(ConfigError::missing_field("logging.file_path")),
            Some(path) if path.file_name().is_none() => {
                return Err(ConfigError::validation(format!(
                    "Log file path has no file name: {}",
                    path.display()
                )));
            }
            Some(_) => {}
        }
    }

    for target in logging.filters.keys() {
        validate_filter_target(target)?;
    }

    Ok(())
}

/// Filter targets become `EnvFilter` directives, so they must be a bare
/// module path.
fn validate_filter_target(target: &str) -> ConfigResult<()> {
    if target.is_empty() {
        return Err(ConfigError::validation("Log filter target cannot be empty"));
    }

    if target.contains(|c: char| c.is_whitespace() || matches!(c, '=' | ',' | '[' | ']')) {
        return Err(ConfigError::validation(format!(
            "Invalid log filter target: {target}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LogLevel;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&MembusConfig::default()).is_ok());
    }

    #[test]
    fn test_file_output_needs_path() {
        let mut config = MembusConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.logging.file_path = Some(PathBuf::from("logs/membus.log"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_filter_target() {
        let mut config = MembusConfig::default();
        config
            .logging
            .filters
            .insert("membus_core=debug".into(), LogLevel::Trace);
        assert!(validate_config(&config).is_err());

        config.logging.filters.clear();
        config
            .logging
            .filters
            .insert("membus_core::strategy".into(), LogLevel::Trace);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_json_format_follows_feature() {
        let mut config = MembusConfig::default();
        config.logging.format = LogFormat::Json;
        assert_eq!(validate_config(&config).is_ok(), cfg!(feature = "json-log"));
    }
}
