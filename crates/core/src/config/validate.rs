use super::{types::Config, ConfigError};
use super::DebridBackend;

/// Validate configuration
/// Currently validates:
/// - The selected debrid backend has its section and a non-empty API key
/// - Timeouts are not 0
/// - Size tolerance is a percentage
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    match config.debrid.backend {
        DebridBackend::RealDebrid => {
            let Some(rd) = &config.debrid.real_debrid else {
                return Err(ConfigError::ValidationError(
                    "debrid.real_debrid section is required for backend real_debrid".to_string(),
                ));
            };
            if rd.api_key.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "debrid.real_debrid.api_key cannot be empty".to_string(),
                ));
            }
            if rd.timeout_secs == 0 {
                return Err(ConfigError::ValidationError(
                    "debrid.real_debrid.timeout_secs cannot be 0".to_string(),
                ));
            }
        }
    }

    if config.downloader.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "downloader.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.downloader.size_tolerance_percent > 100 {
        return Err(ConfigError::ValidationError(
            "downloader.size_tolerance_percent must be between 0 and 100".to_string(),
        ));
    }

    Ok(())
}
