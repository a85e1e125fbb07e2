use std::path::Path;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};

use super::{types::Config, ConfigError};

/// Environment variables overriding the file, e.g.
/// `DEBRIDARR_DEBRID__REAL_DEBRID__API_KEY`.
pub const ENV_PREFIX: &str = "DEBRIDARR_";

/// Nested keys are separated by a double underscore.
const ENV_SEPARATOR: &str = "__";

/// Sources in precedence order: the TOML file, then the environment.
fn figment(path: &Path) -> Figment {
    Figment::from(Toml::file(path)).merge(Env::prefixed(ENV_PREFIX).split(ENV_SEPARATOR))
}

/// Load the configuration file with environment overrides applied.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }
    figment(path)
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parse a TOML document without consulting the environment.
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[debrid]
backend = "real_debrid"

[debrid.real_debrid]
api_key = "secret"

[library]
root = "/media"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.library.root.to_str().unwrap(), "/media");
        assert_eq!(config.debrid.real_debrid.as_ref().unwrap().api_key, "secret");
    }

    #[test]
    fn test_load_config_from_str_missing_debrid() {
        let toml = r#"
[library]
root = "/media"
"#;
        let result = load_config_from_str(toml);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/debridarr.toml"));
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[debrid]
backend = "real_debrid"

[debrid.real_debrid]
api_key = "abc"
timeout_secs = 15

[library]
root = "/srv/media"

[resolver]
individual_check_delay_ms = 250
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.library.root.to_str().unwrap(), "/srv/media");
        assert_eq!(config.resolver.individual_check_delay_ms, 250);
        assert_eq!(config.debrid.real_debrid.unwrap().timeout_secs, 15);
    }

    #[test]
    fn test_nested_env_overrides_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[debrid]
backend = "real_debrid"

[debrid.real_debrid]
api_key = "from-file"

[orchestrator]
cooldown_secs = 60
"#
        )
        .unwrap();

        std::env::set_var("DEBRIDARR_DEBRID__REAL_DEBRID__API_KEY", "from-env");
        std::env::set_var("DEBRIDARR_ORCHESTRATOR__COOLDOWN_SECS", "7200");
        let result = load_config(temp_file.path());
        std::env::remove_var("DEBRIDARR_DEBRID__REAL_DEBRID__API_KEY");
        std::env::remove_var("DEBRIDARR_ORCHESTRATOR__COOLDOWN_SECS");

        let config = result.unwrap();
        assert_eq!(config.debrid.real_debrid.unwrap().api_key, "from-env");
        assert_eq!(config.orchestrator.cooldown_secs, 7200);
    }
}
