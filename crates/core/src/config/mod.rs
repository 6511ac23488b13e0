//! Application configuration with layered loading.
//!
//! Configuration is loaded with figment from multiple sources:
//!
//! 1. Environment variables (GLOBE_*)
//! 2. TOML config file (if GLOBE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Default country dataset endpoint.
pub const DEFAULT_API_URL: &str =
    "https://raw.githubusercontent.com/atilsamancioglu/IA19-DataSetCountries/master/countrydataset.json";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (GLOBE_*)
/// 2. TOML config file (if GLOBE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Endpoint returning the JSON country list.
    ///
    /// Set via GLOBE_API_URL environment variable.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Path to the SQLite database holding the country table and preferences.
    ///
    /// Set via GLOBE_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Age after which the cached list is considered stale, in seconds.
    ///
    /// Set via GLOBE_REFRESH_THRESHOLD_SECS environment variable.
    #[serde(default = "default_refresh_threshold_secs")]
    pub refresh_threshold_secs: u64,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via GLOBE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum response body size in bytes.
    ///
    /// Set via GLOBE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via GLOBE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./globe-countries.sqlite")
}

fn default_refresh_threshold_secs() -> u64 {
    10 * 60
}

fn default_user_agent() -> String {
    "globe/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            db_path: default_db_path(),
            refresh_threshold_secs: default_refresh_threshold_secs(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Staleness threshold as Duration.
    pub fn refresh_threshold(&self) -> Duration {
        Duration::from_secs(self.refresh_threshold_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration file cannot be read,
    /// environment variables cannot be parsed, or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("GLOBE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("GLOBE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into()),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.db_path, PathBuf::from("./globe-countries.sqlite"));
        assert_eq!(config.refresh_threshold_secs, 600);
        assert_eq!(config.user_agent, "globe/0.1");
        assert_eq!(config.max_bytes, 5_242_880);
        assert_eq!(config.timeout_ms, 20_000);
    }

    #[test]
    fn test_durations() {
        let config = AppConfig::default();
        assert_eq!(config.timeout(), Duration::from_millis(20_000));
        assert_eq!(config.refresh_threshold(), Duration::from_secs(600));
        assert_eq!(config.refresh_threshold().as_nanos(), 600_000_000_000);
    }

    #[test]
    fn test_load_env_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("GLOBE_REFRESH_THRESHOLD_SECS", "30");
            jail.set_env("GLOBE_API_URL", "https://example.com/countries.json");

            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.refresh_threshold_secs, 30);
            assert_eq!(config.api_url, "https://example.com/countries.json");
            assert_eq!(config.timeout_ms, 20_000);
            Ok(())
        });
    }

    #[test]
    fn test_load_toml_file_then_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "globe.toml",
                r#"
                db_path = "/tmp/from-file.sqlite"
                timeout_ms = 5000
                "#,
            )?;
            jail.set_env("GLOBE_CONFIG_FILE", "globe.toml");
            jail.set_env("GLOBE_TIMEOUT_MS", "7000");

            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.db_path, PathBuf::from("/tmp/from-file.sqlite"));
            assert_eq!(config.timeout_ms, 7000);
            Ok(())
        });
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        Jail::expect_with(|jail| {
            jail.set_env("GLOBE_REFRESH_THRESHOLD_SECS", "0");
            let result = AppConfig::load();
            assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "refresh_threshold_secs"));
            Ok(())
        });
    }
}
