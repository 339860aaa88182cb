use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_CITY: &str = "Mumbai";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Supplies the OpenWeather API key to fetchers.
pub trait CredentialProvider: Send + Sync {
    fn api_key(&self) -> Option<String>;
}

/// A fixed key, e.g. from a command-line flag or environment variable.
#[derive(Debug, Clone)]
pub struct StaticApiKey(pub String);

impl CredentialProvider for StaticApiKey {
    fn api_key(&self) -> Option<String> {
        Some(self.0.clone()).filter(|k| !k.trim().is_empty())
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// api_key = "..."
/// default_city = "Paris"
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_key: Option<String>,

    /// City looked up when none is given.
    pub default_city: Option<String>,

    /// Override for the OpenWeather API root, mostly for testing.
    pub base_url: Option<String>,

    pub request_timeout_secs: Option<u64>,
}

impl CredentialProvider for Config {
    fn api_key(&self) -> Option<String> {
        self.api_key.clone().filter(|k| !k.trim().is_empty())
    }
}

impl Config {
    pub fn default_city(&self) -> &str {
        self.default_city
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CITY)
    }

    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key.trim().to_string());
    }

    pub fn set_default_city(&mut self, city: String) {
        self.default_city = Some(city.trim().to_string());
    }

    pub fn is_configured(&self) -> bool {
        CredentialProvider::api_key(self).is_some()
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "saved configuration");
        Ok(path)
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = Config::default();

        assert_eq!(cfg.default_city(), "Mumbai");
        assert_eq!(cfg.base_url(), DEFAULT_BASE_URL);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert!(!cfg.is_configured());
        assert_eq!(CredentialProvider::api_key(&cfg), None);
    }

    #[test]
    fn set_api_key_trims_and_configures() {
        let mut cfg = Config::default();

        cfg.set_api_key("  OPEN_KEY \n".into());

        assert!(cfg.is_configured());
        assert_eq!(CredentialProvider::api_key(&cfg).as_deref(), Some("OPEN_KEY"));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let cfg = Config {
            api_key: Some("   ".into()),
            ..Config::default()
        };
        assert!(!cfg.is_configured());
        assert_eq!(StaticApiKey(String::new()).api_key(), None);
    }

    #[test]
    fn blank_default_city_falls_back() {
        let mut cfg = Config::default();
        cfg.set_default_city("   ".into());
        assert_eq!(cfg.default_city(), "Mumbai");

        cfg.set_default_city(" Paris ".into());
        assert_eq!(cfg.default_city(), "Paris");
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let cfg = Config {
            base_url: Some("http://127.0.0.1:8080/".into()),
            ..Config::default()
        };
        assert_eq!(cfg.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn parses_toml() {
        let cfg: Config = toml::from_str(
            r#"
            api_key = "KEY"
            default_city = "Oslo"
            request_timeout_secs = 3
            "#,
        )
        .expect("valid toml");

        assert_eq!(CredentialProvider::api_key(&cfg).as_deref(), Some("KEY"));
        assert_eq!(cfg.default_city(), "Oslo");
        assert_eq!(cfg.request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn load_from_missing_file_is_default() {
        let path = std::env::temp_dir().join("weather-core-does-not-exist/config.toml");
        let cfg = Config::load_from(&path).expect("missing file is not an error");
        assert!(cfg.api_key.is_none());
    }
}
