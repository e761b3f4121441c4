use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

pub const DEFAULT_CITY: &str = "Lagos";
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";

/// Environment variable that overrides the configured OpenWeatherMap key.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

/// Credentials for the upstream weather provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the backend listens on, e.g. "127.0.0.1:5000".
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// default_city = "Lagos"
/// api_base_url = "http://127.0.0.1:5000"
///
/// [server]
/// bind = "127.0.0.1:5000"
///
/// [openweather]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// City looked up when the input is left empty.
    pub default_city: String,

    /// Where the dashboard sends `GET /api/weather`.
    pub api_base_url: String,

    pub server: ServerConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub openweather: Option<ProviderConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_city: DEFAULT_CITY.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            server: ServerConfig::default(),
            openweather: None,
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    /// `WEATHER_API_KEY` from the environment wins over the stored key.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = Self::load_from(&path)?;
        cfg.apply_env_key(std::env::var(API_KEY_ENV).ok());
        Ok(cfg)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.openweather = Some(ProviderConfig { api_key });
    }

    pub fn api_key(&self) -> Option<&str> {
        self.openweather.as_ref().map(|cfg| cfg.api_key.as_str())
    }

    /// API key, or an error telling the user how to configure one.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key().ok_or_else(|| {
            anyhow!(
                "No OpenWeatherMap API key configured.\n\
                 Hint: run `weather configure` or set {API_KEY_ENV}."
            )
        })
    }

    fn apply_env_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.set_api_key(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_lagos_and_local_backend() {
        let cfg = Config::default();
        assert_eq!(cfg.default_city, "Lagos");
        assert_eq!(cfg.server.bind, DEFAULT_BIND);
        assert_eq!(cfg.api_base_url, DEFAULT_API_BASE_URL);
        assert!(cfg.api_key().is_none());
    }

    #[test]
    fn require_api_key_errors_when_missing() {
        let err = Config::default().require_api_key().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No OpenWeatherMap API key configured"));
        assert!(msg.contains("weather configure"));
    }

    #[test]
    fn env_key_overrides_stored_key() {
        let mut cfg = Config::default();
        cfg.set_api_key("FROM_FILE".into());

        cfg.apply_env_key(Some("FROM_ENV".into()));
        assert_eq!(cfg.api_key(), Some("FROM_ENV"));

        cfg.apply_env_key(Some("   ".into()));
        assert_eq!(cfg.api_key(), Some("FROM_ENV"));

        cfg.apply_env_key(None);
        assert_eq!(cfg.api_key(), Some("FROM_ENV"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [openweather]
            api_key = "KEY"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.api_key(), Some("KEY"));
        assert_eq!(cfg.default_city, DEFAULT_CITY);
        assert_eq!(cfg.server.bind, DEFAULT_BIND);
    }

    #[test]
    fn save_then_load_keeps_settings() {
        let path = std::env::temp_dir()
            .join(format!("weather-core-config-{}", std::process::id()))
            .join("config.toml");

        let mut cfg = Config::default();
        cfg.default_city = "Abuja".into();
        cfg.set_api_key("KEY".into());
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.default_city, "Abuja");
        assert_eq!(loaded.api_key(), Some("KEY"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("weather-core-does-not-exist/config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.default_city, DEFAULT_CITY);
    }
}
