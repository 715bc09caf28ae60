//! Configuration management.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
}

/// Backend connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the document chat backend
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds. Unset means wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }
}

/// Local storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the local database and log file
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join("docchat")
        .to_string_lossy()
        .to_string()
}

/// Document upload limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted document in bytes
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    /// Accepted lowercase file extensions
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_max_bytes() -> u64 {
    20 * 1024 * 1024
}

fn default_allowed_types() -> Vec<String> {
    ["pdf", "doc", "docx", "txt", "html"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Display configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Date format for lists
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Date and time format for messages
    #[serde(default = "default_datetime_format")]
    pub datetime_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
            datetime_format: default_datetime_format(),
        }
    }
}

fn default_date_format() -> String {
    "%b %d, %Y".to_string()
}

fn default_datetime_format() -> String {
    "%b %d, %Y %H:%M".to_string()
}

/// Optional "#RRGGBB" colour overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub accent: Option<String>,
    pub muted: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl Config {
    /// Load configuration from default location.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if config_path.exists() {
            Self::from_file(&config_path.to_string_lossy())
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file.
    pub fn from_file(path: &str) -> Result<Self> {
        let expanded = expand_path(path);
        let content = std::fs::read_to_string(&expanded)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Get the default config path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("docchat")
            .join("config.toml")
    }

    /// Get the data directory for the local database and logs.
    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(expand_path(&self.storage.data_dir))
    }

    /// Path of the local key/value database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("docchat.db")
    }

    /// Path of the log file.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir().join("docchat.log")
    }
}

/// Expand ~ to home directory.
pub fn expand_path(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert!(config.api.timeout().is_none());
        assert_eq!(config.upload.max_bytes, 20 * 1024 * 1024);
        assert_eq!(config.upload.allowed_types.len(), 5);
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r##"
            [api]
            base_url = "https://docs.example.com"
            timeout_secs = 15

            [upload]
            allowed_types = ["pdf"]

            [theme]
            accent = "#ff8800"
            "##,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://docs.example.com");
        assert_eq!(config.api.timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.upload.allowed_types, vec!["pdf".to_string()]);
        assert_eq!(config.upload.max_bytes, 20 * 1024 * 1024);
        assert_eq!(config.theme.accent.as_deref(), Some("#ff8800"));
        assert_eq!(config.display.date_format, "%b %d, %Y");
    }

    #[test]
    fn test_zero_timeout_means_none() {
        let config: Config = toml::from_str("[api]\ntimeout_secs = 0\n").unwrap();
        assert!(config.api.timeout().is_none());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[storage]\ndata_dir = \"/tmp/docchat-test\"\n").unwrap();

        let config = Config::from_file(&path.to_string_lossy()).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("/tmp/docchat-test/docchat.db"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/docchat-test/docchat.log"));
    }

    #[test]
    fn test_expand_path_leaves_absolute_paths() {
        assert_eq!(expand_path("/var/lib/docchat"), "/var/lib/docchat");
    }
}
