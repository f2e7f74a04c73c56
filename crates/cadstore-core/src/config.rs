//! Configuration types for cadstore

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{CadstoreError, CadstoreResult};

/// Default maximum request body size (200 MiB)
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 200 * 1024 * 1024;

/// Main daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// API server configuration
    pub api: ApiConfig,
    /// Storage configuration
    pub storage: StorageConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl DaemonConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> CadstoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CadstoreError::Config(format!("Failed to read config file: {}", e))
        })?;
        toml::from_str(&content)
            .map_err(|e| CadstoreError::Config(format!("Failed to parse config: {}", e)))
    }
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Address to bind the HTTP server
    pub address: String,
    /// Port for the HTTP server
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: bool,
    /// Allowed CORS origins ("*" allows any)
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 5001,
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding uploaded models
    pub path: PathBuf,
    /// Maximum accepted request body in bytes
    pub max_upload_size: u64,
    /// Accepted file extensions, without the leading dot
    pub allowed_extensions: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("uploads"),
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
            allowed_extensions: vec!["stl".to_string(), "obj".to_string()],
        }
    }
}

impl StorageConfig {
    /// Create a storage configuration rooted at `path` with default limits
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Check the configuration and normalize the extension allow-list
    pub fn validate(mut self) -> CadstoreResult<Self> {
        if self.max_upload_size == 0 {
            return Err(CadstoreError::Config(
                "max_upload_size must be greater than zero".to_string(),
            ));
        }

        self.allowed_extensions = self
            .allowed_extensions
            .iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        if self.allowed_extensions.is_empty() {
            return Err(CadstoreError::Config(
                "allowed_extensions must not be empty".to_string(),
            ));
        }

        Ok(self)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
