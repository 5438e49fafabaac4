//! Embedding backend configuration.
//!
//! Configuration can be loaded from:
//! - TOML files (default: ~/.config/geosnap/inference.toml)
//! - Environment variables (GEOSNAP_* prefixed)
//!
//! # Example
//!
//! ```rust,no_run
//! use geosnap_inference::config::VisionConfig;
//!
//! // Load from default path or fall back to env vars
//! let config = VisionConfig::load().expect("Failed to load config");
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn default_api_version() -> String {
    "2024-02-01".to_string()
}

fn default_model_version() -> String {
    "2023-04-15".to_string()
}

fn default_dimension() -> usize {
    geosnap_core::defaults::DEFAULT_EMBEDDING_DIMENSION
}

fn default_timeout_secs() -> u64 {
    30
}

// The Azure image-analysis endpoints cap the binary payload at 20 MB.
fn default_max_image_bytes() -> usize {
    20 * 1024 * 1024
}

/// Vision embedding service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Base URL of the vision service (e.g. `https://myresource.cognitiveservices.azure.com/`).
    pub endpoint: String,
    /// Subscription key sent with every request.
    pub api_key: String,
    /// REST API version query parameter.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Vectorization model version query parameter.
    #[serde(default = "default_model_version")]
    pub model_version: String,
    /// Dimension of the returned vectors.
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Largest image payload accepted by the service. Callers must
    /// downscale anything bigger before vectorizing.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

impl VisionConfig {
    /// Default config file path: `~/.config/geosnap/inference.toml`.
    pub fn default_path() -> Option<PathBuf> {
        env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("geosnap")
                .join("inference.toml")
        })
    }

    /// Load from the default path if it exists, otherwise from env vars.
    pub fn load() -> ConfigResult<Self> {
        if let Some(path) = Self::default_path() {
            if path.exists() {
                debug!(path = %path.display(), "Loading vision config from file");
                return Self::from_file(&path);
            }
        }
        debug!("No config file found, loading vision config from environment");
        Self::from_env()
    }

    /// Load from an explicit TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        info!(
            subsystem = "inference",
            component = "config",
            endpoint = %config.endpoint,
            dimension = config.dimension,
            "Vision config loaded from file"
        );
        Ok(config)
    }

    /// Load from `GEOSNAP_VISION_*` environment variables.
    pub fn from_env() -> ConfigResult<Self> {
        let endpoint = env::var("GEOSNAP_VISION_ENDPOINT").unwrap_or_default();
        let api_key = env::var("GEOSNAP_VISION_KEY").unwrap_or_default();
        let api_version =
            env::var("GEOSNAP_VISION_API_VERSION").unwrap_or_else(|_| default_api_version());
        let model_version =
            env::var("GEOSNAP_VISION_MODEL_VERSION").unwrap_or_else(|_| default_model_version());
        let dimension = env::var("GEOSNAP_VISION_DIMENSION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_dimension);
        let timeout_secs = env::var("GEOSNAP_VISION_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_timeout_secs);
        let max_image_bytes = env::var("GEOSNAP_VISION_MAX_IMAGE_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_max_image_bytes);

        let config = Self {
            endpoint,
            api_key,
            api_version,
            model_version,
            dimension,
            timeout_secs,
            max_image_bytes,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::Validation(
                "vision endpoint cannot be empty".to_string(),
            ));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "vision endpoint must start with http:// or https://, got: {}",
                self.endpoint
            )));
        }
        if self.api_key.is_empty() {
            return Err(ConfigError::Validation(
                "vision api_key cannot be empty".to_string(),
            ));
        }
        if self.dimension == 0 {
            return Err(ConfigError::Validation(
                "vision dimension must be non-zero".to_string(),
            ));
        }
        if self.max_image_bytes == 0 {
            return Err(ConfigError::Validation(
                "vision max_image_bytes must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> VisionConfig {
        VisionConfig {
            endpoint: "https://vision.example.com/".to_string(),
            api_key: "secret".to_string(),
            api_version: default_api_version(),
            model_version: default_model_version(),
            dimension: 1024,
            timeout_secs: 30,
            max_image_bytes: default_max_image_bytes(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_empty_endpoint_rejected() {
        let mut config = base_config();
        config.endpoint = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_http_endpoint_rejected() {
        let mut config = base_config();
        config.endpoint = "ftp://vision.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let mut config = base_config();
        config.dimension = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_defaults_fill_in() {
        let config: VisionConfig = toml::from_str(
            r#"
            endpoint = "https://vision.example.com/"
            api_key = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(config.api_version, "2024-02-01");
        assert_eq!(config.model_version, "2023-04-15");
        assert_eq!(config.dimension, 1024);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.max_image_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn test_zero_max_image_bytes_rejected() {
        let mut config = base_config();
        config.max_image_bytes = 0;
        assert!(config.validate().is_err());
    }
}
