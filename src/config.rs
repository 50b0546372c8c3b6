use anyhow::{Context, Result};
use axum::http::HeaderValue;
use serde::Deserialize;
use std::path::Path;

use crate::models::{DownloadType, ProcessOptions, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub processing: ProcessingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Include error details in 500 responses.
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            debug: false,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}
fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

/// Trusted browser origins. Empty means any origin.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorsConfig {
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Defaults applied when an upload omits a processing field.
#[derive(Debug, Deserialize, Clone)]
pub struct ProcessingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default)]
    pub download_type: DownloadType,
    #[serde(default = "default_remove_duplicates")]
    pub remove_duplicates: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            download_type: DownloadType::default(),
            remove_duplicates: default_remove_duplicates(),
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_remove_duplicates() -> bool {
    true
}

impl ProcessingConfig {
    pub fn options(&self) -> ProcessOptions {
        ProcessOptions {
            remove_duplicates: self.remove_duplicates,
            download_type: self.download_type,
            chunk_size: self.chunk_size,
        }
    }
}

impl Config {
    /// Built-in defaults, used when no config file is present.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Loads `path` when it exists, otherwise falls back to [`Config::minimal`].
pub fn load_config_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::info!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.server.max_upload_bytes == 0 {
        anyhow::bail!("server.max_upload_bytes must be > 0");
    }

    if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&config.processing.chunk_size) {
        anyhow::bail!(
            "processing.chunk_size must be in [{}, {}]",
            MIN_CHUNK_SIZE,
            MAX_CHUNK_SIZE
        );
    }

    for origin in &config.cors.allowed_origins {
        if origin == "*" {
            anyhow::bail!("cors.allowed_origins must list explicit origins; leave it empty to allow any");
        }
        HeaderValue::from_str(origin)
            .with_context(|| format!("Invalid CORS origin: '{}'", origin))?;
    }

    Ok(())
}
