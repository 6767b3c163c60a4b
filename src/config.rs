//! Configuration management
//!
//! Manages snapshot sources, direct-view URL schemes, the learning-progress
//! service connection and the HTTP listener.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Catalog snapshot settings
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Direct-view URL schemes
    #[serde(default)]
    pub urls: ViewUrlConfig,
    /// Learning-progress service settings
    #[serde(default)]
    pub progress: ProgressConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON file holding the catalog snapshot
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    /// Classify every item by business rule when a snapshot is ingested
    #[serde(default = "default_true")]
    pub classify_on_ingest: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            snapshot_path: None,
            classify_on_ingest: true,
        }
    }
}

/// URL templates for Direct View items; `{id}` is replaced by the item id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewUrlConfig {
    #[serde(default = "default_video_url")]
    pub video: String,
    #[serde(default = "default_webpage_url")]
    pub webpage: String,
    #[serde(default = "default_document_url")]
    pub document: String,
    #[serde(default = "default_generic_url")]
    pub generic: String,
}

fn default_video_url() -> String {
    "https://video-player.example.com/{id}".to_string()
}

fn default_webpage_url() -> String {
    "https://web-viewer.example.com/{id}".to_string()
}

fn default_document_url() -> String {
    "https://document-viewer.example.com/{id}".to_string()
}

fn default_generic_url() -> String {
    "https://content.example.com/view/{id}".to_string()
}

impl Default for ViewUrlConfig {
    fn default() -> Self {
        Self {
            video: default_video_url(),
            webpage: default_webpage_url(),
            document: default_document_url(),
            generic: default_generic_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Base URL of the learning-progress service; when unset the in-memory provider is used
    #[serde(default)]
    pub base_url: Option<String>,
    /// JSON file seeding the in-memory provider (map of user id to learning items)
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    /// Upper bound for a single collaborator call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            snapshot_path: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8787
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, writing defaults on first run
    pub fn load() -> Result<Self> {
        let config_path = config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "catalog-engine", "catalog-engine")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Show the effective configuration
pub fn show_config(config: &Config) {
    println!("Catalog Engine Configuration");
    println!("  catalog.snapshot_path:      {}", display_path(config.catalog.snapshot_path.as_deref()));
    println!("  catalog.classify_on_ingest: {}", config.catalog.classify_on_ingest);
    println!("  urls.video:                 {}", config.urls.video);
    println!("  urls.webpage:               {}", config.urls.webpage);
    println!("  urls.document:              {}", config.urls.document);
    println!("  urls.generic:               {}", config.urls.generic);
    println!("  progress.base_url:          {}", config.progress.base_url.as_deref().unwrap_or("(in-memory)"));
    println!("  progress.snapshot_path:     {}", display_path(config.progress.snapshot_path.as_deref()));
    println!("  progress.timeout_secs:      {}", config.progress.timeout_secs);
    println!("  server:                     {}:{}", config.server.host, config.server.port);
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "(none)".to_string())
}

/// Get default configuration as TOML string
pub fn default_config_toml() -> String {
    let config = Config::default();
    toml::to_string_pretty(&config).unwrap_or_else(|_| "# Default configuration\n".to_string())
}
