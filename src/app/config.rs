use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{
    DEFAULT_BACKEND_URL, DEFAULT_IMAGE_PROMPT, DEFAULT_MAX_HISTORY, ENV_PREFIX,
    HTTP_REQUEST_TIMEOUT_SECS, LOCAL_CONFIG_PATH,
};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Remote backend settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Chat session settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Where the conversation and vision endpoints live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL; endpoint paths are appended to it
    pub base_url: String,
    /// Transport timeout for a single request
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout_secs: HTTP_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl BackendConfig {
    /// Base URL without trailing slashes, so joined paths never double up
    pub fn normalized_base_url(&self) -> String {
        self.base_url.trim().trim_end_matches('/').to_string()
    }
}

/// Chat session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Transcript cap, oldest turns are dropped past it
    pub max_history: usize,
    /// Prompt sent with an image when the user typed nothing
    pub default_image_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            max_history: DEFAULT_MAX_HISTORY,
            default_image_prompt: DEFAULT_IMAGE_PROMPT.to_string(),
        }
    }
}

/// Defaults merged with every TOML file that exists, later files winning
pub fn layered_figment(files: &[PathBuf]) -> Figment {
    files
        .iter()
        .filter(|path| path.exists())
        .fold(Figment::from(Serialized::defaults(Config::default())), |figment, path| {
            figment.merge(Toml::file(path))
        })
}

/// Load configuration from multiple sources
///
/// Order: defaults, global config, `.paclead/config.toml`, `explicit`, then
/// `PACLEAD_` environment variables (`PACLEAD_BACKEND__BASE_URL=...`).
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut files = Vec::new();
    if let Ok(config_dir) = get_config_dir() {
        files.push(config_dir.join("config.toml"));
    }
    files.push(PathBuf::from(LOCAL_CONFIG_PATH));
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        files.push(path.to_path_buf());
    }

    layered_figment(&files)
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .context("Failed to load configuration")
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "paclead") {
        Ok(proj_dirs.config_dir().to_path_buf())
    } else {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Could not determine home directory")?;
        Ok(PathBuf::from(home).join(".config").join("paclead"))
    }
}

/// Save configuration to file
pub fn save_config(config: &Config, path: Option<PathBuf>) -> Result<PathBuf> {
    let path = match path {
        Some(p) => p,
        None => get_config_dir()?.join("config.toml"),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let toml_string = toml::to_string_pretty(config)?;
    std::fs::write(&path, toml_string)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(path)
}

/// Create a default configuration file if it doesn't exist
pub fn init_config() -> Result<Option<PathBuf>> {
    let config_file = get_config_dir()?.join("config.toml");
    if config_file.exists() {
        return Ok(None);
    }
    save_config(&Config::default(), Some(config_file)).map(Some)
}
