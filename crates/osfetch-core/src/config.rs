use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::fetch::FetchOptions;
use crate::template::DEFAULT_DESTINATION_TEMPLATE;

/// Global configuration loaded from `~/.config/osfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OsFetchConfig {
    /// Template for the destination path of each artifact, relative to `output_dir`.
    #[serde(default = "default_template")]
    pub destination_template: String,
    /// Root directory for downloads (None = process working directory).
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Optional connect timeout in seconds (None = libcurl default, no explicit bound).
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    /// Optional whole-transfer timeout in seconds (None = unbounded).
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Maximum number of HTTP redirects followed per GET.
    #[serde(default = "default_max_redirections")]
    pub max_redirections: u32,
}

fn default_template() -> String {
    DEFAULT_DESTINATION_TEMPLATE.to_string()
}

fn default_max_redirections() -> u32 {
    10
}

impl Default for OsFetchConfig {
    fn default() -> Self {
        Self {
            destination_template: default_template(),
            output_dir: None,
            connect_timeout_secs: None,
            timeout_secs: None,
            max_redirections: default_max_redirections(),
        }
    }
}

impl OsFetchConfig {
    /// Transfer options for the fetcher derived from this config.
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            connect_timeout: self.connect_timeout_secs.map(Duration::from_secs),
            timeout: self.timeout_secs.map(Duration::from_secs),
            max_redirections: self.max_redirections,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("osfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<OsFetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = OsFetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: OsFetchConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
