use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::paths::default_config_file_path;

const LOCAL_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub plex: PlexConfig,
    pub playlist: PlaylistConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlexConfig {
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
    pub tv_library: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistConfig {
    pub name: String,
    pub collections: Collections,
    pub max_duration: u32,
    pub max_episode_length: u32,
    #[serde(default = "PlaylistConfig::default_min_episode_length")]
    pub min_episode_length: u32,
    #[serde(default = "PlaylistConfig::default_enabled")]
    pub include_live_action: bool,
    #[serde(default = "PlaylistConfig::default_enabled")]
    pub shuffle_order: bool,
    #[serde(default)]
    pub exclude_titles: Vec<String>,
}

impl PlaylistConfig {
    const fn default_min_episode_length() -> u32 {
        10
    }

    const fn default_enabled() -> bool {
        true
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Collections {
    pub cartoons: String,
    pub live_action: String,
}

/// `--config` if given, else `./config.yaml` when present, else the user config directory.
pub fn resolve_config_path(config_override: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = config_override {
        return Ok(path.to_path_buf());
    }
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Ok(local);
    }
    default_config_file_path()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    parse_config(&raw).with_context(|| format!("invalid config at {}", path.display()))
}

pub fn parse_config(raw: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(raw).context("failed to parse config yaml")?;
    if config.plex.url.trim().is_empty() {
        bail!("plex.url must not be empty");
    }
    if config.plex.tv_library.trim().is_empty() {
        bail!("plex.tv_library must not be empty");
    }
    if config.playlist.name.trim().is_empty() {
        bail!("playlist.name must not be empty");
    }
    Ok(config)
}
