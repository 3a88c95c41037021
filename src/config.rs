//! Configuration for sproutcast.
//!
//! Configuration sources (highest priority first):
//! 1. `--config` CLI argument
//! 2. `SPROUTCAST_CONFIG` environment variable
//! 3. Default (`~/.sproutcast/config.yaml`)
//!
//! The file is YAML. Relative paths in it (database, video directory)
//! resolve against the config file's parent directory. Each component
//! receives only its own slice of the parsed file — there is no global
//! configuration object.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Raw config file schema (matches the YAML structure).
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// SQLite database path, relative to the config file.
    pub database: Option<String>,
    pub graph_api: GraphApiConfig,
    pub file_host: FileHostConfig,
    pub account: AccountConfig,
    #[serde(default)]
    pub pump: PumpConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub watering: WateringConfig,
}

/// Credentials and endpoints for the social graph API.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphApiConfig {
    pub access_token: String,
    /// Base path including trailing slash, e.g. `https://graph.example.com/`.
    pub base_path: String,
    /// API version segment, e.g. `v17.0`.
    pub version: String,
}

/// Credentials for the file hosting API.
#[derive(Debug, Clone, Deserialize)]
pub struct FileHostConfig {
    pub api_key: String,
    pub base_path: String,
}

/// The account posts are published to, plus its caption material.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub user_id: String,
    #[serde(default)]
    pub caption_lines: Vec<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

impl AccountConfig {
    /// Build the post caption: free-text lines joined by blank lines,
    /// followed by a blank-line-separated hashtag block.
    pub fn caption(&self) -> String {
        let mut caption = self.caption_lines.join("\n\n");
        if !self.hashtags.is_empty() {
            if !caption.is_empty() {
                caption.push_str("\n\n");
            }
            caption.push_str(&self.hashtags.join(" "));
        }
        caption
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PumpConfig {
    /// Helper command driving the pump GPIO, invoked with the amount in ml.
    pub command: String,
    pub timeout_secs: u64,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            command: "pump-cycle".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Capture command, invoked as `<command> <output.h264> <seconds>`.
    pub capture_command: String,
    /// mp4 converter, invoked as `<command> -add <in.h264> <out.mp4>`.
    pub convert_command: String,
    pub video_dir: String,
    pub duration_secs: u64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            capture_command: "raspivid".to_string(),
            convert_command: "MP4Box".to_string(),
            video_dir: "videos".to_string(),
            duration_secs: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WateringConfig {
    /// Amount used when there is no voting history.
    pub default_amount_ml: u32,
}

impl Default for WateringConfig {
    fn default() -> Self {
        Self {
            default_amount_ml: 25,
        }
    }
}

/// Resolved configuration with absolute paths.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub graph_api: GraphApiConfig,
    pub file_host: FileHostConfig,
    pub account: AccountConfig,
    pub pump: PumpConfig,
    pub camera: CameraConfig,
    pub watering: WateringConfig,
    pub config_file: PathBuf,
}

/// Default config file location (`~/.sproutcast/config.yaml`).
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to determine home directory")?;
    Ok(home.join(".sproutcast").join("config.yaml"))
}

/// Pick the config file path from the argument, the environment, or
/// the default location.
fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = std::env::var("SPROUTCAST_CONFIG") {
        return Ok(PathBuf::from(env_path));
    }
    default_config_path()
}

/// Resolve a path that may be relative to the config file's parent.
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

/// Load and resolve configuration.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let config_path = resolve_config_path(explicit)?;

    let content = std::fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let file: ConfigFile = serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

    let base_dir = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();

    let database_path = resolve_path(
        &base_dir,
        file.database.as_deref().unwrap_or("plant.db"),
    );

    let mut camera = file.camera;
    camera.video_dir = resolve_path(&base_dir, &camera.video_dir)
        .to_string_lossy()
        .into_owned();

    Ok(Config {
        database_path,
        graph_api: file.graph_api,
        file_host: file.file_host,
        account: file.account,
        pump: file.pump,
        camera,
        watering: file.watering,
        config_file: config_path,
    })
}
