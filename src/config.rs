// =============================================================================
// CONFIGURATION - Load settings from config.toml
// =============================================================================
//
// Every field has a default, so a missing file or a missing section is fine.
// A file that fails to parse is replaced by the defaults; the failure is
// handed back so it can be logged once logging is up.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use crate::backend::FrameSettings;

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub frame: FrameConfig,
    pub shaders: ShaderConfig,
    pub debug: DebugConfig,
}

/// Window settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Quad Renderer".to_string(),
            width: 640,
            height: 480,
            fullscreen: false,
        }
    }
}

/// Frame loop timeouts
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub fence_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            fence_timeout_ms: 1000,
            acquire_timeout_ms: 1000,
        }
    }
}

impl FrameConfig {
    pub fn settings(&self) -> FrameSettings {
        FrameSettings {
            fence_timeout_ns: self.fence_timeout_ms.saturating_mul(1_000_000),
            acquire_timeout_ns: self.acquire_timeout_ms.saturating_mul(1_000_000),
        }
    }
}

/// Compiled SPIR-V locations, relative to the working directory
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            vertex: PathBuf::from("shaders/shader.vert.spv"),
            fragment: PathBuf::from("shaders/shader.frag.spv"),
        }
    }
}

/// Debug settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Only honoured in debug builds
    pub validation_layers: bool,
    pub log_level: String,
    pub show_fps: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            validation_layers: true,
            log_level: "info".to_string(),
            show_fps: true,
        }
    }
}

impl DebugConfig {
    /// Parsed `log_level`, `Info` when unrecognised
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

const CONFIG_PATH: &str = "config.toml";

/// How `load` arrived at its config.
///
/// Loading happens before the logger exists, so the outcome is carried back
/// to `main` and logged there.
#[derive(Debug)]
pub enum LoadStatus {
    Loaded(PathBuf),
    NotFound(PathBuf),
    Invalid(anyhow::Error),
}

impl LoadStatus {
    pub fn log(&self) {
        match self {
            LoadStatus::Loaded(path) => log::info!("Loaded configuration from {:?}", path),
            LoadStatus::NotFound(path) => {
                log::info!("Config file not found at {:?}, using defaults", path)
            }
            LoadStatus::Invalid(e) => log::warn!("{:#}. Using defaults.", e),
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to defaults
    pub fn load() -> (Self, LoadStatus) {
        Self::load_from_path(CONFIG_PATH)
    }

    /// Load configuration from a specific path, falling back to defaults
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> (Self, LoadStatus) {
        let path = path.as_ref();
        match Self::read(path) {
            Ok(Some(config)) => (config, LoadStatus::Loaded(path.to_path_buf())),
            Ok(None) => (Config::default(), LoadStatus::NotFound(path.to_path_buf())),
            Err(e) => (Config::default(), LoadStatus::Invalid(e)),
        }
    }

    /// `None` when the file does not exist
    fn read(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(Some(config))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
