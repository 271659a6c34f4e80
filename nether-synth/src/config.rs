//! Engine configuration (config.toml)
//!
//! Settings are stored in TOML format in the platform-specific config
//! directory. Every field has a default so partial files load cleanly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::MIX_SAMPLES;
use crate::error::ConfigError;

/// Smallest accepted block, in frames
const MIN_BLOCK_FRAMES: usize = 8;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    /// Device output settings
    #[serde(default)]
    pub output: OutputConfig,
    /// Mixing settings
    #[serde(default)]
    pub mix: MixConfig,
}

/// Audio device output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Open a host audio device at init (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Stereo frames per mix block (default: 1024, power of two)
    #[serde(default = "default_block_frames")]
    pub block_frames: usize,
}

/// Mixer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixConfig {
    /// Initial master volume (default: 1.0)
    #[serde(default = "default_volume")]
    pub master_volume: f32,
    /// Enable the synth crackle effect (default: true)
    #[serde(default = "default_true")]
    pub crackle: bool,
    /// Fixed RNG seed for noise and crackle. Random when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_true() -> bool {
    true
}
fn default_block_frames() -> usize {
    MIX_SAMPLES
}
fn default_volume() -> f32 {
    1.0
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            block_frames: default_block_frames(),
        }
    }
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            master_volume: default_volume(),
            crackle: default_true(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Check values serde can't
    pub fn validate(&self) -> Result<(), ConfigError> {
        let frames = self.output.block_frames;
        if frames < MIN_BLOCK_FRAMES || !frames.is_power_of_two() {
            return Err(ConfigError::InvalidBlockSize(frames));
        }
        let volume = self.mix.master_volume;
        if !volume.is_finite() || volume < 0.0 {
            return Err(ConfigError::InvalidMasterVolume(volume));
        }
        Ok(())
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\NetherSynth\config`
/// On macOS: `~/Library/Application Support/io.nethercore.NetherSynth`
/// On Linux: `~/.config/NetherSynth`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io.nethercore", "", "NetherSynth")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from the platform config directory.
///
/// Returns defaults if the file doesn't exist. A file that fails to parse or
/// validate is reported and replaced by defaults.
pub fn load() -> EngineConfig {
    let Some(path) = config_dir().map(|dir| dir.join("config.toml")) else {
        return EngineConfig::default();
    };
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return EngineConfig::default();
    }
    match load_from(&path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring config {}: {}", path.display(), e);
            EngineConfig::default()
        }
    }
}

/// Loads and validates a configuration file.
pub fn load_from(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: EngineConfig = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Writes a configuration file, creating parent directories as needed.
pub fn save_to(config: &EngineConfig, path: impl AsRef<Path>) -> Result<(), ConfigError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
