use crate::error::{ConfigError, Result};
use crate::models::{ControlParams, ParamId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Run configuration for a compressor session
///
/// Stores the stream format the engine is prepared with and the initial
/// control parameters. Loaded from TOML:
///
/// ```toml
/// sample_rate = 48000
/// max_block_size = 512
/// channels = 2
///
/// [params]
/// threshold_db = -24.0
/// ratio = 4.0
/// attack_ms = 10.0
/// release_ms = 100.0
/// makeup_db = 0.0
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub sample_rate: u32,
    pub max_block_size: usize,
    pub channels: u16,
    pub params: ControlParams,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            max_block_size: 512,
            channels: 2,
            params: ControlParams::default(),
        }
    }
}

impl EngineSettings {
    /// Create settings for a specific stream format with default parameters
    pub fn new(sample_rate: u32, max_block_size: usize, channels: u16) -> Self {
        Self {
            sample_rate,
            max_block_size,
            channels,
            params: ControlParams::default(),
        }
    }

    /// Parse settings from a TOML document and normalize them
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut settings: EngineSettings = toml::from_str(content)?;
        settings.normalize()?;
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Write settings to a file, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let content = self.to_toml_string()?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    /// Platform config location, e.g. `~/.config/dynacomp/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("dynacomp").join("config.toml"))
    }

    /// Reject an unusable stream format and clamp parameters into range.
    ///
    /// Out-of-range parameters are clamped with a warning rather than
    /// rejected, matching how the parameter store treats host writes.
    pub fn normalize(&mut self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be > 0".into()));
        }
        if self.max_block_size == 0 {
            return Err(ConfigError::Invalid("max_block_size must be > 0".into()));
        }
        if self.channels == 0 {
            return Err(ConfigError::Invalid("channels must be > 0".into()));
        }

        let clamped = self.params.clamped();
        for id in ParamId::ALL {
            let (before, after) = (self.params.get(id), clamped.get(id));
            if before != after {
                tracing::warn!("Config value {} = {} clamped to {}", id, before, after);
            }
        }
        self.params = clamped;
        Ok(())
    }
}
