use crate::models::ParamId;
use std::path::PathBuf;

/// Errors raised while parsing parameters or loading engine settings.
///
/// None of these can occur on the audio thread; the real-time path degrades
/// to safe values instead of failing.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Unknown parameter '{0}'")]
    UnknownParameter(String),

    #[error("Value {value} for '{id}' is outside [{min}, {max}]")]
    OutOfRange {
        id: ParamId,
        value: f32,
        min: f32,
        max: f32,
    },

    #[error("Value for '{id}' is not a finite number")]
    NotFinite { id: ParamId },

    #[error("Invalid settings: {0}")]
    Invalid(String),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not determine the user configuration directory")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
