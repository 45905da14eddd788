use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DynamicMediaError {
    #[error("Unknown key '{key}' in {path} (line {line})")]
    UnknownKey {
        key: String,
        path: PathBuf,
        line: usize,
    },

    #[error("Unknown keys in plugin settings file")]
    UnknownKeys(Vec<DynamicMediaError>),

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] confique::Error),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Unknown {kind} handler '{name}', register it on the HandlerRegistry first")]
    UnknownHandler { name: String, kind: &'static str },

    #[error("Failed to render output: {0}")]
    Render(String),
}
