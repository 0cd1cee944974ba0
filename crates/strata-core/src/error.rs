//! Error types and handling for overlay composition

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for composition operations
///
/// Structural errors carry the name of the layer that produced them, since
/// overlays are opaque named units to the caller.
#[derive(Debug, Error)]
pub enum StrataError {
    /// Fence pattern could not be compiled or has the wrong capture shape
    #[error("Malformed pattern in layer '{layer}': {message} (pattern: {pattern})")]
    MalformedPattern {
        layer: String,
        pattern: String,
        message: String,
    },

    /// Scope glob could not be compiled
    #[error("Invalid glob '{pattern}' in layer '{layer}': {message}")]
    InvalidGlob {
        layer: String,
        pattern: String,
        message: String,
    },

    /// Rule value is not a severity or a `[severity, ...options]` array
    #[error("Invalid setting for rule '{rule_id}' in layer '{layer}': {message}")]
    InvalidRuleSetting {
        layer: String,
        rule_id: String,
        message: String,
    },

    /// Configuration loading or decoding errors
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// File system I/O errors
    #[error("IO error for path '{path}': {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Pattern,
    Glob,
    Rule,
    Config,
    Io,
}

impl StrataError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StrataError::MalformedPattern { .. } => ErrorKind::Pattern,
            StrataError::InvalidGlob { .. } => ErrorKind::Glob,
            StrataError::InvalidRuleSetting { .. } => ErrorKind::Rule,
            StrataError::ConfigError { .. } => ErrorKind::Config,
            StrataError::IoError { .. } => ErrorKind::Io,
        }
    }

    /// Name of the layer that caused the failure, when known
    pub fn layer(&self) -> Option<&str> {
        match self {
            StrataError::MalformedPattern { layer, .. }
            | StrataError::InvalidGlob { layer, .. }
            | StrataError::InvalidRuleSetting { layer, .. } => Some(layer),
            _ => None,
        }
    }

    /// Create a malformed pattern error
    pub fn malformed_pattern(
        layer: impl Into<String>,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedPattern {
            layer: layer.into(),
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create an invalid glob error
    pub fn invalid_glob(
        layer: impl Into<String>,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidGlob {
            layer: layer.into(),
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create an invalid rule setting error
    pub fn invalid_rule_setting(
        layer: impl Into<String>,
        rule_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidRuleSetting {
            layer: layer.into(),
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }
}
