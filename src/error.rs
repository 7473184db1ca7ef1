//! Error types for settings resolution.

use std::path::PathBuf;
use thiserror::Error;

/// Hint shown when no user settings file can be found.
pub const MISSING_SETTINGS_HINT: &str =
    "Create a settings.ini file from a example.settings.ini template";

/// Fatal errors raised while resolving settings.
///
/// Anything recoverable (a malformed override file, an undefined
/// environment variable) is logged and reported as a diagnostic instead.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// A required settings source does not exist.
    #[error("missing settings file: {}", .path.display())]
    MissingConfig { path: PathBuf, hint: Option<String> },

    /// A required settings source exists but cannot be used.
    #[error("malformed settings file {}: {reason}", .path.display())]
    MalformedConfig { path: PathBuf, reason: String },
}

impl SettingsError {
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self::MissingConfig {
            path: path.into(),
            hint: None,
        }
    }

    pub fn missing_with_hint(path: impl Into<PathBuf>, hint: impl Into<String>) -> Self {
        Self::MissingConfig {
            path: path.into(),
            hint: Some(hint.into()),
        }
    }

    pub fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::MalformedConfig {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Short heading for operator-facing reports.
    pub fn title(&self) -> &'static str {
        match self {
            SettingsError::MissingConfig { .. } => "missing settings file",
            SettingsError::MalformedConfig { .. } => "settings file error",
        }
    }

    /// Operator-facing explanation, including the remediation hint if any.
    pub fn message(&self) -> String {
        match self {
            SettingsError::MissingConfig {
                hint: Some(hint), ..
            } => hint.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for settings operations.
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;
