//! Error types for auto-typer.
//!
//! The session distinguishes three failure families: keystroke injection,
//! focus queries and user input. Everything else the crate can fail on is
//! folded into [`TyperError`].

use std::io;
use thiserror::Error;

/// The keystroke backend failed to start or to emit a key.
#[derive(Error, Debug)]
pub enum InjectionError {
    /// The input backend could not be created.
    #[error("keyboard backend unavailable: {0}")]
    Backend(String),

    /// A single character could not be typed.
    #[error("failed to type {ch:?}: {reason}")]
    Char { ch: char, reason: String },

    /// A hotkey combination could not be sent.
    #[error("failed to send hotkey '{combo}': {reason}")]
    Hotkey { combo: String, reason: String },
}

impl InjectionError {
    pub fn backend(reason: impl Into<String>) -> Self {
        Self::Backend(reason.into())
    }

    pub fn char(ch: char, reason: impl Into<String>) -> Self {
        Self::Char {
            ch,
            reason: reason.into(),
        }
    }

    pub fn hotkey(combo: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Hotkey {
            combo: combo.into(),
            reason: reason.into(),
        }
    }
}

/// The foreground window could not be determined.
#[derive(Error, Debug)]
#[error("focus query failed: {0}")]
pub struct FocusQueryError(pub String);

impl FocusQueryError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// Problems with what the user asked for. Reported, never fatal.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum UserInputError {
    #[error("there is nothing to type")]
    EmptyContent,

    #[error("typing delay must be greater than zero")]
    InvalidDelay,

    #[error("'{path}' is not valid UTF-8 text")]
    InvalidEncoding { path: String },

    #[error("the clipboard does not contain any text")]
    EmptyClipboard,
}

/// Main error type for auto-typer operations.
#[derive(Error, Debug)]
pub enum TyperError {
    #[error(transparent)]
    Injection(#[from] InjectionError),

    #[error(transparent)]
    FocusQuery(#[from] FocusQueryError),

    #[error(transparent)]
    UserInput(#[from] UserInputError),

    /// A session is already arming or running.
    #[error("a typing session is already running")]
    SessionActive,

    /// Error parsing a key combination.
    #[error("invalid key combination '{combo}': {reason}")]
    InvalidKeyCombination { combo: String, reason: String },

    /// Configuration validation error.
    #[error("configuration error: {0}")]
    ConfigValidation(String),

    /// Error reading or parsing configuration file.
    #[error("failed to load config from '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    /// Error writing configuration file.
    #[error("failed to save config to '{path}': {reason}")]
    ConfigSave { path: String, reason: String },

    /// Error parsing duration string.
    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("clipboard error: {0}")]
    Clipboard(String),

    /// Error registering or handling the cancel hotkey.
    #[error("hotkey error: {0}")]
    Hotkey(String),

    /// The session worker panicked or was aborted.
    #[error("session worker failed: {0}")]
    Worker(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for auto-typer operations.
pub type Result<T> = std::result::Result<T, TyperError>;

impl TyperError {
    pub fn invalid_key_combination(combo: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKeyCombination {
            combo: combo.into(),
            reason: reason.into(),
        }
    }

    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation(message.into())
    }

    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn config_save(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigSave {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_duration(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn clipboard(message: impl Into<String>) -> Self {
        Self::Clipboard(message.into())
    }

    pub fn hotkey(message: impl Into<String>) -> Self {
        Self::Hotkey(message.into())
    }

    /// True for errors the host should show as a warning instead of failing.
    pub fn is_user_error(&self) -> bool {
        matches!(self, Self::UserInput(_) | Self::SessionActive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = InjectionError::char('x', "no display");
        assert_eq!(err.to_string(), "failed to type 'x': no display");

        let err = TyperError::from(UserInputError::EmptyClipboard);
        assert_eq!(err.to_string(), "the clipboard does not contain any text");

        let err = TyperError::config_validation("delay must be positive");
        assert_eq!(
            err.to_string(),
            "configuration error: delay must be positive"
        );

        let err = TyperError::invalid_key_combination("ctrl+", "no key");
        assert_eq!(err.to_string(), "invalid key combination 'ctrl+': no key");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: TyperError = io_err.into();
        assert!(matches!(err, TyperError::Io(_)));
    }

    #[test]
    fn test_user_errors_are_flagged() {
        assert!(TyperError::from(UserInputError::EmptyContent).is_user_error());
        assert!(TyperError::SessionActive.is_user_error());
        assert!(!TyperError::hotkey("taken").is_user_error());
    }
}
