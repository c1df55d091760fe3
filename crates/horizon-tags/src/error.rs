//! Error types for the tag input component.

use crate::config::OptionKind;

/// Result type alias for component operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while wiring up a tag input.
///
/// Rejected tags and denied vetoes are not errors; they are reported through
/// [`AddOutcome`](crate::AddOutcome) and bus events.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised by option specs and option records.
///
/// Invalid attribute values never produce these; they fall back to defaults.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An option spec's default does not match its declared kind.
    #[error("Default for option '{name}' is a {found}, but the option is declared as {expected}")]
    DefaultKindMismatch {
        name: String,
        expected: OptionKind,
        found: OptionKind,
    },

    /// Two option specs share a name.
    #[error("Option '{name}' is declared more than once")]
    DuplicateOption { name: String },

    /// An option record was asked for an option it does not hold.
    #[error("Unknown option '{name}'")]
    UnknownOption { name: String },

    /// An option was read as the wrong kind.
    #[error("Option '{name}' is a {found}, not a {expected}")]
    TypeMismatch {
        name: String,
        expected: OptionKind,
        found: OptionKind,
    },
}

impl ConfigError {
    /// Create an unknown option error.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::UnknownOption { name: name.into() }
    }
}

/// A suggestion source failed to produce results.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Suggestion source failed: {message}")]
pub struct LoadError {
    message: String,
}

impl LoadError {
    /// Create a load error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// An asynchronous veto check failed. Treated as a denial.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Veto check failed: {message}")]
pub struct VetoError {
    message: String,
}

impl VetoError {
    /// Create a veto error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// An event name that the tag input bus does not carry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown event name '{0}'")]
pub struct UnknownEventName(pub String);
