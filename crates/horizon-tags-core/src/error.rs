//! Error types for Horizon Tags core.

use std::fmt;

/// Event bus errors.
///
/// These only arise from programmer misuse; dispatch itself never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// A subscription named an event the bus does not know about.
    UnknownEvent(String),
    /// A subscription string contained no event names.
    NoEventNames,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEvent(name) => write!(f, "Unknown event name '{name}'"),
            Self::NoEventNames => write!(f, "No event names given"),
        }
    }
}

impl std::error::Error for BusError {}
