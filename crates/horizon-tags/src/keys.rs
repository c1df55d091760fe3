//! Keyboard and clipboard input as seen by the controllers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Keys the tag input reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Backspace,
    Tab,
    Enter,
    Escape,
    Space,
    Left,
    Up,
    Right,
    Down,
    Delete,
    Comma,
    /// Any other key, by DOM key code.
    Other(u32),
}

impl Key {
    /// Map a DOM `keyCode`.
    pub fn from_code(code: u32) -> Self {
        match code {
            8 => Self::Backspace,
            9 => Self::Tab,
            13 => Self::Enter,
            27 => Self::Escape,
            32 => Self::Space,
            37 => Self::Left,
            38 => Self::Up,
            39 => Self::Right,
            40 => Self::Down,
            46 => Self::Delete,
            188 => Self::Comma,
            other => Self::Other(other),
        }
    }

    /// The DOM `keyCode` for this key.
    pub fn code(self) -> u32 {
        match self {
            Self::Backspace => 8,
            Self::Tab => 9,
            Self::Enter => 13,
            Self::Escape => 27,
            Self::Space => 32,
            Self::Left => 37,
            Self::Up => 38,
            Self::Right => 39,
            Self::Down => 40,
            Self::Delete => 46,
            Self::Comma => 188,
            Self::Other(code) => code,
        }
    }
}

/// Modifier keys held during a key press.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Whether any modifier is held.
    pub fn any(self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Flag a handler sets to ask the input adapter to suppress the default action.
///
/// Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct DefaultAction(Arc<AtomicBool>);

impl DefaultAction {
    /// Suppress the default action.
    pub fn prevent(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether a handler suppressed the default action.
    pub fn is_prevented(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A key press in the tag input's text field.
#[derive(Debug, Clone)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
    pub default_action: DefaultAction,
}

impl KeyEvent {
    /// A key press without modifiers.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::default(),
            default_action: DefaultAction::default(),
        }
    }

    /// Set the held modifiers.
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Suppress the key's default action.
    pub fn prevent_default(&self) {
        self.default_action.prevent();
    }

    /// Whether a handler suppressed the default action.
    pub fn is_default_prevented(&self) -> bool {
        self.default_action.is_prevented()
    }
}

/// Text pasted into the tag input's text field.
#[derive(Debug, Clone)]
pub struct PasteEvent {
    pub text: String,
    pub default_action: DefaultAction,
}

impl PasteEvent {
    /// A paste of `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            default_action: DefaultAction::default(),
        }
    }

    /// Suppress the paste's default action.
    pub fn prevent_default(&self) {
        self.default_action.prevent();
    }

    /// Whether a handler suppressed the default action.
    pub fn is_default_prevented(&self) -> bool {
        self.default_action.is_prevented()
    }
}
