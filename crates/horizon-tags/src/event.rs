//! Events carried on a tag input's bus.

use std::fmt;
use std::str::FromStr;

use horizon_tags_core::{BusEvent, EventBus};

use crate::config::OptionValue;
use crate::error::UnknownEventName;
use crate::keys::{KeyEvent, PasteEvent};
use crate::tag::Tag;

/// The bus type used by tag inputs.
pub type Bus = EventBus<Event>;

/// Every event published on a tag input's bus.
#[derive(Debug, Clone)]
pub enum Event {
    /// A tag was appended to the list.
    TagAdded { tag: Tag },
    /// A tag was removed from the list.
    TagRemoved { tag: Tag },
    /// A non-empty candidate failed validation or was vetoed.
    InvalidTag { tag: Tag },
    /// A tag was moved within the list.
    TagDragged { tag: Tag, from: usize, to: usize },
    /// The host reported a click on a tag.
    TagClicked { tag: Tag, index: usize },
    /// The input text changed.
    InputChange { text: String },
    InputFocus,
    InputBlur,
    InputKeydown(KeyEvent),
    InputPaste(PasteEvent),
    /// The suggestion cursor moved.
    SuggestionSelected { index: usize },
    /// A suggestion source failed; the list was reset.
    SuggestionsFailed { query: String, message: String },
    /// An observed option was re-resolved.
    OptionChange {
        namespace: String,
        name: String,
        value: OptionValue,
    },
}

/// Names that handlers subscribe under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventName {
    TagAdded,
    TagRemoved,
    InvalidTag,
    TagDragged,
    TagClicked,
    InputChange,
    InputFocus,
    InputBlur,
    InputKeydown,
    InputPaste,
    SuggestionSelected,
    SuggestionsFailed,
    OptionChange,
}

impl EventName {
    /// All event names.
    pub const ALL: [EventName; 13] = [
        Self::TagAdded,
        Self::TagRemoved,
        Self::InvalidTag,
        Self::TagDragged,
        Self::TagClicked,
        Self::InputChange,
        Self::InputFocus,
        Self::InputBlur,
        Self::InputKeydown,
        Self::InputPaste,
        Self::SuggestionSelected,
        Self::SuggestionsFailed,
        Self::OptionChange,
    ];

    /// The kebab-case name used in subscription strings.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TagAdded => "tag-added",
            Self::TagRemoved => "tag-removed",
            Self::InvalidTag => "invalid-tag",
            Self::TagDragged => "tag-dragged",
            Self::TagClicked => "tag-clicked",
            Self::InputChange => "input-change",
            Self::InputFocus => "input-focus",
            Self::InputBlur => "input-blur",
            Self::InputKeydown => "input-keydown",
            Self::InputPaste => "input-paste",
            Self::SuggestionSelected => "suggestion-selected",
            Self::SuggestionsFailed => "suggestions-failed",
            Self::OptionChange => "option-change",
        }
    }
}

impl FromStr for EventName {
    type Err = UnknownEventName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownEventName(s.to_string()))
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BusEvent for Event {
    type Name = EventName;

    fn name(&self) -> EventName {
        match self {
            Self::TagAdded { .. } => EventName::TagAdded,
            Self::TagRemoved { .. } => EventName::TagRemoved,
            Self::InvalidTag { .. } => EventName::InvalidTag,
            Self::TagDragged { .. } => EventName::TagDragged,
            Self::TagClicked { .. } => EventName::TagClicked,
            Self::InputChange { .. } => EventName::InputChange,
            Self::InputFocus => EventName::InputFocus,
            Self::InputBlur => EventName::InputBlur,
            Self::InputKeydown(_) => EventName::InputKeydown,
            Self::InputPaste(_) => EventName::InputPaste,
            Self::SuggestionSelected { .. } => EventName::SuggestionSelected,
            Self::SuggestionsFailed { .. } => EventName::SuggestionsFailed,
            Self::OptionChange { .. } => EventName::OptionChange,
        }
    }
}

static_assertions::assert_impl_all!(Event: Send, Sync);
static_assertions::assert_impl_all!(Bus: Send, Sync);
