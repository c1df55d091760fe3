//! Horizon Tags - a tag input component for Rust applications.
//!
//! This crate holds the rendering-independent logic of a tags input with
//! autocomplete: which text becomes a tag, when a tag is accepted or rejected,
//! how keyboard navigation moves through tags and suggestions, and how
//! asynchronous suggestion loads are debounced and raced. Rendering is left to
//! the host, which feeds input events in and re-draws from snapshots.
//!
//! The two state machines, [`TagList`] and [`SuggestionList`], never call each
//! other. They share a per-instance [`Bus`], and the [`TagsInput`] and
//! [`Autocomplete`] controllers subscribe them to it.
//!
//! # Example
//!
//! ```
//! use horizon_tags::{Autocomplete, Key, KeyEvent, TagsInput, TagsInputOptions, AutocompleteOptions};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let input = TagsInput::new(TagsInputOptions::default());
//! let autocomplete = Autocomplete::new(
//!     input.autocomplete_host(),
//!     AutocompleteOptions::default(),
//!     |query: &str| vec![json!(format!("{query}-suggested"))],
//! );
//!
//! input.add_text("rust").await;
//! input.set_text("tokio");
//! input.key_down(KeyEvent::new(Key::Enter));
//! # let _ = autocomplete;
//! # }
//! ```

pub mod autocomplete;
pub mod config;
mod error;
pub mod event;
pub mod keys;
pub mod options;
pub mod suggestion_list;
pub mod tag;
pub mod tag_list;
pub mod tags_input;
pub mod text;
pub mod veto;

pub use autocomplete::Autocomplete;
pub use config::{AttributeSource, ConfigRegistry, LoadedOptions, OptionKind, OptionSpec, OptionValue, OptionsRecord};
pub use error::{ConfigError, Error, LoadError, Result, UnknownEventName, VetoError};
pub use event::{Bus, Event, EventName};
pub use keys::{DefaultAction, Key, KeyEvent, Modifiers, PasteEvent};
pub use options::{AutocompleteOptions, TagsInputOptions, AUTOCOMPLETE_NAMESPACE, TAGS_INPUT_NAMESPACE};
pub use suggestion_list::{SourceResponse, SuggestionList, SuggestionPayload};
pub use tag::{Suggestion, Tag};
pub use tag_list::{AddOutcome, Rejection, TagList};
pub use tags_input::{AutocompleteHost, TagsInput, Validity};
pub use veto::{Permission, VetoGate, Vetoes};

pub use horizon_tags_core::{Dispatch, Flow, HandlerId, Placement};
