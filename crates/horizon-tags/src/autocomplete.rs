//! The autocomplete controller.
//!
//! An [`Autocomplete`] attaches a [`SuggestionList`] to a tags input. Its
//! handlers are prepended on the shared bus so that navigation keys are seen
//! before the tags input's own key handling; a key the suggestion list uses
//! halts the dispatch.

use std::sync::{Arc, Weak};

use horizon_tags_core::{runtime, Flow, Property};

use crate::config::{AttributeSource, ConfigRegistry, LoadedOptions};
use crate::error::Result;
use crate::event::{Event, EventName};
use crate::keys::Key;
use crate::options::{AutocompleteOptions, AUTOCOMPLETE_NAMESPACE};
use crate::suggestion_list::{SourceResponse, SuggestionList};
use crate::tag::Tag;
use crate::tag_list::AddOutcome;
use crate::tags_input::AutocompleteHost;
use crate::text::{encode_html, safe_highlight};

const HOTKEYS: [Key; 5] = [Key::Enter, Key::Tab, Key::Escape, Key::Up, Key::Down];

struct Inner {
    host: AutocompleteHost,
    suggestions: SuggestionList,
    options: Arc<Property<AutocompleteOptions>>,
    loaded: Option<LoadedOptions>,
}

impl Inner {
    fn should_load(&self, text: &str) -> bool {
        self.options.with(|options| {
            (text.is_empty() && options.load_on_empty)
                || (!text.is_empty() && text.chars().count() >= options.min_length)
        })
    }

    /// Take the selected suggestion and reset the list.
    fn take_selected(&self) -> Option<Tag> {
        let selected = self.suggestions.selected()?;
        self.suggestions.reset();
        Some(selected)
    }

    fn on_terminal(self: &Arc<Self>, _: &Event) -> Flow {
        self.suggestions.reset();
        Flow::Continue
    }

    fn on_input_change(self: &Arc<Self>, event: &Event) -> Flow {
        if let Event::InputChange { text } = event {
            if self.should_load(text) {
                self.suggestions.load(text, self.host.tags());
            } else {
                self.suggestions.reset();
            }
        }
        Flow::Continue
    }

    fn on_focus(self: &Arc<Self>, _: &Event) -> Flow {
        let text = self.host.current_text();
        let load_on_focus = self.options.with(|options| options.load_on_focus);
        if load_on_focus && self.should_load(&text) {
            self.suggestions.load(&text, self.host.tags());
        }
        Flow::Continue
    }

    fn on_key_down(self: &Arc<Self>, event: &Event) -> Flow {
        let Event::InputKeydown(key_event) = event else {
            return Flow::Continue;
        };
        let key = key_event.key;
        if key_event.modifiers.any() || !HOTKEYS.contains(&key) {
            return Flow::Continue;
        }

        let handled = if self.suggestions.is_visible() {
            match key {
                Key::Down => {
                    self.suggestions.select_next();
                    true
                }
                Key::Up => {
                    self.suggestions.select_prior();
                    true
                }
                Key::Escape => {
                    self.suggestions.reset();
                    true
                }
                Key::Enter | Key::Tab => match self.take_selected() {
                    Some(tag) => {
                        self.spawn_add(tag);
                        true
                    }
                    None => false,
                },
                _ => false,
            }
        } else if key == Key::Down && self.options.with(|options| options.load_on_down_arrow) {
            self.suggestions.load(&self.host.current_text(), self.host.tags());
            true
        } else {
            false
        };

        if handled {
            tracing::trace!(target: "horizon_tags::suggestions", ?key, "key handled by autocomplete");
            key_event.prevent_default();
            Flow::Halt
        } else {
            Flow::Continue
        }
    }

    fn on_option_change(self: &Arc<Self>, event: &Event) -> Flow {
        let (Event::OptionChange { namespace, name, .. }, Some(loaded)) = (event, &self.loaded) else {
            return Flow::Continue;
        };
        if namespace != AUTOCOMPLETE_NAMESPACE {
            return Flow::Continue;
        }
        match AutocompleteOptions::from_record(&loaded.record()) {
            Ok(options) => {
                tracing::debug!(target: "horizon_tags::suggestions", %name, "autocomplete options updated");
                self.options.set_silent(options);
            }
            Err(err) => {
                tracing::warn!(target: "horizon_tags::suggestions", %name, %err, "cannot apply option change");
            }
        }
        Flow::Continue
    }

    fn spawn_add(&self, tag: Tag) {
        let host = self.host.clone();
        let spawned = runtime::spawn(async move {
            host.add_tag(tag).await;
        });
        if let Err(err) = spawned {
            tracing::warn!(target: "horizon_tags::suggestions", %err, "cannot add suggestion without a runtime");
        }
    }
}

fn subscribe(
    host: &AutocompleteHost,
    weak: &Weak<Inner>,
    names: &[EventName],
    handler: fn(&Arc<Inner>, &Event) -> Flow,
) {
    let weak = weak.clone();
    host.on(names, move |event: &Event| {
        weak.upgrade()
            .map_or(Flow::Continue, |inner| handler(&inner, event))
    });
}

/// Autocomplete for a tags input.
///
/// Cloning yields another handle to the same autocomplete. Bus handlers only
/// hold weak references, so keep a handle alive for as long as suggestions
/// should be offered.
#[derive(Clone)]
pub struct Autocomplete {
    inner: Arc<Inner>,
}

impl Autocomplete {
    /// Attach to `host`, loading suggestions from `source`.
    pub fn new<F, R>(host: AutocompleteHost, options: AutocompleteOptions, source: F) -> Self
    where
        F: Fn(&str) -> R + Send + Sync + 'static,
        R: Into<SourceResponse>,
    {
        Self::build(host, options, source, None)
    }

    /// Attach to `host` with options read from `attributes`.
    pub fn from_config<F, R>(
        host: AutocompleteHost,
        registry: &ConfigRegistry,
        attributes: &dyn AttributeSource,
        source: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> R + Send + Sync + 'static,
        R: Into<SourceResponse>,
    {
        let loaded = registry.load(
            AUTOCOMPLETE_NAMESPACE,
            attributes,
            host.bus().clone(),
            &AutocompleteOptions::specs(),
        )?;
        let options = AutocompleteOptions::from_record(&loaded.record())?;
        Ok(Self::build(host, options, source, Some(loaded)))
    }

    fn build<F, R>(
        host: AutocompleteHost,
        options: AutocompleteOptions,
        source: F,
        loaded: Option<LoadedOptions>,
    ) -> Self
    where
        F: Fn(&str) -> R + Send + Sync + 'static,
        R: Into<SourceResponse>,
    {
        let options = Arc::new(Property::new(options));
        let suggestions = SuggestionList::new(
            source,
            options.clone(),
            host.options(),
            host.bus().clone(),
        );
        let inner = Arc::new(Inner {
            host: host.clone(),
            suggestions,
            options,
            loaded,
        });

        let weak = Arc::downgrade(&inner);
        subscribe(
            &host,
            &weak,
            &[
                EventName::TagAdded,
                EventName::TagRemoved,
                EventName::InvalidTag,
                EventName::InputBlur,
            ],
            Inner::on_terminal,
        );
        subscribe(&host, &weak, &[EventName::InputChange], Inner::on_input_change);
        subscribe(&host, &weak, &[EventName::InputFocus], Inner::on_focus);
        subscribe(&host, &weak, &[EventName::InputKeydown], Inner::on_key_down);
        subscribe(&host, &weak, &[EventName::OptionChange], Inner::on_option_change);

        Self { inner }
    }

    /// The suggestion list.
    pub fn suggestions(&self) -> &SuggestionList {
        &self.inner.suggestions
    }

    /// A snapshot of the current options.
    pub fn options(&self) -> AutocompleteOptions {
        self.inner.options.get()
    }

    /// Replace the options.
    pub fn set_options(&self, options: AutocompleteOptions) {
        self.inner.options.set_silent(options);
    }

    /// Add the selected suggestion as a tag and reset the list.
    ///
    /// Returns `None` if nothing was selected.
    pub async fn add_suggestion(&self) -> Option<AddOutcome> {
        let tag = self.inner.take_selected()?;
        Some(self.inner.host.add_tag(tag).await)
    }

    /// Select the suggestion at `index` and add it.
    pub async fn add_suggestion_by_index(&self, index: isize) -> Option<AddOutcome> {
        self.inner.suggestions.select(index);
        self.add_suggestion().await
    }

    /// The text shown for `suggestion`.
    pub fn display_text(&self, suggestion: &Tag) -> String {
        let own = self.inner.options.with(|options| options.display_property.clone());
        if own.is_empty() {
            let field = self
                .inner
                .host
                .options()
                .with(|options| options.display_property.clone());
            suggestion.text(&field)
        } else {
            suggestion.text(&own)
        }
    }

    /// Markup for `suggestion` with the current query emphasized.
    pub fn highlight(&self, suggestion: &Tag) -> String {
        let text = self.display_text(suggestion);
        if !self.inner.options.with(|options| options.highlight_matched_text) {
            return encode_html(&text);
        }
        let query = self.inner.suggestions.query().unwrap_or_default();
        safe_highlight(&text, &query)
    }
}

impl std::fmt::Debug for Autocomplete {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Autocomplete")
            .field("suggestions", &self.inner.suggestions)
            .finish()
    }
}
