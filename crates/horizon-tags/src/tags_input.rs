//! The tags input controller.
//!
//! [`TagsInput`] owns a [`TagList`] and the state of the text field, and wires
//! both to the widget's bus: keys, paste, focus and blur coming from the input
//! adapter become tag list operations, and tag list events update the text
//! field. Rendering is left to the host, which reads [`TagsInput::tags`],
//! [`TagsInput::text`] and [`TagsInput::validity`] after each event.

use std::sync::{Arc, Weak};

use horizon_tags_core::{runtime, HandlerId, Placement, Property};
use parking_lot::Mutex;
use serde_json::Value;

use crate::config::{AttributeSource, ConfigRegistry, LoadedOptions};
use crate::error::Result;
use crate::event::{Bus, Event, EventName};
use crate::keys::{Key, KeyEvent, PasteEvent};
use crate::options::{TagsInputOptions, TAGS_INPUT_NAMESPACE};
use crate::tag::{make_records, Tag};
use crate::tag_list::{AddOutcome, TagList};
use crate::veto::Vetoes;

const HOTKEYS: [Key; 7] = [
    Key::Enter,
    Key::Comma,
    Key::Space,
    Key::Backspace,
    Key::Delete,
    Key::Left,
    Key::Right,
];

/// Validation state a host form can reflect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validity {
    /// At most `max_tags` tags.
    pub max_tags: bool,
    /// At least `min_tags` tags.
    pub min_tags: bool,
    /// No text left in the field, unless focused or leftover text is allowed.
    pub leftover_text: bool,
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        self.max_tags && self.min_tags && self.leftover_text
    }
}

#[derive(Debug, Default)]
struct InputState {
    text: String,
    focused: bool,
    invalid: bool,
}

struct Inner {
    list: TagList,
    bus: Arc<Bus>,
    options: Arc<Property<TagsInputOptions>>,
    input: Mutex<InputState>,
    loaded: Option<LoadedOptions>,
}

impl Inner {
    fn current_text(&self) -> String {
        self.input.lock().text.clone()
    }

    fn set_text(&self, text: &str) {
        {
            let mut input = self.input.lock();
            if input.text == text {
                return;
            }
            input.text = text.to_string();
        }
        self.bus.trigger(Event::InputChange {
            text: text.to_string(),
        });
    }

    fn spawn_add(&self, texts: Vec<String>) {
        let list = self.list.clone();
        let spawned = runtime::spawn(async move {
            for text in texts {
                list.add_text(&text).await;
            }
        });
        if let Err(err) = spawned {
            tracing::warn!(target: "horizon_tags::input", %err, "cannot add tag without a runtime");
        }
    }

    fn spawn_remove(self: &Arc<Self>, index: usize, restore_text: bool) {
        let weak = Arc::downgrade(self);
        let list = self.list.clone();
        let display = self.options.with(|options| options.display_property.clone());
        let spawned = runtime::spawn(async move {
            let removed = list.remove(index).await;
            if let (true, Some(tag), Some(inner)) = (restore_text, removed, weak.upgrade()) {
                inner.set_text(&tag.text(&display));
            }
        });
        if let Err(err) = spawned {
            tracing::warn!(target: "horizon_tags::input", %err, "cannot remove tag without a runtime");
        }
    }

    fn on_tag_added(self: &Arc<Self>, _: &Event) {
        self.set_text("");
    }

    fn on_input_change(self: &Arc<Self>, _: &Event) {
        self.list.clear_selection();
        self.input.lock().invalid = false;
    }

    fn on_invalid_tag(self: &Arc<Self>, _: &Event) {
        self.input.lock().invalid = true;
    }

    fn on_focus(self: &Arc<Self>, _: &Event) {
        self.input.lock().focused = true;
    }

    fn on_blur(self: &Arc<Self>, _: &Event) {
        let text = {
            let mut input = self.input.lock();
            input.focused = false;
            input.text.clone()
        };
        let add_on_blur = self
            .options
            .with(|options| options.add_on_blur && !options.add_from_autocomplete_only);
        if add_on_blur {
            self.spawn_add(vec![text]);
        }
    }

    fn on_key_down(self: &Arc<Self>, event: &Event) {
        let Event::InputKeydown(key_event) = event else {
            return;
        };
        let key = key_event.key;
        if key_event.modifiers.any() || !HOTKEYS.contains(&key) {
            return;
        }

        let options = self.options.get();
        let text = self.current_text();
        let selected = self.list.selected_index();

        let add_key = match key {
            Key::Enter => options.add_on_enter,
            Key::Comma => options.add_on_comma,
            Key::Space => options.add_on_space,
            _ => false,
        };
        let should_add = !options.add_from_autocomplete_only && add_key;
        let should_edit_last =
            key == Key::Backspace && text.is_empty() && options.enable_editing_last_tag;
        let should_remove = matches!(key, Key::Backspace | Key::Delete) && selected.is_some();
        let should_select = matches!(key, Key::Backspace | Key::Left | Key::Right)
            && text.is_empty()
            && !options.enable_editing_last_tag;

        if should_add {
            self.spawn_add(vec![text]);
        } else if should_edit_last {
            self.list.select_prior();
            if let Some(index) = self.list.selected_index() {
                self.spawn_remove(index, true);
            }
        } else if let (true, Some(index)) = (should_remove, selected) {
            self.spawn_remove(index, false);
        } else if should_select {
            if key == Key::Right {
                self.list.select_next();
            } else {
                self.list.select_prior();
            }
        }

        if should_add || should_edit_last || should_remove || should_select {
            tracing::trace!(target: "horizon_tags::input", ?key, "key handled");
            key_event.prevent_default();
        }
    }

    fn on_paste(self: &Arc<Self>, event: &Event) {
        let Event::InputPaste(paste) = event else {
            return;
        };
        let (enabled, pattern) = self
            .options
            .with(|options| (options.add_on_paste, options.paste_split_pattern.clone()));
        if !enabled {
            return;
        }
        let pieces: Vec<String> = pattern.split(&paste.text).map(str::to_string).collect();
        if pieces.len() > 1 {
            tracing::debug!(target: "horizon_tags::input", count = pieces.len(), "adding pasted tags");
            self.spawn_add(pieces);
            paste.prevent_default();
        }
    }

    fn on_option_change(self: &Arc<Self>, event: &Event) {
        let (Event::OptionChange { namespace, name, .. }, Some(loaded)) = (event, &self.loaded) else {
            return;
        };
        if namespace != TAGS_INPUT_NAMESPACE {
            return;
        }
        match TagsInputOptions::from_record(&loaded.record()) {
            Ok(options) => {
                tracing::debug!(target: "horizon_tags::input", %name, "tags input options updated");
                self.options.set_silent(options);
            }
            Err(err) => {
                tracing::warn!(target: "horizon_tags::input", %name, %err, "cannot apply option change");
            }
        }
    }
}

fn subscribe(bus: &Bus, weak: &Weak<Inner>, names: &[EventName], handler: fn(&Arc<Inner>, &Event)) {
    let weak = weak.clone();
    bus.on_names(
        names,
        move |event: &Event| {
            if let Some(inner) = weak.upgrade() {
                handler(&inner, event);
            }
        },
        Placement::Append,
    );
}

/// A tags input widget, minus rendering.
///
/// Cloning yields another handle to the same widget. Bus handlers only hold
/// weak references, so they go quiet once every handle is dropped.
#[derive(Clone)]
pub struct TagsInput {
    inner: Arc<Inner>,
}

impl TagsInput {
    /// Create a tags input without vetoes.
    pub fn new(options: TagsInputOptions) -> Self {
        Self::with_vetoes(options, Vetoes::default())
    }

    /// Create a tags input consulting `vetoes` before each mutation.
    pub fn with_vetoes(options: TagsInputOptions, vetoes: Vetoes) -> Self {
        Self::build(options, vetoes, Arc::new(Bus::new()), None)
    }

    /// Create a tags input whose options are read from `source`.
    ///
    /// Options marked as interpolated in `registry` can be updated later
    /// through [`observe_option`](Self::observe_option).
    pub fn from_config(
        registry: &ConfigRegistry,
        source: &dyn AttributeSource,
        vetoes: Vetoes,
    ) -> Result<Self> {
        let bus = Arc::new(Bus::new());
        let loaded = registry.load(
            TAGS_INPUT_NAMESPACE,
            source,
            bus.clone(),
            &TagsInputOptions::specs(),
        )?;
        let options = TagsInputOptions::from_record(&loaded.record())?;
        Ok(Self::build(options, vetoes, bus, Some(loaded)))
    }

    fn build(
        options: TagsInputOptions,
        vetoes: Vetoes,
        bus: Arc<Bus>,
        loaded: Option<LoadedOptions>,
    ) -> Self {
        let options = Arc::new(Property::new(options));
        let inner = Arc::new(Inner {
            list: TagList::new(options.clone(), bus.clone(), vetoes),
            bus: bus.clone(),
            options,
            input: Mutex::new(InputState::default()),
            loaded,
        });

        let weak = Arc::downgrade(&inner);
        subscribe(&bus, &weak, &[EventName::TagAdded], Inner::on_tag_added);
        subscribe(&bus, &weak, &[EventName::InputChange], Inner::on_input_change);
        subscribe(&bus, &weak, &[EventName::InvalidTag], Inner::on_invalid_tag);
        subscribe(&bus, &weak, &[EventName::InputFocus], Inner::on_focus);
        subscribe(&bus, &weak, &[EventName::InputBlur], Inner::on_blur);
        subscribe(&bus, &weak, &[EventName::InputKeydown], Inner::on_key_down);
        subscribe(&bus, &weak, &[EventName::InputPaste], Inner::on_paste);
        subscribe(&bus, &weak, &[EventName::OptionChange], Inner::on_option_change);

        Self { inner }
    }

    /// The widget's bus.
    pub fn bus(&self) -> &Arc<Bus> {
        &self.inner.bus
    }

    /// The underlying tag list.
    pub fn tag_list(&self) -> &TagList {
        &self.inner.list
    }

    /// A snapshot of the current options.
    pub fn options(&self) -> TagsInputOptions {
        self.inner.options.get()
    }

    /// Replace the options.
    pub fn set_options(&self, options: TagsInputOptions) {
        self.inner.options.set_silent(options);
    }

    /// Feed a new attribute value for an interpolated option.
    ///
    /// Returns `false` if the widget was not built from configuration or the
    /// option is not observed.
    pub fn observe_option(&self, name: &str, raw: Option<&str>) -> bool {
        self.inner
            .loaded
            .as_ref()
            .is_some_and(|loaded| loaded.observe(name, raw))
    }

    /// A snapshot of the tags.
    pub fn tags(&self) -> Vec<Tag> {
        self.inner.list.items()
    }

    /// The text field's content.
    pub fn text(&self) -> String {
        self.inner.current_text()
    }

    /// Set the text field's content, publishing `input-change` if it changed.
    pub fn set_text(&self, text: &str) {
        self.inner.set_text(text);
    }

    pub fn is_focused(&self) -> bool {
        self.inner.input.lock().focused
    }

    /// Whether the last attempted tag was rejected and the text not edited since.
    pub fn is_invalid(&self) -> bool {
        self.inner.input.lock().invalid
    }

    /// Report that the text field gained focus.
    pub fn focus(&self) {
        if self.is_focused() {
            return;
        }
        self.inner.bus.trigger(Event::InputFocus);
    }

    /// Report that the text field lost focus.
    pub fn blur(&self) {
        if !self.is_focused() {
            return;
        }
        self.inner.bus.trigger(Event::InputBlur);
    }

    /// Report a key press. Returns whether a handler suppressed its default action.
    pub fn key_down(&self, event: KeyEvent) -> bool {
        let default_action = event.default_action.clone();
        self.inner.bus.trigger(Event::InputKeydown(event));
        default_action.is_prevented()
    }

    /// Report a paste. Returns whether a handler suppressed its default action.
    pub fn paste(&self, event: PasteEvent) -> bool {
        let default_action = event.default_action.clone();
        self.inner.bus.trigger(Event::InputPaste(event));
        default_action.is_prevented()
    }

    /// Report a click on the tag at `index`.
    pub fn click_tag(&self, index: usize) {
        if let Some(tag) = self.inner.list.get(index) {
            self.inner.bus.trigger(Event::TagClicked { tag, index });
        }
    }

    /// Add a tag built from `text`.
    pub async fn add_text(&self, text: &str) -> AddOutcome {
        self.inner.list.add_text(text).await
    }

    /// Add a tag record.
    pub async fn add_tag(&self, tag: Tag) -> AddOutcome {
        self.inner.list.add(tag).await
    }

    /// Remove the tag at `index`.
    pub async fn remove_tag(&self, index: usize) -> Option<Tag> {
        self.inner.list.remove(index).await
    }

    /// Current validity against the count and leftover text options.
    pub fn validity(&self) -> Validity {
        let len = self.inner.list.len();
        let input = self.inner.input.lock();
        self.inner.options.with(|options| Validity {
            max_tags: len <= options.max_tags,
            min_tags: len >= options.min_tags,
            leftover_text: input.focused || options.allow_leftover_text || input.text.is_empty(),
        })
    }

    /// The tags as the host model sees them.
    ///
    /// Plain strings with `use_strings`, records otherwise.
    pub fn model(&self) -> Value {
        let (use_strings, display) = self
            .inner
            .options
            .with(|options| (options.use_strings, options.display_property.clone()));
        let items = self.inner.list.items().into_iter();
        if use_strings {
            Value::Array(items.map(|tag| Value::String(tag.text(&display))).collect())
        } else {
            Value::Array(items.map(Tag::into_value).collect())
        }
    }

    /// Replace the tags from the host model.
    ///
    /// Strings become records keyed by the display property. Tags are not
    /// validated; duplicates are kept as given.
    pub fn set_model(&self, model: Value) {
        let display = self
            .inner
            .options
            .with(|options| options.display_property.clone());
        let values = match model {
            Value::Array(values) => values,
            Value::Null => Vec::new(),
            other => vec![other],
        };
        self.inner.list.replace_items(make_records(values, &display));
    }

    /// The handle an autocomplete attaches through.
    pub fn autocomplete_host(&self) -> AutocompleteHost {
        AutocompleteHost {
            input: self.clone(),
        }
    }
}

impl std::fmt::Debug for TagsInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TagsInput")
            .field("list", &self.inner.list)
            .field("input", &*self.inner.input.lock())
            .finish()
    }
}

/// What an autocomplete may do with the tags input it is attached to.
#[derive(Clone, Debug)]
pub struct AutocompleteHost {
    input: TagsInput,
}

impl AutocompleteHost {
    /// Add a tag through the tag list's usual validation and gates.
    pub async fn add_tag(&self, tag: Tag) -> AddOutcome {
        self.input.add_tag(tag).await
    }

    /// A snapshot of the current tags.
    pub fn tags(&self) -> Vec<Tag> {
        self.input.tags()
    }

    /// The text currently in the input.
    pub fn current_text(&self) -> String {
        self.input.text()
    }

    /// The tags input's shared options cell.
    pub fn options(&self) -> Arc<Property<TagsInputOptions>> {
        self.input.inner.options.clone()
    }

    /// The bus shared with the tags input.
    pub fn bus(&self) -> &Arc<Bus> {
        self.input.bus()
    }

    /// Subscribe ahead of every handler already registered for `names`.
    pub fn on<F, R>(&self, names: &[EventName], handler: F) -> HandlerId
    where
        F: Fn(&Event) -> R + Send + Sync + 'static,
        R: Into<horizon_tags_core::Flow>,
    {
        self.input.bus().on_names(names, handler, Placement::Prepend)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::keys::Modifiers;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    fn texts(input: &TagsInput) -> Vec<String> {
        input.tags().iter().map(|tag| tag.text("text")).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_adds_text_and_clears_field() {
        let input = TagsInput::new(TagsInputOptions::default());
        input.set_text("rust");

        assert!(input.key_down(KeyEvent::new(Key::Enter)));
        settle().await;

        assert_eq!(texts(&input), vec!["rust"]);
        assert_eq!(input.text(), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_keys_follow_options() {
        let input = TagsInput::new(TagsInputOptions::default());
        input.set_text("rust");

        assert!(!input.key_down(KeyEvent::new(Key::Space)));
        let with_shift = KeyEvent::new(Key::Enter).with_modifiers(Modifiers {
            shift: true,
            ..Modifiers::default()
        });
        assert!(!input.key_down(with_shift));
        settle().await;
        assert!(input.tags().is_empty());

        assert!(input.key_down(KeyEvent::new(Key::Comma)));
        settle().await;
        assert_eq!(texts(&input), vec!["rust"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_from_autocomplete_only_ignores_keys() {
        let input = TagsInput::new(TagsInputOptions::default().with_add_from_autocomplete_only(true));
        input.set_text("rust");

        assert!(!input.key_down(KeyEvent::new(Key::Enter)));
        input.focus();
        input.blur();
        settle().await;

        assert!(input.tags().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_flag_tracks_rejections() {
        let input = TagsInput::new(TagsInputOptions::default());
        input.set_text("ab");
        input.key_down(KeyEvent::new(Key::Enter));
        settle().await;

        assert!(input.is_invalid());
        assert_eq!(input.text(), "ab");

        input.set_text("abc");
        assert!(!input.is_invalid());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backspace_navigates_and_removes() {
        let input = TagsInput::new(TagsInputOptions::default());
        input.add_text("one").await;
        input.add_text("two").await;

        assert!(input.key_down(KeyEvent::new(Key::Backspace)));
        assert_eq!(input.tag_list().selected_index(), Some(1));

        assert!(input.key_down(KeyEvent::new(Key::Backspace)));
        settle().await;
        assert_eq!(texts(&input), vec!["one"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_arrows_move_selection_only_when_empty() {
        let input = TagsInput::new(TagsInputOptions::default());
        input.add_text("one").await;
        input.add_text("two").await;

        input.key_down(KeyEvent::new(Key::Left));
        assert_eq!(input.tag_list().selected_index(), Some(1));
        input.key_down(KeyEvent::new(Key::Right));
        assert_eq!(input.tag_list().selected_index(), Some(0));

        input.set_text("x");
        assert_eq!(input.tag_list().selected_index(), None);
        assert!(!input.key_down(KeyEvent::new(Key::Left)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_editing_last_tag() {
        let input = TagsInput::new(TagsInputOptions::default().with_enable_editing_last_tag(true));
        input.add_text("one").await;
        input.add_text("two").await;

        assert!(input.key_down(KeyEvent::new(Key::Backspace)));
        settle().await;

        assert_eq!(texts(&input), vec!["one"]);
        assert_eq!(input.text(), "two");
    }

    #[tokio::test(start_paused = true)]
    async fn test_blur_adds_leftover_text() {
        let input = TagsInput::new(TagsInputOptions::default());
        input.focus();
        input.set_text("leftover");
        assert!(input.validity().is_valid());

        input.blur();
        settle().await;

        assert_eq!(texts(&input), vec!["leftover"]);
        assert!(!input.is_focused());
    }

    #[tokio::test(start_paused = true)]
    async fn test_paste_splits_when_enabled() {
        let input = TagsInput::new(TagsInputOptions::default().with_add_on_paste(true));

        assert!(input.paste(PasteEvent::new("red,green,blue")));
        assert!(!input.paste(PasteEvent::new("single")));
        settle().await;

        assert_eq!(texts(&input), vec!["red", "green", "blue"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_validity() {
        let input = TagsInput::new(TagsInputOptions::default().with_min_tags(1).with_max_tags(1));
        assert!(!input.validity().min_tags);

        input.add_text("one").await;
        input.add_text("two").await;
        let validity = input.validity();
        assert!(validity.min_tags);
        assert!(!validity.max_tags);

        input.set_text("left");
        assert!(!input.validity().leftover_text);
    }

    #[test]
    fn test_model_sync() {
        let input = TagsInput::new(TagsInputOptions::default().with_use_strings(true));
        input.set_model(json!(["one", { "text": "two" }]));

        assert_eq!(input.model(), json!(["one", "two"]));

        input.set_options(TagsInputOptions::default());
        assert_eq!(input.model(), json!([{ "text": "one" }, { "text": "two" }]));

        input.set_model(Value::Null);
        assert_eq!(input.model(), json!([]));
    }

    #[test]
    fn test_click_tag() {
        let input = TagsInput::new(TagsInputOptions::default());
        input.set_model(json!(["one"]));
        let clicked = Arc::new(Mutex::new(Vec::new()));
        let clicked_clone = clicked.clone();
        input
            .bus()
            .on("tag-clicked", move |event: &Event| {
                if let Event::TagClicked { index, .. } = event {
                    clicked_clone.lock().push(*index);
                }
            })
            .unwrap();

        input.click_tag(0);
        input.click_tag(3);

        assert_eq!(*clicked.lock(), vec![0]);
    }
}
