//! Autocomplete candidates: debounced loading, stale-response suppression and
//! a wrapping cursor.
//!
//! [`SuggestionList::load`] is debounced: a burst of calls collapses into one
//! fetch with the arguments of the last call. Every fetch gets a token, and
//! only the fetch holding the current token may populate the list. Results of
//! superseded fetches are discarded whenever they complete, so ordering is by
//! issuance rather than completion. The underlying future is never aborted.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use horizon_tags_core::{runtime, Debouncer, Property};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::LoadError;
use crate::event::{Bus, Event};
use crate::options::{AutocompleteOptions, TagsInputOptions};
use crate::tag::{make_records, Suggestion, Tag};
use crate::text::find_in_records;

/// What a suggestion source returns: a bare array or an envelope around one.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SuggestionPayload {
    Array(Vec<Value>),
    Envelope { data: Vec<Value> },
}

impl SuggestionPayload {
    /// Interpret a JSON value as a payload.
    pub fn from_value(value: Value) -> Result<Self, LoadError> {
        serde_json::from_value(value).map_err(|err| LoadError::new(err.to_string()))
    }

    /// Unwrap to the raw entries.
    pub fn into_items(self) -> Vec<Value> {
        match self {
            Self::Array(items) | Self::Envelope { data: items } => items,
        }
    }
}

impl From<Vec<Value>> for SuggestionPayload {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

/// A source's answer for one query.
pub enum SourceResponse {
    /// Available now.
    Ready(Result<SuggestionPayload, LoadError>),
    /// Available once the future resolves.
    Pending(BoxFuture<'static, Result<SuggestionPayload, LoadError>>),
}

impl SourceResponse {
    /// Answer later with `future`.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<SuggestionPayload, LoadError>> + Send + 'static,
    {
        Self::Pending(future.boxed())
    }
}

impl From<SuggestionPayload> for SourceResponse {
    fn from(payload: SuggestionPayload) -> Self {
        Self::Ready(Ok(payload))
    }
}

impl From<Vec<Value>> for SourceResponse {
    fn from(items: Vec<Value>) -> Self {
        Self::Ready(Ok(SuggestionPayload::Array(items)))
    }
}

impl From<Result<SuggestionPayload, LoadError>> for SourceResponse {
    fn from(result: Result<SuggestionPayload, LoadError>) -> Self {
        Self::Ready(result)
    }
}

impl fmt::Debug for SourceResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Self::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

type Source = Arc<dyn Fn(&str) -> SourceResponse + Send + Sync>;

#[derive(Debug)]
struct State {
    items: Vec<Suggestion>,
    query: Option<String>,
    visible: bool,
    index: isize,
    selected: Option<Suggestion>,
    current_fetch: Option<u64>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            query: None,
            visible: false,
            index: -1,
            selected: None,
            current_fetch: None,
        }
    }
}

impl State {
    fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns the event to publish once the lock is released.
    fn select(&mut self, index: isize) -> Option<Event> {
        let len = isize::try_from(self.items.len()).unwrap_or(isize::MAX);
        if len == 0 {
            self.index = -1;
            self.selected = None;
            return None;
        }
        self.index = if index < 0 {
            len - 1
        } else if index >= len {
            0
        } else {
            index
        };
        let position = usize::try_from(self.index).ok()?;
        self.selected = self.items.get(position).cloned();
        Some(Event::SuggestionSelected { index: position })
    }

    fn show(&mut self, select_first_match: bool) -> Option<Event> {
        self.visible = true;
        if select_first_match {
            self.select(0)
        } else {
            // The cursor is left where it was; only the selection is dropped.
            self.selected = None;
            None
        }
    }
}

struct Inner {
    state: Mutex<State>,
    source: Source,
    options: Arc<Property<AutocompleteOptions>>,
    tags_options: Arc<Property<TagsInputOptions>>,
    bus: Arc<Bus>,
    debouncer: Debouncer<(String, Vec<Tag>)>,
    next_token: AtomicU64,
}

impl Inner {
    fn fetch(self: Arc<Self>, query: String, tags: Vec<Tag>) {
        let token = self.next_token.fetch_add(1, Ordering::AcqRel) + 1;
        {
            let mut state = self.state.lock();
            state.query = Some(query.clone());
            state.current_fetch = Some(token);
        }
        tracing::debug!(target: "horizon_tags::suggestions", %query, token, "fetching suggestions");

        match (self.source)(&query) {
            SourceResponse::Ready(result) => self.apply(token, &query, result, &tags),
            SourceResponse::Pending(future) => {
                let weak = Arc::downgrade(&self);
                let spawned = runtime::spawn(async move {
                    let result = future.await;
                    if let Some(inner) = weak.upgrade() {
                        inner.apply(token, &query, result, &tags);
                    }
                });
                if let Err(err) = spawned {
                    tracing::warn!(target: "horizon_tags::suggestions", %err, "cannot await suggestion source");
                }
            }
        }
    }

    fn apply(
        &self,
        token: u64,
        query: &str,
        result: Result<SuggestionPayload, LoadError>,
        tags: &[Tag],
    ) {
        let (identity, dashes) = self.tags_options.with(|options| {
            (options.identity_property().to_string(), options.replace_spaces_with_dashes)
        });
        let (max_results, select_first_match) = self
            .options
            .with(|options| (options.max_results_to_show, options.select_first_match));

        let mut state = self.state.lock();
        if state.current_fetch != Some(token) {
            tracing::trace!(target: "horizon_tags::suggestions", token, "discarding stale suggestions");
            return;
        }

        let payload = match result {
            Ok(payload) => payload,
            Err(err) => {
                state.reset();
                drop(state);
                tracing::warn!(target: "horizon_tags::suggestions", query, %err, "suggestion source failed");
                self.bus.trigger(Event::SuggestionsFailed {
                    query: query.to_string(),
                    message: err.message().to_string(),
                });
                return;
            }
        };

        let mut items: Vec<Suggestion> = make_records(payload.into_items(), &identity)
            .into_iter()
            .filter(|item| find_in_records(tags, item, &identity, dashes).is_none())
            .collect();
        items.truncate(max_results);
        tracing::debug!(target: "horizon_tags::suggestions", query, count = items.len(), "suggestions loaded");

        let selection = if items.is_empty() {
            state.reset();
            None
        } else {
            state.items = items;
            state.current_fetch = None;
            state.show(select_first_match)
        };
        drop(state);

        if let Some(event) = selection {
            self.bus.trigger(event);
        }
    }
}

/// The autocomplete candidates of one widget instance.
///
/// Cloning yields another handle to the same list.
#[derive(Clone)]
pub struct SuggestionList {
    inner: Arc<Inner>,
}

impl SuggestionList {
    /// Create an empty, hidden list fed by `source`.
    ///
    /// `tags_options` supplies the identity field and dash normalization used
    /// to drop suggestions that are already tags.
    pub fn new<F, R>(
        source: F,
        options: Arc<Property<AutocompleteOptions>>,
        tags_options: Arc<Property<TagsInputOptions>>,
        bus: Arc<Bus>,
    ) -> Self
    where
        F: Fn(&str) -> R + Send + Sync + 'static,
        R: Into<SourceResponse>,
    {
        let delay = options.with(|options| options.debounce_delay);
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let weak = weak.clone();
            Inner {
                state: Mutex::new(State::default()),
                source: Arc::new(move |query: &str| source(query).into()),
                options,
                tags_options,
                bus,
                debouncer: Debouncer::new(delay, move |(query, tags): (String, Vec<Tag>)| {
                    if let Some(inner) = weak.upgrade() {
                        inner.fetch(query, tags);
                    }
                }),
                next_token: AtomicU64::new(0),
            }
        });
        Self { inner }
    }

    /// Schedule a fetch for `query`, excluding suggestions already in `tags`.
    ///
    /// Calls within the debounce delay of each other collapse into one fetch
    /// using the last call's arguments.
    pub fn load(&self, query: &str, tags: Vec<Tag>) {
        let delay = self.inner.options.with(|options| options.debounce_delay);
        self.inner.debouncer.set_delay(delay);
        tracing::trace!(target: "horizon_tags::suggestions", query, "load requested");
        self.inner.debouncer.call((query.to_string(), tags));
    }

    /// Make the list visible, selecting the first suggestion if configured.
    pub fn show(&self) {
        let select_first_match = self.inner.options.with(|options| options.select_first_match);
        let event = self.inner.state.lock().show(select_first_match);
        if let Some(event) = event {
            self.inner.bus.trigger(event);
        }
    }

    /// Empty and hide the list.
    ///
    /// Any pending debounced load is cancelled and any in-flight fetch will be
    /// discarded when it completes.
    pub fn reset(&self) {
        self.inner.debouncer.cancel();
        self.inner.state.lock().reset();
        tracing::trace!(target: "horizon_tags::suggestions", "suggestions reset");
    }

    /// Move the cursor to `index`, wrapping out of range values.
    pub fn select(&self, index: isize) -> Option<Suggestion> {
        let (event, selected) = {
            let mut state = self.inner.state.lock();
            let event = state.select(index);
            (event, state.selected.clone())
        };
        if let Some(event) = event {
            self.inner.bus.trigger(event);
        }
        selected
    }

    /// Select the previous suggestion, wrapping to the last one.
    pub fn select_prior(&self) -> Option<Suggestion> {
        let index = self.inner.state.lock().index;
        self.select(index - 1)
    }

    /// Select the next suggestion, wrapping to the first one.
    pub fn select_next(&self) -> Option<Suggestion> {
        let index = self.inner.state.lock().index;
        self.select(index + 1)
    }

    /// A snapshot of the suggestions.
    pub fn items(&self) -> Vec<Suggestion> {
        self.inner.state.lock().items.clone()
    }

    /// Number of suggestions shown.
    pub fn len(&self) -> usize {
        self.inner.state.lock().items.len()
    }

    /// Whether there are no suggestions.
    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().items.is_empty()
    }

    /// The query of the latest fetch, `None` after a reset.
    pub fn query(&self) -> Option<String> {
        self.inner.state.lock().query.clone()
    }

    /// Whether the list is shown.
    pub fn is_visible(&self) -> bool {
        self.inner.state.lock().visible
    }

    /// Whether a fetch has been issued and not yet applied.
    pub fn is_loading(&self) -> bool {
        self.inner.state.lock().current_fetch.is_some()
    }

    /// The raw cursor, `-1` when nothing is selected.
    pub fn cursor(&self) -> isize {
        self.inner.state.lock().index
    }

    /// The selected suggestion.
    pub fn selected(&self) -> Option<Suggestion> {
        self.inner.state.lock().selected.clone()
    }

    /// Position of the selected suggestion.
    pub fn selected_index(&self) -> Option<usize> {
        let state = self.inner.state.lock();
        state.selected.as_ref()?;
        usize::try_from(state.index).ok()
    }
}

impl fmt::Debug for SuggestionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("SuggestionList")
            .field("len", &state.items.len())
            .field("query", &state.query)
            .field("visible", &state.visible)
            .field("index", &state.index)
            .field("debouncer", &self.inner.debouncer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::event::EventName;
    use horizon_tags_core::Placement;

    struct Fixture {
        list: SuggestionList,
        queries: Arc<Mutex<Vec<String>>>,
        events: Arc<Mutex<Vec<Event>>>,
    }

    fn fixture<F, R>(options: AutocompleteOptions, source: F) -> Fixture
    where
        F: Fn(&str) -> R + Send + Sync + 'static,
        R: Into<SourceResponse>,
    {
        let bus = Arc::new(Bus::new());
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        bus.on_names(
            &EventName::ALL,
            move |event: &Event| events_clone.lock().push(event.clone()),
            Placement::Append,
        );

        let queries = Arc::new(Mutex::new(Vec::new()));
        let queries_clone = queries.clone();
        let list = SuggestionList::new(
            move |query: &str| {
                queries_clone.lock().push(query.to_string());
                source(query)
            },
            Arc::new(Property::new(options)),
            Arc::new(Property::new(TagsInputOptions::default())),
            bus,
        );
        Fixture { list, queries, events }
    }

    fn words(words: &[&str]) -> Vec<Value> {
        words.iter().map(|word| json!({ "text": word })).collect()
    }

    fn texts(list: &SuggestionList) -> Vec<String> {
        list.items().iter().map(|item| item.text("text")).collect()
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_last_query() {
        let f = fixture(AutocompleteOptions::default(), |_: &str| words(&["abcd"]));

        f.list.load("a", Vec::new());
        tokio::time::sleep(Duration::from_millis(50)).await;
        f.list.load("ab", Vec::new());
        tokio::time::sleep(Duration::from_millis(50)).await;
        f.list.load("abc", Vec::new());
        settle().await;

        assert_eq!(*f.queries.lock(), vec!["abc"]);
        assert_eq!(f.list.query().as_deref(), Some("abc"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_are_capped() {
        let options = AutocompleteOptions::default().with_max_results_to_show(3);
        let f = fixture(options, |_: &str| words(&["one", "two", "three", "four", "five"]));

        f.list.load("o", Vec::new());
        settle().await;

        assert_eq!(texts(&f.list), vec!["one", "two", "three"]);
        assert!(f.list.is_visible());
        assert_eq!(f.list.selected_index(), Some(0));
        assert!(matches!(
            &f.events.lock()[..],
            [Event::SuggestionSelected { index: 0 }]
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_is_discarded() {
        let f = fixture(AutocompleteOptions::default(), |query: &str| {
            let (delay, results) = if query == "first" {
                (Duration::from_millis(400), words(&["from-first"]))
            } else {
                (Duration::from_millis(50), words(&["from-second"]))
            };
            SourceResponse::pending(async move {
                tokio::time::sleep(delay).await;
                Ok(SuggestionPayload::Array(results))
            })
        });

        f.list.load("first", Vec::new());
        tokio::time::sleep(Duration::from_millis(150)).await;
        f.list.load("second", Vec::new());
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(texts(&f.list), vec!["from-second"]);

        // "first" resolves now, after "second".
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(*f.queries.lock(), vec!["first", "second"]);
        assert_eq!(texts(&f.list), vec!["from-second"]);
        assert_eq!(f.list.query().as_deref(), Some("second"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_discards_in_flight_fetch() {
        let f = fixture(AutocompleteOptions::default(), |_: &str| {
            SourceResponse::pending(async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(SuggestionPayload::Array(words(&["late"])))
            })
        });

        f.list.load("query", Vec::new());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(f.list.is_loading());
        f.list.reset();
        settle().await;

        assert!(f.list.is_empty());
        assert!(!f.list.is_visible());
        assert_eq!(f.list.query(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_pending_load() {
        let f = fixture(AutocompleteOptions::default(), |_: &str| words(&["abc"]));

        f.list.load("abc", Vec::new());
        f.list.reset();
        settle().await;

        assert!(f.queries.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_tags_are_excluded() {
        let f = fixture(AutocompleteOptions::default(), |_: &str| {
            SuggestionPayload::Envelope {
                data: vec![json!("foo bar"), json!({ "text": "Baz" }), json!("qux")],
            }
        });
        let tags = vec![Tag::with_text("text", "foo-bar"), Tag::with_text("text", "baz")];

        f.list.load("x", tags);
        settle().await;

        assert_eq!(texts(&f.list), vec!["qux"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_result_resets() {
        let f = fixture(AutocompleteOptions::default(), |_: &str| words(&["abc"]));

        f.list.load("abc", vec![Tag::with_text("text", "ABC")]);
        settle().await;

        assert!(!f.list.is_visible());
        assert_eq!(f.list.query(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_resets_and_reports() {
        let f = fixture(AutocompleteOptions::default(), |_: &str| {
            SourceResponse::pending(async { Err(LoadError::new("timeout")) })
        });

        f.list.load("abc", Vec::new());
        settle().await;

        assert!(f.list.is_empty());
        assert!(matches!(
            &f.events.lock()[..],
            [Event::SuggestionsFailed { query, message }] if query == "abc" && message == "timeout"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_show_without_first_match_keeps_cursor() {
        let options = AutocompleteOptions::default().with_select_first_match(false);
        let f = fixture(options, |_: &str| words(&["one", "two"]));

        f.list.load("o", Vec::new());
        settle().await;
        assert_eq!(f.list.selected(), None);
        assert_eq!(f.list.cursor(), -1);

        f.list.select(1);
        f.list.show();
        assert_eq!(f.list.cursor(), 1);
        assert_eq!(f.list.selected(), None);
        assert_eq!(f.list.selected_index(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selection_wraps() {
        let f = fixture(AutocompleteOptions::default(), |_: &str| words(&["one", "two", "three"]));
        f.list.load("o", Vec::new());
        settle().await;

        f.list.select(0);
        f.list.select_prior();
        assert_eq!(f.list.selected_index(), Some(2));
        f.list.select_next();
        assert_eq!(f.list.selected_index(), Some(0));

        let selections: Vec<usize> = f
            .events
            .lock()
            .iter()
            .filter_map(|event| match event {
                Event::SuggestionSelected { index } => Some(*index),
                _ => None,
            })
            .collect();
        assert_eq!(selections, vec![0, 0, 2, 0]);
    }

    #[test]
    fn test_payload_shapes() {
        let array = SuggestionPayload::from_value(json!(["a", "b"])).unwrap();
        let envelope = SuggestionPayload::from_value(json!({ "data": ["a", "b"] })).unwrap();

        assert_eq!(array.into_items(), envelope.into_items());
        assert!(SuggestionPayload::from_value(json!({ "items": [] })).is_err());
    }
}
