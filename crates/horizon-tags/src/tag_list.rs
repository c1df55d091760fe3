//! The ordered list of tags and its selection cursor.
//!
//! Additions and removals run a two-phase protocol: validate and ask the veto
//! gate, then mutate and publish. Both are async because the gate may answer
//! with a future; several adds or removes may be in flight at once.
//!
//! # Cursor
//!
//! The cursor is `-1` when nothing is selected. [`TagList::select`] wraps out
//! of range indexes: below zero selects the last tag, past the end selects the
//! first. The host may replace the items wholesale at any time, so reads of the
//! selection re-validate the cursor against the current length.

use std::fmt;
use std::sync::Arc;

use horizon_tags_core::Property;
use parking_lot::Mutex;

use crate::event::{Bus, Event};
use crate::options::TagsInputOptions;
use crate::tag::Tag;
use crate::text::{find_in_records, replace_spaces_with_dashes};
use crate::veto::Vetoes;

/// Why an addition was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The display text was empty.
    Empty,
    /// Shorter than `min_length` characters.
    TooShort,
    /// Longer than `max_length` characters.
    TooLong,
    /// Did not match `allowed_tags_pattern`.
    PatternMismatch,
    /// A tag with the same identity is already in the list.
    Duplicate,
    /// The `on_adding` gate denied it.
    Vetoed,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Empty => "empty",
            Self::TooShort => "too short",
            Self::TooLong => "too long",
            Self::PatternMismatch => "does not match the allowed pattern",
            Self::Duplicate => "duplicate",
            Self::Vetoed => "vetoed",
        };
        f.write_str(reason)
    }
}

/// Result of [`TagList::add`].
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// The tag, after normalization, was appended.
    Added(Tag),
    /// The tag was not added. The list is unchanged.
    Rejected { tag: Tag, reason: Rejection },
}

impl AddOutcome {
    /// Whether the tag was appended.
    pub fn is_added(&self) -> bool {
        matches!(self, Self::Added(_))
    }

    /// The normalized candidate, whatever the outcome.
    pub fn tag(&self) -> &Tag {
        match self {
            Self::Added(tag) | Self::Rejected { tag, .. } => tag,
        }
    }

    /// The rejection reason, if any.
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            Self::Added(_) => None,
            Self::Rejected { reason, .. } => Some(*reason),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    items: Vec<Tag>,
    index: isize,
}

impl State {
    fn cursor(&self) -> Option<usize> {
        usize::try_from(self.index)
            .ok()
            .filter(|index| *index < self.items.len())
    }
}

struct Inner {
    state: Mutex<State>,
    options: Arc<Property<TagsInputOptions>>,
    bus: Arc<Bus>,
    vetoes: Vetoes,
}

/// The tags of one widget instance.
///
/// Cloning yields another handle to the same list.
#[derive(Clone)]
pub struct TagList {
    inner: Arc<Inner>,
}

impl TagList {
    /// Create an empty list publishing on `bus`.
    pub fn new(options: Arc<Property<TagsInputOptions>>, bus: Arc<Bus>, vetoes: Vetoes) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    items: Vec::new(),
                    index: -1,
                }),
                options,
                bus,
                vetoes,
            }),
        }
    }

    /// The bus this list publishes on.
    pub fn bus(&self) -> &Arc<Bus> {
        &self.inner.bus
    }

    /// Build a bare tag from `text` and [`add`](Self::add) it.
    pub async fn add_text(&self, text: &str) -> AddOutcome {
        let field = self.inner.options.with(|options| options.display_property.clone());
        self.add(Tag::with_text(&field, text)).await
    }

    /// Validate `tag`, ask the `on_adding` gate, then append it.
    ///
    /// Publishes `tag-added` on success, and `invalid-tag` on failure unless the
    /// display text is empty.
    #[tracing::instrument(skip_all, target = "horizon_tags::tag_list", level = "debug")]
    pub async fn add(&self, mut tag: Tag) -> AddOutcome {
        let options = self.inner.options.get();
        let display = options.display_property.as_str();
        let identity = options.identity_property();

        let mut text = tag.text(display);
        if options.replace_spaces_with_dashes {
            let normalized = replace_spaces_with_dashes(&text);
            if normalized != text {
                tag.set_text(display, normalized.clone());
                text = normalized;
            }
        }

        let length = text.chars().count();
        let structural = if text.is_empty() {
            Some(Rejection::Empty)
        } else if length < options.min_length {
            Some(Rejection::TooShort)
        } else if length > options.max_length {
            Some(Rejection::TooLong)
        } else if !options.allowed_tags_pattern.is_match(&text) {
            Some(Rejection::PatternMismatch)
        } else if self.contains(&tag, identity) {
            Some(Rejection::Duplicate)
        } else {
            None
        };

        let verdict = if let Some(reason) = structural {
            Err(reason)
        } else if !self.inner.vetoes.on_adding.permits(&tag).await {
            Err(Rejection::Vetoed)
        } else {
            let mut state = self.inner.state.lock();
            // Another add of the same identity may have landed while the gate was pending.
            if find_in_records(&state.items, &tag, identity, false).is_some() {
                Err(Rejection::Duplicate)
            } else {
                state.items.push(tag.clone());
                Ok(())
            }
        };

        match verdict {
            Ok(()) => {
                tracing::debug!(target: "horizon_tags::tag_list", %text, "tag added");
                self.inner.bus.trigger(Event::TagAdded { tag: tag.clone() });
                AddOutcome::Added(tag)
            }
            Err(reason) => {
                tracing::debug!(target: "horizon_tags::tag_list", %text, %reason, "tag rejected");
                if !text.is_empty() {
                    self.inner.bus.trigger(Event::InvalidTag { tag: tag.clone() });
                }
                AddOutcome::Rejected { tag, reason }
            }
        }
    }

    fn contains(&self, tag: &Tag, identity: &str) -> bool {
        let state = self.inner.state.lock();
        find_in_records(&state.items, tag, identity, false).is_some()
    }

    /// Ask the `on_removing` gate, then remove the tag at `index`.
    ///
    /// Resolves to the removed tag, or `None` when `index` is out of range, the
    /// gate denied it, or the tag disappeared while the gate was pending. Only a
    /// completed removal publishes `tag-removed`.
    #[tracing::instrument(skip(self), target = "horizon_tags::tag_list", level = "debug")]
    pub async fn remove(&self, index: usize) -> Option<Tag> {
        let candidate = self.inner.state.lock().items.get(index).cloned()?;

        if !self.inner.vetoes.on_removing.permits(&candidate).await {
            tracing::debug!(target: "horizon_tags::tag_list", index, "removal vetoed");
            return None;
        }

        let removed = {
            let mut state = self.inner.state.lock();
            // The list may have shifted while the gate was pending.
            let position = if state.items.get(index) == Some(&candidate) {
                Some(index)
            } else {
                state.items.iter().position(|tag| *tag == candidate)
            };
            position.map(|position| {
                state.index = -1;
                state.items.remove(position)
            })
        };

        match &removed {
            Some(tag) => {
                tracing::debug!(target: "horizon_tags::tag_list", index, "tag removed");
                self.inner.bus.trigger(Event::TagRemoved { tag: tag.clone() });
            }
            None => {
                tracing::debug!(target: "horizon_tags::tag_list", index, "tag vanished before removal");
            }
        }
        removed
    }

    /// Remove the selected tag, if any.
    pub async fn remove_selected(&self) -> Option<Tag> {
        let index = self.selected_index()?;
        self.remove(index).await
    }

    /// Move the tag at `from` to `to`, shifting the tags in between.
    ///
    /// Returns `false` without doing anything if either index is out of range
    /// or they are equal. Otherwise clears the selection and publishes
    /// `tag-dragged`.
    pub fn reorder(&self, from: usize, to: usize) -> bool {
        let tag = {
            let mut state = self.inner.state.lock();
            let len = state.items.len();
            if from >= len || to >= len || from == to {
                return false;
            }
            let tag = state.items.remove(from);
            state.items.insert(to, tag.clone());
            state.index = -1;
            tag
        };

        tracing::debug!(target: "horizon_tags::tag_list", from, to, "tag moved");
        self.inner.bus.trigger(Event::TagDragged { tag, from, to });
        true
    }

    /// Move the cursor to `index`, wrapping out of range values.
    ///
    /// On an empty list the selection is cleared. Returns the selected tag.
    pub fn select(&self, index: isize) -> Option<Tag> {
        let mut state = self.inner.state.lock();
        let len = isize::try_from(state.items.len()).unwrap_or(isize::MAX);
        if len == 0 {
            state.index = -1;
            return None;
        }
        state.index = if index < 0 {
            len - 1
        } else if index >= len {
            0
        } else {
            index
        };
        tracing::trace!(target: "horizon_tags::tag_list", index = state.index, "tag selected");
        state.cursor().and_then(|cursor| state.items.get(cursor).cloned())
    }

    /// Select the previous tag, wrapping to the last one.
    pub fn select_prior(&self) -> Option<Tag> {
        let index = self.inner.state.lock().index;
        self.select(index - 1)
    }

    /// Select the next tag, wrapping to the first one.
    pub fn select_next(&self) -> Option<Tag> {
        let index = self.inner.state.lock().index;
        self.select(index + 1)
    }

    /// Clear the selection.
    pub fn clear_selection(&self) {
        self.inner.state.lock().index = -1;
    }

    /// The raw cursor, `-1` when nothing is selected.
    pub fn cursor(&self) -> isize {
        let state = self.inner.state.lock();
        state.cursor().map_or(-1, |_| state.index)
    }

    /// The selected position, if it is still within the list.
    pub fn selected_index(&self) -> Option<usize> {
        self.inner.state.lock().cursor()
    }

    /// The selected tag, if the cursor is still within the list.
    pub fn selected(&self) -> Option<Tag> {
        let state = self.inner.state.lock();
        state.cursor().and_then(|cursor| state.items.get(cursor).cloned())
    }

    /// A snapshot of the tags.
    pub fn items(&self) -> Vec<Tag> {
        self.inner.state.lock().items.clone()
    }

    /// The tag at `index`.
    pub fn get(&self, index: usize) -> Option<Tag> {
        self.inner.state.lock().items.get(index).cloned()
    }

    /// The last tag.
    pub fn last(&self) -> Option<Tag> {
        self.inner.state.lock().items.last().cloned()
    }

    /// Number of tags.
    pub fn len(&self) -> usize {
        self.inner.state.lock().items.len()
    }

    /// Whether the list holds no tags.
    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().items.is_empty()
    }

    /// Replace every tag, bypassing validation and gates.
    ///
    /// Duplicates already present in `items` are kept; identity lookups treat
    /// the first one as canonical. The selection is cleared if the cursor no
    /// longer fits.
    pub fn replace_items(&self, items: Vec<Tag>) {
        let mut state = self.inner.state.lock();
        state.items = items;
        if state.cursor().is_none() {
            state.index = -1;
        }
        tracing::trace!(target: "horizon_tags::tag_list", len = state.items.len(), "items replaced");
    }
}

impl fmt::Debug for TagList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("TagList")
            .field("len", &state.items.len())
            .field("index", &state.index)
            .field("vetoes", &self.inner.vetoes)
            .finish()
    }
}
