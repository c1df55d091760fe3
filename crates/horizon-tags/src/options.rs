//! Typed options for the two controllers.
//!
//! Both structs can be built directly with `with_*` methods or resolved from
//! host attributes through [`ConfigRegistry`](crate::config::ConfigRegistry)
//! using their `specs()` and `from_record`.

use std::time::Duration;

use regex::Regex;

use crate::config::{non_negative_integer, OptionKind, OptionSpec, OptionsRecord};
use crate::error::ConfigError;

/// Namespace for tags input options and global defaults.
pub const TAGS_INPUT_NAMESPACE: &str = "tagsInput";
/// Namespace for autocomplete options and global defaults.
pub const AUTOCOMPLETE_NAMESPACE: &str = "autoComplete";

fn pattern(source: &'static str) -> Regex {
    Regex::new(source).expect("built-in option patterns compile")
}

fn count_default(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Options for a [`TagsInput`](crate::TagsInput) and its [`TagList`](crate::TagList).
#[derive(Debug, Clone)]
pub struct TagsInputOptions {
    /// Field holding the text shown for a tag.
    pub display_property: String,
    /// Field identifying a tag. Empty means `display_property`.
    pub key_property: String,
    pub min_length: usize,
    pub max_length: usize,
    pub min_tags: usize,
    pub max_tags: usize,
    pub replace_spaces_with_dashes: bool,
    pub allowed_tags_pattern: Regex,
    pub add_on_enter: bool,
    pub add_on_space: bool,
    pub add_on_comma: bool,
    pub add_on_blur: bool,
    pub add_on_paste: bool,
    pub paste_split_pattern: Regex,
    pub enable_editing_last_tag: bool,
    pub allow_leftover_text: bool,
    pub add_from_autocomplete_only: bool,
    /// Expose the model as plain strings instead of records.
    pub use_strings: bool,
}

impl Default for TagsInputOptions {
    fn default() -> Self {
        Self {
            display_property: "text".to_string(),
            key_property: String::new(),
            min_length: 3,
            max_length: usize::MAX,
            min_tags: 0,
            max_tags: usize::MAX,
            replace_spaces_with_dashes: true,
            allowed_tags_pattern: pattern(".+"),
            add_on_enter: true,
            add_on_space: false,
            add_on_comma: true,
            add_on_blur: true,
            add_on_paste: false,
            paste_split_pattern: pattern(","),
            enable_editing_last_tag: false,
            allow_leftover_text: false,
            add_from_autocomplete_only: false,
            use_strings: false,
        }
    }
}

impl TagsInputOptions {
    /// The field tags are identified by.
    pub fn identity_property(&self) -> &str {
        if self.key_property.is_empty() {
            &self.display_property
        } else {
            &self.key_property
        }
    }

    pub fn with_display_property(mut self, field: impl Into<String>) -> Self {
        self.display_property = field.into();
        self
    }

    pub fn with_key_property(mut self, field: impl Into<String>) -> Self {
        self.key_property = field.into();
        self
    }

    pub fn with_min_length(mut self, min: usize) -> Self {
        self.min_length = min;
        self
    }

    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = max;
        self
    }

    pub fn with_min_tags(mut self, min: usize) -> Self {
        self.min_tags = min;
        self
    }

    pub fn with_max_tags(mut self, max: usize) -> Self {
        self.max_tags = max;
        self
    }

    pub fn with_replace_spaces_with_dashes(mut self, enabled: bool) -> Self {
        self.replace_spaces_with_dashes = enabled;
        self
    }

    pub fn with_allowed_tags_pattern(mut self, pattern: Regex) -> Self {
        self.allowed_tags_pattern = pattern;
        self
    }

    pub fn with_add_on_enter(mut self, enabled: bool) -> Self {
        self.add_on_enter = enabled;
        self
    }

    pub fn with_add_on_space(mut self, enabled: bool) -> Self {
        self.add_on_space = enabled;
        self
    }

    pub fn with_add_on_comma(mut self, enabled: bool) -> Self {
        self.add_on_comma = enabled;
        self
    }

    pub fn with_add_on_blur(mut self, enabled: bool) -> Self {
        self.add_on_blur = enabled;
        self
    }

    pub fn with_add_on_paste(mut self, enabled: bool) -> Self {
        self.add_on_paste = enabled;
        self
    }

    pub fn with_paste_split_pattern(mut self, pattern: Regex) -> Self {
        self.paste_split_pattern = pattern;
        self
    }

    pub fn with_enable_editing_last_tag(mut self, enabled: bool) -> Self {
        self.enable_editing_last_tag = enabled;
        self
    }

    pub fn with_allow_leftover_text(mut self, enabled: bool) -> Self {
        self.allow_leftover_text = enabled;
        self
    }

    pub fn with_add_from_autocomplete_only(mut self, enabled: bool) -> Self {
        self.add_from_autocomplete_only = enabled;
        self
    }

    pub fn with_use_strings(mut self, enabled: bool) -> Self {
        self.use_strings = enabled;
        self
    }

    /// Option declarations, with the defaults above.
    pub fn specs() -> Vec<OptionSpec> {
        let defaults = Self::default();
        vec![
            OptionSpec::new("displayProperty", OptionKind::String, defaults.display_property),
            OptionSpec::new("keyProperty", OptionKind::String, defaults.key_property),
            OptionSpec::new("minLength", OptionKind::Number, count_default(defaults.min_length))
                .with_validator(non_negative_integer),
            OptionSpec::new("maxLength", OptionKind::Number, count_default(defaults.max_length))
                .with_validator(non_negative_integer),
            OptionSpec::new("minTags", OptionKind::Number, count_default(defaults.min_tags))
                .with_validator(non_negative_integer),
            OptionSpec::new("maxTags", OptionKind::Number, count_default(defaults.max_tags))
                .with_validator(non_negative_integer),
            OptionSpec::new("replaceSpacesWithDashes", OptionKind::Boolean, defaults.replace_spaces_with_dashes),
            OptionSpec::new("allowedTagsPattern", OptionKind::Regex, defaults.allowed_tags_pattern),
            OptionSpec::new("addOnEnter", OptionKind::Boolean, defaults.add_on_enter),
            OptionSpec::new("addOnSpace", OptionKind::Boolean, defaults.add_on_space),
            OptionSpec::new("addOnComma", OptionKind::Boolean, defaults.add_on_comma),
            OptionSpec::new("addOnBlur", OptionKind::Boolean, defaults.add_on_blur),
            OptionSpec::new("addOnPaste", OptionKind::Boolean, defaults.add_on_paste),
            OptionSpec::new("pasteSplitPattern", OptionKind::Regex, defaults.paste_split_pattern),
            OptionSpec::new("enableEditingLastTag", OptionKind::Boolean, defaults.enable_editing_last_tag),
            OptionSpec::new("allowLeftoverText", OptionKind::Boolean, defaults.allow_leftover_text),
            OptionSpec::new("addFromAutocompleteOnly", OptionKind::Boolean, defaults.add_from_autocomplete_only),
            OptionSpec::new("useStrings", OptionKind::Boolean, defaults.use_strings),
        ]
    }

    /// Build from a record resolved against [`specs`](Self::specs).
    pub fn from_record(record: &OptionsRecord) -> Result<Self, ConfigError> {
        Ok(Self {
            display_property: record.string("displayProperty")?,
            key_property: record.string("keyProperty")?,
            min_length: record.count("minLength")?,
            max_length: record.count("maxLength")?,
            min_tags: record.count("minTags")?,
            max_tags: record.count("maxTags")?,
            replace_spaces_with_dashes: record.boolean("replaceSpacesWithDashes")?,
            allowed_tags_pattern: record.regex("allowedTagsPattern")?,
            add_on_enter: record.boolean("addOnEnter")?,
            add_on_space: record.boolean("addOnSpace")?,
            add_on_comma: record.boolean("addOnComma")?,
            add_on_blur: record.boolean("addOnBlur")?,
            add_on_paste: record.boolean("addOnPaste")?,
            paste_split_pattern: record.regex("pasteSplitPattern")?,
            enable_editing_last_tag: record.boolean("enableEditingLastTag")?,
            allow_leftover_text: record.boolean("allowLeftoverText")?,
            add_from_autocomplete_only: record.boolean("addFromAutocompleteOnly")?,
            use_strings: record.boolean("useStrings")?,
        })
    }
}

/// Options for an [`Autocomplete`](crate::Autocomplete) and its
/// [`SuggestionList`](crate::SuggestionList).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutocompleteOptions {
    pub debounce_delay: Duration,
    pub min_length: usize,
    pub highlight_matched_text: bool,
    pub max_results_to_show: usize,
    pub load_on_down_arrow: bool,
    pub load_on_empty: bool,
    pub load_on_focus: bool,
    pub select_first_match: bool,
    /// Field shown for a suggestion. Empty means the tags input's display property.
    pub display_property: String,
}

impl Default for AutocompleteOptions {
    fn default() -> Self {
        Self {
            debounce_delay: Duration::from_millis(100),
            min_length: 3,
            highlight_matched_text: true,
            max_results_to_show: 10,
            load_on_down_arrow: false,
            load_on_empty: false,
            load_on_focus: false,
            select_first_match: true,
            display_property: String::new(),
        }
    }
}

impl AutocompleteOptions {
    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.debounce_delay = delay;
        self
    }

    pub fn with_min_length(mut self, min: usize) -> Self {
        self.min_length = min;
        self
    }

    pub fn with_highlight_matched_text(mut self, enabled: bool) -> Self {
        self.highlight_matched_text = enabled;
        self
    }

    pub fn with_max_results_to_show(mut self, max: usize) -> Self {
        self.max_results_to_show = max;
        self
    }

    pub fn with_load_on_down_arrow(mut self, enabled: bool) -> Self {
        self.load_on_down_arrow = enabled;
        self
    }

    pub fn with_load_on_empty(mut self, enabled: bool) -> Self {
        self.load_on_empty = enabled;
        self
    }

    pub fn with_load_on_focus(mut self, enabled: bool) -> Self {
        self.load_on_focus = enabled;
        self
    }

    pub fn with_select_first_match(mut self, enabled: bool) -> Self {
        self.select_first_match = enabled;
        self
    }

    pub fn with_display_property(mut self, field: impl Into<String>) -> Self {
        self.display_property = field.into();
        self
    }

    /// Option declarations, with the defaults above.
    pub fn specs() -> Vec<OptionSpec> {
        let defaults = Self::default();
        let delay_ms = i64::try_from(defaults.debounce_delay.as_millis()).unwrap_or(i64::MAX);
        vec![
            OptionSpec::new("debounceDelay", OptionKind::Number, delay_ms)
                .with_validator(non_negative_integer),
            OptionSpec::new("minLength", OptionKind::Number, count_default(defaults.min_length))
                .with_validator(non_negative_integer),
            OptionSpec::new("highlightMatchedText", OptionKind::Boolean, defaults.highlight_matched_text),
            OptionSpec::new("maxResultsToShow", OptionKind::Number, count_default(defaults.max_results_to_show))
                .with_validator(non_negative_integer),
            OptionSpec::new("loadOnDownArrow", OptionKind::Boolean, defaults.load_on_down_arrow),
            OptionSpec::new("loadOnEmpty", OptionKind::Boolean, defaults.load_on_empty),
            OptionSpec::new("loadOnFocus", OptionKind::Boolean, defaults.load_on_focus),
            OptionSpec::new("selectFirstMatch", OptionKind::Boolean, defaults.select_first_match),
            OptionSpec::new("displayProperty", OptionKind::String, defaults.display_property),
        ]
    }

    /// Build from a record resolved against [`specs`](Self::specs).
    pub fn from_record(record: &OptionsRecord) -> Result<Self, ConfigError> {
        let delay_ms = u64::try_from(record.count("debounceDelay")?).unwrap_or(u64::MAX);
        Ok(Self {
            debounce_delay: Duration::from_millis(delay_ms),
            min_length: record.count("minLength")?,
            highlight_matched_text: record.boolean("highlightMatchedText")?,
            max_results_to_show: record.count("maxResultsToShow")?,
            load_on_down_arrow: record.boolean("loadOnDownArrow")?,
            load_on_empty: record.boolean("loadOnEmpty")?,
            load_on_focus: record.boolean("loadOnFocus")?,
            select_first_match: record.boolean("selectFirstMatch")?,
            display_property: record.string("displayProperty")?,
        })
    }
}
