//! Typed option loading for tag input widgets.
//!
//! Each widget declares a closed set of options as [`OptionSpec`]s. Values are
//! read from an [`AttributeSource`] (typically the host element's attributes)
//! and resolved through a fallback chain:
//!
//! 1. the attribute, if present, non-empty, accepted by the spec's validator and
//!    convertible to the declared kind
//! 2. the global default registered for the widget's namespace
//! 3. the spec's built-in default
//!
//! Options named as "active interpolation" for a namespace are observed: the
//! host feeds later attribute values through [`LoadedOptions::observe`], which
//! re-resolves them and publishes `option-change` on the widget's bus.
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use horizon_tags::config::{ConfigRegistry, OptionKind, OptionSpec};
//! use horizon_tags::Bus;
//!
//! let registry = ConfigRegistry::new();
//! registry.set_defaults("tagsInput", [("minLength", 2)]);
//!
//! let attrs = HashMap::from([("placeholder", "Add a tag")]);
//! let specs = [
//!     OptionSpec::new("minLength", OptionKind::Number, 3),
//!     OptionSpec::new("placeholder", OptionKind::String, ""),
//! ];
//! let loaded = registry
//!     .load("tagsInput", &attrs, Arc::new(Bus::new()), &specs)
//!     .unwrap();
//! assert_eq!(loaded.record().number("minLength").unwrap(), 2);
//! ```

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use horizon_tags_core::Property;
use parking_lot::RwLock;
use regex::Regex;

use crate::error::ConfigError;
use crate::event::{Bus, Event};
use crate::text::same_text;

/// The primitive type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKind {
    String,
    Number,
    Boolean,
    Regex,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Regex => "regex",
        };
        f.write_str(name)
    }
}

/// A resolved option value.
#[derive(Debug, Clone)]
pub enum OptionValue {
    String(String),
    Number(i64),
    Boolean(bool),
    Regex(Regex),
}

impl OptionValue {
    /// The kind of this value.
    pub fn kind(&self) -> OptionKind {
        match self {
            Self::String(_) => OptionKind::String,
            Self::Number(_) => OptionKind::Number,
            Self::Boolean(_) => OptionKind::Boolean,
            Self::Regex(_) => OptionKind::Regex,
        }
    }

    /// Convert raw attribute text to `kind`, or `None` if it does not convert.
    pub fn parse(kind: OptionKind, raw: &str) -> Option<Self> {
        match kind {
            OptionKind::String => Some(Self::String(raw.to_string())),
            OptionKind::Number => parse_leading_integer(raw).map(Self::Number),
            OptionKind::Boolean => Some(Self::Boolean(same_text(raw, "true"))),
            OptionKind::Regex => Regex::new(raw).ok().map(Self::Regex),
        }
    }
}

impl PartialEq for OptionValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Regex(r) => write!(f, "/{}/", r.as_str()),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for OptionValue {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        Self::Number(i64::from(value))
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<Regex> for OptionValue {
    fn from(value: Regex) -> Self {
        Self::Regex(value)
    }
}

/// `parseInt`-style parse: optional sign and leading digits, trailing junk ignored.
fn parse_leading_integer(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let sign_len = usize::from(trimmed.starts_with(['-', '+']));
    let digits = trimmed[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(trimmed.len(), |end| sign_len + end);
    if digits == sign_len {
        return None;
    }
    trimmed[..digits].parse().ok()
}

/// Predicate applied to raw attribute text before conversion.
pub type Validator = fn(&str) -> bool;

/// Declaration of one option.
#[derive(Debug, Clone)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: OptionKind,
    pub default: OptionValue,
    pub validator: Option<Validator>,
}

impl OptionSpec {
    /// Declare an option of `kind` with a built-in default.
    pub fn new(name: &'static str, kind: OptionKind, default: impl Into<OptionValue>) -> Self {
        Self {
            name,
            kind,
            default: default.into(),
            validator: None,
        }
    }

    /// Attach a validator for raw attribute text.
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }
}

/// Accepts only non-negative integers.
pub fn non_negative_integer(raw: &str) -> bool {
    parse_leading_integer(raw).is_some_and(|n| n >= 0)
}

/// Where raw option text comes from.
pub trait AttributeSource {
    /// The raw text of attribute `name`, if present.
    fn attribute(&self, name: &str) -> Option<String>;
}

impl<K, V> AttributeSource for HashMap<K, V>
where
    K: Borrow<str> + Eq + Hash,
    V: AsRef<str>,
{
    fn attribute(&self, name: &str) -> Option<String> {
        self.get(name).map(|value| value.as_ref().to_string())
    }
}

impl<K, V> AttributeSource for BTreeMap<K, V>
where
    K: Borrow<str> + Ord,
    V: AsRef<str>,
{
    fn attribute(&self, name: &str) -> Option<String> {
        self.get(name).map(|value| value.as_ref().to_string())
    }
}

/// A flat record of resolved options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsRecord {
    values: BTreeMap<String, OptionValue>,
}

impl OptionsRecord {
    /// Get a value by name.
    pub fn get(&self, name: &str) -> Result<&OptionValue, ConfigError> {
        self.values.get(name).ok_or_else(|| ConfigError::unknown(name))
    }

    /// Set a value by name.
    pub fn set(&mut self, name: impl Into<String>, value: OptionValue) {
        self.values.insert(name.into(), value);
    }

    /// Whether the record holds `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterate over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Read a string option.
    pub fn string(&self, name: &str) -> Result<String, ConfigError> {
        match self.get(name)? {
            OptionValue::String(s) => Ok(s.clone()),
            other => Err(mismatch(name, OptionKind::String, other)),
        }
    }

    /// Read a number option.
    pub fn number(&self, name: &str) -> Result<i64, ConfigError> {
        match self.get(name)? {
            OptionValue::Number(n) => Ok(*n),
            other => Err(mismatch(name, OptionKind::Number, other)),
        }
    }

    /// Read a number option as a count, clamping negatives to zero.
    ///
    /// `i64::MAX` stands for an unbounded count and reads back as `usize::MAX`.
    pub fn count(&self, name: &str) -> Result<usize, ConfigError> {
        self.number(name).map(|n| match n {
            i64::MAX => usize::MAX,
            n => usize::try_from(n.max(0)).unwrap_or(usize::MAX),
        })
    }

    /// Read a boolean option.
    pub fn boolean(&self, name: &str) -> Result<bool, ConfigError> {
        match self.get(name)? {
            OptionValue::Boolean(b) => Ok(*b),
            other => Err(mismatch(name, OptionKind::Boolean, other)),
        }
    }

    /// Read a regex option.
    pub fn regex(&self, name: &str) -> Result<Regex, ConfigError> {
        match self.get(name)? {
            OptionValue::Regex(r) => Ok(r.clone()),
            other => Err(mismatch(name, OptionKind::Regex, other)),
        }
    }
}

fn mismatch(name: &str, expected: OptionKind, found: &OptionValue) -> ConfigError {
    ConfigError::TypeMismatch {
        name: name.to_string(),
        expected,
        found: found.kind(),
    }
}

/// Application-wide option defaults, keyed by widget namespace.
#[derive(Debug, Default)]
pub struct ConfigRegistry {
    defaults: RwLock<HashMap<String, HashMap<String, OptionValue>>>,
    interpolated: RwLock<HashMap<String, HashSet<String>>>,
}

impl ConfigRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register global defaults for a namespace, merging with earlier ones.
    pub fn set_defaults<I, K, V>(&self, namespace: &str, defaults: I) -> &Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<OptionValue>,
    {
        let mut all = self.defaults.write();
        let entry = all.entry(namespace.to_string()).or_default();
        for (name, value) in defaults {
            entry.insert(name.into(), value.into());
        }
        self
    }

    /// Mark options of a namespace as observed for later changes.
    pub fn set_active_interpolation<I, K>(&self, namespace: &str, names: I) -> &Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut all = self.interpolated.write();
        let entry = all.entry(namespace.to_string()).or_default();
        entry.extend(names.into_iter().map(Into::into));
        self
    }

    /// Resolve `specs` for a widget in `namespace`.
    ///
    /// # Errors
    ///
    /// Fails only on malformed specs: a default whose kind differs from the
    /// declared kind, or a name declared twice.
    pub fn load(
        &self,
        namespace: &str,
        source: &dyn AttributeSource,
        bus: Arc<Bus>,
        specs: &[OptionSpec],
    ) -> Result<LoadedOptions, ConfigError> {
        let mut seen = HashSet::new();
        for spec in specs {
            if spec.default.kind() != spec.kind {
                return Err(ConfigError::DefaultKindMismatch {
                    name: spec.name.to_string(),
                    expected: spec.kind,
                    found: spec.default.kind(),
                });
            }
            if !seen.insert(spec.name) {
                return Err(ConfigError::DuplicateOption {
                    name: spec.name.to_string(),
                });
            }
        }

        let globals = self
            .defaults
            .read()
            .get(namespace)
            .cloned()
            .unwrap_or_default();
        let observed = self
            .interpolated
            .read()
            .get(namespace)
            .cloned()
            .unwrap_or_default();

        let loaded = LoadedOptions {
            namespace: namespace.to_string(),
            specs: specs.to_vec(),
            globals,
            observed,
            record: Property::new(OptionsRecord::default()),
            bus,
        };

        let mut record = OptionsRecord::default();
        for spec in specs {
            let raw = source.attribute(spec.name);
            record.set(spec.name, loaded.resolve(spec, raw.as_deref()));
        }
        loaded.record.set_silent(record);
        tracing::debug!(target: "horizon_tags::config", namespace, options = specs.len(), "options loaded");
        Ok(loaded)
    }
}

/// Options resolved for one widget instance.
#[derive(Debug)]
pub struct LoadedOptions {
    namespace: String,
    specs: Vec<OptionSpec>,
    globals: HashMap<String, OptionValue>,
    observed: HashSet<String>,
    record: Property<OptionsRecord>,
    bus: Arc<Bus>,
}

impl LoadedOptions {
    /// The namespace these options were loaded for.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// A snapshot of the resolved record.
    pub fn record(&self) -> OptionsRecord {
        self.record.get()
    }

    /// Whether `name` is observed for changes.
    pub fn is_observed(&self, name: &str) -> bool {
        self.observed.contains(name)
    }

    /// Feed a new raw value for an observed option.
    ///
    /// Re-resolves the option and publishes `option-change`. Returns `false`
    /// without doing anything when the option is not declared or not observed.
    pub fn observe(&self, name: &str, raw: Option<&str>) -> bool {
        let Some(spec) = self.specs.iter().find(|spec| spec.name == name) else {
            tracing::warn!(target: "horizon_tags::config", name, "observed value for undeclared option");
            return false;
        };
        if !self.is_observed(name) {
            tracing::trace!(target: "horizon_tags::config", name, "option is not interpolated, ignoring");
            return false;
        }

        let value = self.resolve(spec, raw);
        self.record.update(|record| record.set(name, value.clone()));
        self.bus.trigger(Event::OptionChange {
            namespace: self.namespace.clone(),
            name: name.to_string(),
            value,
        });
        true
    }

    fn fallback(&self, spec: &OptionSpec) -> OptionValue {
        match self.globals.get(spec.name) {
            Some(global) if global.kind() == spec.kind => global.clone(),
            Some(global) => {
                tracing::warn!(
                    target: "horizon_tags::config",
                    name = spec.name,
                    expected = %spec.kind,
                    found = %global.kind(),
                    "global default has the wrong kind, using built-in default"
                );
                spec.default.clone()
            }
            None => spec.default.clone(),
        }
    }

    fn resolve(&self, spec: &OptionSpec, raw: Option<&str>) -> OptionValue {
        let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
            return self.fallback(spec);
        };
        if spec.validator.is_some_and(|validate| !validate(raw)) {
            tracing::debug!(target: "horizon_tags::config", name = spec.name, raw, "attribute rejected by validator");
            return self.fallback(spec);
        }
        OptionValue::parse(spec.kind, raw).unwrap_or_else(|| {
            tracing::warn!(target: "horizon_tags::config", name = spec.name, raw, kind = %spec.kind, "attribute does not convert");
            self.fallback(spec)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn specs() -> Vec<OptionSpec> {
        vec![
            OptionSpec::new("minLength", OptionKind::Number, 3).with_validator(non_negative_integer),
            OptionSpec::new("addOnEnter", OptionKind::Boolean, true),
            OptionSpec::new("displayProperty", OptionKind::String, "text"),
            OptionSpec::new("allowedTagsPattern", OptionKind::Regex, Regex::new(".+").unwrap()),
        ]
    }

    fn load(registry: &ConfigRegistry, attrs: &[(&str, &str)]) -> LoadedOptions {
        let attrs: HashMap<&str, &str> = attrs.iter().copied().collect();
        registry
            .load("tagsInput", &attrs, Arc::new(Bus::new()), &specs())
            .unwrap()
    }

    #[test]
    fn test_builtin_defaults() {
        let record = load(&ConfigRegistry::new(), &[]).record();

        assert_eq!(record.number("minLength").unwrap(), 3);
        assert!(record.boolean("addOnEnter").unwrap());
        assert_eq!(record.string("displayProperty").unwrap(), "text");
        assert_eq!(record.regex("allowedTagsPattern").unwrap().as_str(), ".+");
    }

    #[test]
    fn test_attribute_wins_over_defaults() {
        let registry = ConfigRegistry::new();
        registry.set_defaults("tagsInput", [("minLength", 1)]);
        let record = load(
            &registry,
            &[("minLength", "5"), ("addOnEnter", "FALSE"), ("allowedTagsPattern", "^[a-z]+$")],
        )
        .record();

        assert_eq!(record.number("minLength").unwrap(), 5);
        assert!(!record.boolean("addOnEnter").unwrap());
        assert!(record.regex("allowedTagsPattern").unwrap().is_match("abc"));
    }

    #[test]
    fn test_invalid_attribute_falls_back_to_global_then_builtin() {
        let registry = ConfigRegistry::new();
        registry.set_defaults("tagsInput", [("minLength", 2)]);

        let record = load(&registry, &[("minLength", "-4"), ("allowedTagsPattern", "(")]).record();
        assert_eq!(record.number("minLength").unwrap(), 2);
        assert_eq!(record.regex("allowedTagsPattern").unwrap().as_str(), ".+");
    }

    #[test]
    fn test_empty_attribute_uses_default() {
        let record = load(&ConfigRegistry::new(), &[("displayProperty", "")]).record();
        assert_eq!(record.string("displayProperty").unwrap(), "text");
    }

    #[test]
    fn test_global_default_of_wrong_kind_is_ignored() {
        let registry = ConfigRegistry::new();
        registry.set_defaults("tagsInput", [("minLength", "seven")]);
        let record = load(&registry, &[]).record();
        assert_eq!(record.number("minLength").unwrap(), 3);
    }

    #[test]
    fn test_number_parses_leading_digits() {
        assert_eq!(parse_leading_integer("12px"), Some(12));
        assert_eq!(parse_leading_integer("  -3"), Some(-3));
        assert_eq!(parse_leading_integer("px"), None);
        assert_eq!(parse_leading_integer("-"), None);
    }

    #[test]
    fn test_malformed_specs_are_errors() {
        let registry = ConfigRegistry::new();
        let attrs: HashMap<String, String> = HashMap::new();

        let bad_kind = [OptionSpec::new("maxTags", OptionKind::Number, "ten")];
        let err = registry
            .load("tagsInput", &attrs, Arc::new(Bus::new()), &bad_kind)
            .unwrap_err();
        assert!(matches!(err, ConfigError::DefaultKindMismatch { .. }));

        let duplicated = [
            OptionSpec::new("maxTags", OptionKind::Number, 1),
            OptionSpec::new("maxTags", OptionKind::Number, 2),
        ];
        let err = registry
            .load("tagsInput", &attrs, Arc::new(Bus::new()), &duplicated)
            .unwrap_err();
        assert_eq!(err, ConfigError::DuplicateOption { name: "maxTags".into() });
    }

    #[test]
    fn test_count_reads_unbounded_and_negative() {
        let mut record = OptionsRecord::default();
        record.set("maxTags", OptionValue::Number(i64::MAX));
        record.set("minTags", OptionValue::Number(-4));
        record.set("maxLength", OptionValue::Number(25));

        assert_eq!(record.count("maxTags").unwrap(), usize::MAX);
        assert_eq!(record.count("minTags").unwrap(), 0);
        assert_eq!(record.count("maxLength").unwrap(), 25);
    }

    #[test]
    fn test_record_type_errors() {
        let record = load(&ConfigRegistry::new(), &[]).record();
        assert!(matches!(record.boolean("minLength"), Err(ConfigError::TypeMismatch { .. })));
        assert_eq!(record.number("nope"), Err(ConfigError::unknown("nope")));
    }

    #[test]
    fn test_observe_publishes_option_change() {
        let registry = ConfigRegistry::new();
        registry.set_active_interpolation("tagsInput", ["minLength"]);
        let bus = Arc::new(Bus::new());
        let changes = Arc::new(Mutex::new(Vec::new()));

        let changes_clone = changes.clone();
        bus.on("option-change", move |event: &Event| {
            if let Event::OptionChange { name, value, .. } = event {
                changes_clone.lock().push((name.clone(), value.clone()));
            }
        })
        .unwrap();

        let attrs: HashMap<&str, &str> = HashMap::new();
        let loaded = registry.load("tagsInput", &attrs, bus, &specs()).unwrap();

        assert!(loaded.observe("minLength", Some("8")));
        assert!(!loaded.observe("addOnEnter", Some("false")));
        assert!(!loaded.observe("undeclared", Some("1")));

        assert_eq!(loaded.record().number("minLength").unwrap(), 8);
        assert!(loaded.record().boolean("addOnEnter").unwrap());
        assert_eq!(
            *changes.lock(),
            vec![("minLength".to_string(), OptionValue::Number(8))]
        );
    }
}
