//! Comparison and normalization helpers shared by the tag and suggestion lists.
//!
//! Every case-insensitive identity comparison in the crate goes through
//! [`same_text`] so duplicate detection, suggestion filtering and option
//! matching agree on what "equal" means.

use regex::{Captures, RegexBuilder};
use serde_json::Value;

use crate::tag::Tag;

/// Case-insensitive string equality.
pub fn same_text(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Case-insensitive equality, optionally treating whitespace runs as dashes first.
pub fn same_identity(a: &str, b: &str, dashes: bool) -> bool {
    if dashes {
        same_text(&replace_spaces_with_dashes(a), &replace_spaces_with_dashes(b))
    } else {
        same_text(a, b)
    }
}

/// Replace every run of whitespace with a single `-`.
pub fn replace_spaces_with_dashes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Escape `&`, `<` and `>` for safe inclusion in markup.
pub fn encode_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// HTML-encode `text` and wrap every case-insensitive occurrence of `query` in `<em>`.
///
/// Entities produced by the encoding are never split by a highlight.
pub fn safe_highlight(text: &str, query: &str) -> String {
    let text = encode_html(text);
    let query = encode_html(query);
    if query.is_empty() {
        return text;
    }

    let pattern = format!("&[^;]+;|{}", regex::escape(&query));
    let Ok(expression) = RegexBuilder::new(&pattern).case_insensitive(true).build() else {
        return text;
    };
    expression
        .replace_all(&text, |caps: &Captures<'_>| {
            let matched = &caps[0];
            if same_text(matched, &query) {
                format!("<em>{matched}</em>")
            } else {
                matched.to_string()
            }
        })
        .into_owned()
}

/// String form of a record value: strings verbatim, null as empty, everything else via JSON.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Position of the first record whose `field` matches `needle`'s.
///
/// Duplicate identities already present in `records` resolve to the first one.
pub fn find_in_records(records: &[Tag], needle: &Tag, field: &str, dashes: bool) -> Option<usize> {
    let wanted = needle.text(field);
    records
        .iter()
        .position(|record| same_identity(&record.text(field), &wanted, dashes))
}
