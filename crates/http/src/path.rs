//! Path-template substitution.
//!
//! Step definitions declare paths with OpenAPI-style placeholders
//! (`/orders/{orderId}`). Each resolved field is matched against the template
//! case-insensitively; matched values are percent-encoded and substituted,
//! and the caller excludes those fields from the request body.

use std::collections::HashSet;

use indexmap::IndexMap;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

/// Everything except RFC 3986 unreserved bytes gets percent-encoded.
const PLACEHOLDER_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Substitutes `{fieldName}` placeholders in the template with the resolved
/// field values, matching placeholder names case-insensitively.
///
/// Returns the substituted path and the set of field names consumed by it.
/// Placeholders with no matching field are left in place.
pub(crate) fn substitute_path_params(
    template: &str,
    fields: &IndexMap<String, Value>,
) -> (String, HashSet<String>) {
    let mut path = template.to_string();
    let mut consumed = HashSet::new();

    for (name, value) in fields {
        let placeholder = format!("{{{name}}}");
        let encoded = utf8_percent_encode(&value_text(value), PLACEHOLDER_ENCODE_SET).to_string();
        if let Some(replaced) = replace_ignore_ascii_case(&path, &placeholder, &encoded) {
            path = replaced;
            consumed.insert(name.clone());
        }
    }

    (path, consumed)
}

/// Joins a base URL and a substituted path with exactly one separator.
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// String form of a resolved value for path substitution: strings verbatim,
/// everything else via its JSON rendering.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Replaces every occurrence of `needle` in `haystack`, ignoring ASCII case;
/// `None` when nothing matched.
fn replace_ignore_ascii_case(haystack: &str, needle: &str, replacement: &str) -> Option<String> {
    let lower_haystack = haystack.to_ascii_lowercase();
    let lower_needle = needle.to_ascii_lowercase();

    let mut result = String::with_capacity(haystack.len());
    let mut cursor = 0;
    let mut matched = false;
    while let Some(offset) = lower_haystack[cursor..].find(&lower_needle) {
        let at = cursor + offset;
        result.push_str(&haystack[cursor..at]);
        result.push_str(replacement);
        cursor = at + needle.len();
        matched = true;
    }
    if !matched {
        return None;
    }
    result.push_str(&haystack[cursor..]);
    Some(result)
}
