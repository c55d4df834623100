//! Header normalization and rendering.

use std::collections::{BTreeMap, BTreeSet};

use crate::transaction::Headers;

/// Environment keys copied even though they carry no `HTTP_` prefix.
const FIXED_KEYS: &[&str] = &["CONTENT_TYPE", "CONTENT_LENGTH", "LOCATION"];

/// Prefix the server driver puts on forwarded client headers.
const HTTP_PREFIX: &str = "HTTP_";

/// Rewrite a `SCREAMING_SNAKE`, `snake_case` or dashed key into `Header-Case`.
///
/// ```
/// use txdoc_core::header_case;
///
/// assert_eq!(header_case("CONTENT_TYPE"), "Content-Type");
/// assert_eq!(header_case("x_api_version"), "X-Api-Version");
/// assert_eq!(header_case("content-type"), "Content-Type");
/// ```
pub fn header_case(key: &str) -> String {
    key.split(['_', '-'])
        .map(|segment| {
            let lower = segment.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Build request headers from a CGI-style environment.
///
/// Merges the fixed allow-list with every `HTTP_`-prefixed entry (prefix
/// stripped, prefixed entries win), drops blank values and rewrites keys
/// to `Header-Case`.
pub(crate) fn headers_from_env(env: &BTreeMap<String, String>) -> Headers {
    let mut table: BTreeMap<&str, &str> = FIXED_KEYS
        .iter()
        .filter_map(|key| env.get_key_value(*key))
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();

    for (key, value) in env {
        if let Some(stripped) = key.strip_prefix(HTTP_PREFIX) {
            table.insert(stripped, value.as_str());
        }
    }

    table
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| (header_case(key), value.to_owned()))
        .collect()
}

/// Rewrite every key of a recorded header map into `Header-Case`.
pub(crate) fn normalize_header_keys(headers: &Headers) -> Headers {
    headers
        .iter()
        .map(|(key, value)| (header_case(key), value.clone()))
        .collect()
}

/// Render a header block: suppressed keys removed, one sorted `Key: value`
/// line per header.
pub(crate) fn render_header_block(headers: &Headers, suppressed: &BTreeSet<String>) -> String {
    let mut lines: Vec<String> = headers
        .iter()
        .filter(|(key, _)| !suppressed.contains(key.as_str()))
        .map(|(key, value)| format!("{key}: {value}"))
        .collect();
    lines.sort();
    lines.join("\n")
}
