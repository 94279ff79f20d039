//! `${key}` placeholder scanning and substitution.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::errors::{PomfixError, PomfixResult};
use crate::models::{resolve, ProjectNamespace};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([\w.\-\[\]]+)\}").unwrap());

/// What to do with a placeholder whose key has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Fail the whole rewrite.
    Strict,
    /// Leave the `${key}` token in place.
    Lenient,
}

/// Distinct placeholder keys in order of first appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in PLACEHOLDER_RE.captures_iter(text) {
        let key = &caps[1];
        if !seen.iter().any(|k: &String| k == key) {
            seen.push(key.to_string());
        }
    }
    seen
}

pub fn has_placeholder(text: &str) -> bool {
    PLACEHOLDER_RE.is_match(text)
}

/// Replace every placeholder in `text` with its namespace value.
///
/// Values are inserted verbatim in a single pass; a value that itself looks
/// like a placeholder is not expanded again. `target` only labels errors.
pub fn rewrite(
    text: &str,
    namespace: &ProjectNamespace,
    resolution: Resolution,
    target: &str,
) -> PomfixResult<String> {
    let mut values: HashMap<String, &str> = HashMap::new();
    for key in placeholders(text) {
        match resolve(namespace, &key) {
            Some(value) => {
                debug!(file = target, key = %key, value, "placeholder resolved");
                values.insert(key, value);
            }
            None if resolution == Resolution::Strict => {
                return Err(PomfixError::missing_key(key, target));
            }
            None => warn!(file = target, key = %key, "placeholder left unresolved"),
        }
    }

    let replaced = PLACEHOLDER_RE.replace_all(text, |caps: &Captures<'_>| {
        match values.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        }
    });
    Ok(replaced.into_owned())
}
