//! Manifest (`key: value`) and properties (`key = value`) targets.
//!
//! Both are parsed into an insertion-ordered map so the rewritten file keeps
//! the declaration order of the input. Comments and blank lines are not
//! preserved.

use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::errors::{PomfixError, PomfixResult};
use crate::models::{resolve, ProjectNamespace};
use crate::rewrite::placeholder::{has_placeholder, rewrite, Resolution};

/// Manifest key whose placeholder expands to `groupId:artifactId`.
const ID_KEY: &str = "ID";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyValueStyle {
    /// `Key: value`, continuation lines start with a single space.
    Manifest,
    /// `key = value` (input may use `=` or `:`), `#` and `!` comments.
    Properties,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueDocument {
    style: KeyValueStyle,
    entries: IndexMap<String, String>,
}

impl KeyValueDocument {
    pub fn parse(text: &str, style: KeyValueStyle, origin: &Path) -> PomfixResult<Self> {
        let mut entries: IndexMap<String, String> = IndexMap::new();
        let mut last_key: Option<String> = None;

        for (index, line) in text.lines().enumerate() {
            if style == KeyValueStyle::Manifest {
                if let (Some(rest), Some(key)) = (line.strip_prefix(' '), last_key.as_ref()) {
                    if let Some(value) = entries.get_mut(key) {
                        value.push_str(rest);
                    }
                    continue;
                }
            }

            let trimmed = line.trim();
            if trimmed.is_empty() || is_comment(trimmed, style) {
                continue;
            }

            let entry = match style {
                KeyValueStyle::Manifest => line.trim_start(),
                KeyValueStyle::Properties => trimmed,
            };
            let (key, value) = split_entry(entry, style).ok_or_else(|| {
                PomfixError::parse(
                    origin,
                    format!("line {}: expected a key/value pair, got {trimmed:?}", index + 1),
                )
            })?;
            entries.insert(key.to_string(), value.to_string());
            last_key = Some(key.to_string());
        }

        // Trailing space is significant until continuation lines are joined.
        for value in entries.values_mut() {
            let end = value.trim_end().len();
            value.truncate(end);
        }
        Ok(Self { style, entries })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) -> bool {
        match self.entries.get_mut(key) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve placeholders in every value.
    ///
    /// Manifests leave unknown keys literal; properties fail on the first
    /// unknown key without changing the document.
    pub fn fill(&mut self, namespace: &ProjectNamespace, target: &str) -> PomfixResult<()> {
        let style = self.style;
        let resolution = match style {
            KeyValueStyle::Manifest => Resolution::Lenient,
            KeyValueStyle::Properties => Resolution::Strict,
        };
        let mut filled = self.entries.clone();
        for (key, value) in filled.iter_mut() {
            if !has_placeholder(value) {
                continue;
            }
            if style == KeyValueStyle::Manifest && key == ID_KEY {
                match (
                    resolve(namespace, "project.groupId"),
                    resolve(namespace, "project.artifactId"),
                ) {
                    (Some(group), Some(artifact)) => {
                        *value = format!("{group}:{artifact}");
                        debug!(file = target, key = %key, value = %value, "manifest id filled");
                    }
                    _ => warn!(file = target, key = %key, "project id unknown, left unresolved"),
                }
                continue;
            }
            *value = rewrite(value, namespace, resolution, target)?;
        }
        self.entries = filled;
        Ok(())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.entries {
            out.push_str(key);
            out.push_str(match self.style {
                KeyValueStyle::Manifest => ": ",
                KeyValueStyle::Properties => " = ",
            });
            out.push_str(value);
            out.push('\n');
        }
        out
    }
}

fn is_comment(line: &str, style: KeyValueStyle) -> bool {
    match style {
        KeyValueStyle::Manifest => line.starts_with('#'),
        KeyValueStyle::Properties => line.starts_with('#') || line.starts_with('!'),
    }
}

fn split_entry(line: &str, style: KeyValueStyle) -> Option<(&str, &str)> {
    let at = match style {
        KeyValueStyle::Manifest => line.find(':')?,
        KeyValueStyle::Properties => line.find(['=', ':'])?,
    };
    let key = line[..at].trim();
    if key.is_empty() {
        return None;
    }
    let value = &line[at + 1..];
    match style {
        KeyValueStyle::Manifest => Some((key, value.trim_start())),
        KeyValueStyle::Properties => Some((key, value.trim())),
    }
}
