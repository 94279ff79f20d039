//! Keep a build file's version declaration in sync with the descriptor.

use std::path::Path;

use tracing::{debug, info};

use crate::errors::{PomfixError, PomfixResult};
use crate::models::{resolve, ProjectNamespace, RewriteStatus, VersionFix};
use crate::rewrite::write_if_changed;

pub const VERSION_KEY: &str = "project.version";
pub const RELEASE_TYPE_KEY: &str = "package.releaseType";
pub const BETA_NUM_KEY: &str = "package.betaNum";

const RELEASE: &str = "release";

/// Version and pre-release information read from the namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseInfo {
    pub version: String,
    pub release_type: String,
    pub beta_num: Option<String>,
}

impl ReleaseInfo {
    pub fn from_namespace(namespace: &ProjectNamespace) -> PomfixResult<Self> {
        let version = resolve(namespace, VERSION_KEY)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| PomfixError::missing_key(VERSION_KEY, "version declaration"))?
            .to_string();
        let release_type = resolve(namespace, RELEASE_TYPE_KEY)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(RELEASE)
            .to_string();
        let beta_num = resolve(namespace, BETA_NUM_KEY)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        if release_type != RELEASE && beta_num.is_none() {
            return Err(PomfixError::missing_key(BETA_NUM_KEY, "version declaration"));
        }
        Ok(Self {
            version,
            release_type,
            beta_num,
        })
    }

    /// `1.2.0` for releases, `1.2.0-beta.3` otherwise.
    pub fn resolved_version(&self) -> String {
        match (&self.beta_num, self.release_type.as_str()) {
            (_, RELEASE) | (None, _) => self.version.clone(),
            (Some(num), kind) => format!("{}-{}.{}", self.version, kind, num),
        }
    }
}

/// Point the first `keyword` line at the resolved version.
///
/// Only the line's trailing token is replaced; the rest of the line,
/// including its spacing, is kept as is.
pub fn fix_version_line(
    lines: &[String],
    namespace: &ProjectNamespace,
    keyword: &str,
    origin: &Path,
) -> PomfixResult<VersionFix> {
    let resolved = ReleaseInfo::from_namespace(namespace)?.resolved_version();

    let index = lines
        .iter()
        .position(|line| line.split_whitespace().next() == Some(keyword))
        .ok_or_else(|| PomfixError::VersionDeclarationNotFound {
            keyword: keyword.to_string(),
            path: origin.to_path_buf(),
        })?;

    let line = &lines[index];
    let mut updated = lines.to_vec();
    let (current, rewritten) = match last_token_span(line) {
        Some((start, end)) => (
            &line[start..end],
            format!("{}{}{}", &line[..start], resolved, &line[end..]),
        ),
        // Keyword without a value: append one.
        None => ("", format!("{} {}", line.trim_end(), resolved)),
    };
    if current == resolved {
        debug!(file = %origin.display(), version = %resolved, "version line up to date");
        return Ok(VersionFix {
            changed: false,
            lines: updated,
        });
    }

    info!(
        file = %origin.display(),
        from = current,
        to = %resolved,
        "version line rewritten"
    );
    updated[index] = rewritten;
    Ok(VersionFix {
        changed: true,
        lines: updated,
    })
}

/// Byte span of the last whitespace-delimited token, or `None` when the
/// line holds nothing but the keyword.
fn last_token_span(line: &str) -> Option<(usize, usize)> {
    if line.split_whitespace().nth(1).is_none() {
        return None;
    }
    let end = line.trim_end().len();
    let head = &line[..end];
    let start = head
        .rfind(char::is_whitespace)
        .map(|i| i + head[i..].chars().next().map_or(1, char::len_utf8))?;
    Some((start, end))
}

/// Apply [`fix_version_line`] to a file on disk, writing only on change.
pub fn fix_build_file(
    path: &Path,
    namespace: &ProjectNamespace,
    keyword: &str,
) -> PomfixResult<RewriteStatus> {
    let text = std::fs::read_to_string(path).map_err(|e| PomfixError::from_io(path, e))?;
    let (lines, terminators) = split_keep_terminators(&text);
    let fix = fix_version_line(&lines, namespace, keyword, path)?;
    if !fix.changed {
        return Ok(RewriteStatus::UpToDate);
    }
    let mut out = String::with_capacity(text.len() + 16);
    for (line, term) in fix.lines.iter().zip(terminators.iter()) {
        out.push_str(line);
        out.push_str(term);
    }
    write_if_changed(path, &out)
}

fn split_keep_terminators(text: &str) -> (Vec<String>, Vec<&str>) {
    let mut lines = Vec::new();
    let mut terms = Vec::new();
    for raw in text.split_inclusive('\n') {
        let (body, term) = if let Some(body) = raw.strip_suffix("\r\n") {
            (body, "\r\n")
        } else if let Some(body) = raw.strip_suffix('\n') {
            (body, "\n")
        } else {
            (raw, "")
        };
        lines.push(body.to_string());
        terms.push(term);
    }
    (lines, terms)
}
