//! Shared data types passed between the descriptor, cache, rewrite and
//! pipeline layers.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Key under which the build time is stamped into every namespace.
pub const TIMESTAMP_KEY: &str = "maven.build.timestamp";

/// Format of [`TIMESTAMP_KEY`] values (UTC, second precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Flat dotted-key view of the project descriptor.
///
/// A `None` value means the descriptor lacks that node. Keys are kept
/// sorted so serialization is deterministic.
pub type ProjectNamespace = BTreeMap<String, Option<String>>;

/// Look up a key and return its value only when it is present and non-null.
pub fn resolve<'a>(namespace: &'a ProjectNamespace, key: &str) -> Option<&'a str> {
    namespace.get(key).and_then(|v| v.as_deref())
}

/// The kinds of file the pipeline knows how to fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Xml,
    BuildFile,
    Manifest,
    Properties,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Xml => "xml",
            TargetKind::BuildFile => "build-file",
            TargetKind::Manifest => "manifest",
            TargetKind::Properties => "properties",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a rewrite touched the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStatus {
    Changed,
    UpToDate,
}

impl RewriteStatus {
    pub fn changed(&self) -> bool {
        matches!(self, RewriteStatus::Changed)
    }
}

/// Result of fixing one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReport {
    pub kind: TargetKind,
    pub path: PathBuf,
    pub status: RewriteStatus,
}

/// Terminal state of a fix-all run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    /// Every configured target was processed.
    Done { reports: Vec<TargetReport> },
    /// The build file's version line was rewritten; the caller must stop the
    /// current build pass and run the whole pipeline again.
    RestartRequired {
        path: PathBuf,
        reports: Vec<TargetReport>,
    },
}

impl FixOutcome {
    pub fn reports(&self) -> &[TargetReport] {
        match self {
            FixOutcome::Done { reports } => reports,
            FixOutcome::RestartRequired { reports, .. } => reports,
        }
    }

    pub fn restart_required(&self) -> bool {
        matches!(self, FixOutcome::RestartRequired { .. })
    }
}

/// Result of scanning a set of lines for a version declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFix {
    pub changed: bool,
    pub lines: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_skips_null_values() {
        let mut ns = ProjectNamespace::new();
        ns.insert("project.name".to_string(), Some("JMatrix".to_string()));
        ns.insert("project.url".to_string(), None);
        assert_eq!(resolve(&ns, "project.name"), Some("JMatrix"));
        assert_eq!(resolve(&ns, "project.url"), None);
        assert_eq!(resolve(&ns, "project.version"), None);
    }

    #[test]
    fn test_outcome_reports() {
        let report = TargetReport {
            kind: TargetKind::BuildFile,
            path: PathBuf::from("Makefile"),
            status: RewriteStatus::Changed,
        };
        let outcome = FixOutcome::RestartRequired {
            path: PathBuf::from("Makefile"),
            reports: vec![report.clone()],
        };
        assert!(outcome.restart_required());
        assert_eq!(outcome.reports(), &[report]);
    }
}
