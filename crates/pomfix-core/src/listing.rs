//! Sorted file listings handed to `javac` and `jar`.

use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};
use walkdir::WalkDir;

use crate::config::BuildConfig;
use crate::errors::{PomfixError, PomfixResult};
use crate::models::RewriteStatus;
use crate::rewrite::write_if_changed;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    /// `*.java` under the sources directory.
    Sources,
    /// `*.class` under the classes directory.
    Classes,
}

impl ListKind {
    pub fn extension(&self) -> &'static str {
        match self {
            ListKind::Sources => "java",
            ListKind::Classes => "class",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ListKind::Sources => "sourceFiles.lst",
            ListKind::Classes => "outputFiles.lst",
        }
    }

    fn search_root<'a>(&self, config: &'a BuildConfig) -> &'a Path {
        match self {
            ListKind::Sources => &config.sources_dir,
            ListKind::Classes => &config.classes_dir,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingReport {
    pub kind: ListKind,
    pub path: PathBuf,
    pub entries: usize,
    pub status: RewriteStatus,
}

/// Write the listing for `kind`, one path per line, sorted.
///
/// Paths are written relative to the project root when they live under it,
/// with `/` separators.
pub fn generate_list(kind: ListKind, config: &BuildConfig) -> PomfixResult<ListingReport> {
    let root = kind.search_root(config);
    if !root.is_dir() {
        return Err(PomfixError::NotFound {
            path: root.to_path_buf(),
        });
    }

    let mut entries = Vec::new();
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            match e.into_io_error() {
                Some(io) => PomfixError::from_io(&path, io),
                None => PomfixError::Io {
                    source: std::io::Error::other("filesystem loop"),
                    path,
                },
            }
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(kind.extension()) {
            continue;
        }
        trace!(file = %path.display(), "listed");
        entries.push(display_path(path, &config.root));
    }
    entries.sort();

    let output = config.listing_dir.join(kind.file_name());
    let mut body = String::new();
    for entry in &entries {
        body.push_str(entry);
        body.push('\n');
    }
    let status = write_if_changed(&output, &body)?;
    if status.changed() {
        info!(file = %output.display(), entries = entries.len(), "listing written");
    } else {
        debug!(file = %output.display(), "listing up to date");
    }

    Ok(ListingReport {
        kind,
        path: output,
        entries: entries.len(),
        status,
    })
}

fn display_path(path: &Path, root: &Path) -> String {
    let shown = path.strip_prefix(root).unwrap_or(path);
    shown
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
