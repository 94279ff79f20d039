//! Placeholder resolution and per-format output for the fixed targets.

pub mod keyvalue;
pub mod placeholder;
pub mod version;
pub mod xml;

use std::path::Path;

use tracing::{debug, info};

use crate::errors::{PomfixError, PomfixResult};
use crate::models::RewriteStatus;

pub use keyvalue::{KeyValueDocument, KeyValueStyle};
pub use placeholder::{placeholders, rewrite, Resolution};
pub use version::{fix_build_file, fix_version_line, ReleaseInfo};
pub use xml::render_xml_target;

/// Write `content` to `path` unless the file already holds exactly these
/// bytes. Parent directories are created as needed.
pub fn write_if_changed(path: &Path, content: &str) -> PomfixResult<RewriteStatus> {
    match std::fs::read(path) {
        Ok(existing) if existing == content.as_bytes() => {
            debug!(file = %path.display(), "up to date");
            return Ok(RewriteStatus::UpToDate);
        }
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(PomfixError::from_io(path, e)),
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PomfixError::from_io(parent, e))?;
    }
    std::fs::write(path, content).map_err(|e| PomfixError::from_io(path, e))?;
    info!(file = %path.display(), bytes = content.len(), "written");
    Ok(RewriteStatus::Changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_if_changed_creates_parents() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("target/classes/configuration/config.xml");
        assert_eq!(write_if_changed(&path, "<c/>\n").unwrap(), RewriteStatus::Changed);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<c/>\n");
    }

    #[test]
    fn test_write_if_changed_skips_identical() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "same").unwrap();
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(write_if_changed(&path, "same").unwrap(), RewriteStatus::UpToDate);
        let after = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_write_if_changed_overwrites_different() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        std::fs::write(&path, "old").unwrap();
        assert_eq!(write_if_changed(&path, "new").unwrap(), RewriteStatus::Changed);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }
}
