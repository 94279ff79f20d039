//! Paths and switches for one pipeline run.
//!
//! Nothing in the library reads global state; every component receives the
//! [`BuildConfig`] (or the single path it needs) from its caller.

use std::path::{Path, PathBuf};

use crate::models::TargetKind;

pub const DEFAULT_DESCRIPTOR: &str = "pom.xml";
pub const DEFAULT_CACHE_DIR: &str = "target/.cache";
pub const DEFAULT_XML_TEMPLATE: &str = "src/main/resources/configuration/config.xml";
pub const DEFAULT_XML_OUTPUT: &str = "target/classes/configuration/config.xml";
pub const DEFAULT_BUILD_FILE: &str = "Makefile";
pub const DEFAULT_BUILD_FILE_KEYWORD: &str = "VERSION";
pub const DEFAULT_MANIFEST: &str = "META-INF/MANIFEST.MF";
pub const DEFAULT_MANIFEST_VERSION_KEY: &str = "Version";
pub const DEFAULT_SOURCES_DIR: &str = "src/main/java";
pub const DEFAULT_CLASSES_DIR: &str = "target/classes";
pub const DEFAULT_LISTING_DIR: &str = "target/generated-list";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub root: PathBuf,
    pub descriptor: PathBuf,
    pub cache_dir: PathBuf,
    pub xml_template: Option<PathBuf>,
    pub xml_output: PathBuf,
    pub build_file: Option<PathBuf>,
    pub build_file_keyword: String,
    pub manifest: Option<PathBuf>,
    /// Where the filled manifest goes; `None` rewrites it in place.
    pub manifest_output: Option<PathBuf>,
    pub manifest_version_key: String,
    pub sources_dir: PathBuf,
    pub classes_dir: PathBuf,
    pub listing_dir: PathBuf,
}

impl BuildConfig {
    /// Conventional project layout rooted at `root`.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            descriptor: root.join(DEFAULT_DESCRIPTOR),
            cache_dir: root.join(DEFAULT_CACHE_DIR),
            xml_template: Some(root.join(DEFAULT_XML_TEMPLATE)),
            xml_output: root.join(DEFAULT_XML_OUTPUT),
            build_file: Some(root.join(DEFAULT_BUILD_FILE)),
            build_file_keyword: DEFAULT_BUILD_FILE_KEYWORD.to_string(),
            manifest: Some(root.join(DEFAULT_MANIFEST)),
            manifest_output: None,
            manifest_version_key: DEFAULT_MANIFEST_VERSION_KEY.to_string(),
            sources_dir: root.join(DEFAULT_SOURCES_DIR),
            classes_dir: root.join(DEFAULT_CLASSES_DIR),
            listing_dir: root.join(DEFAULT_LISTING_DIR),
            root,
        }
    }

    pub fn with_descriptor(mut self, path: impl AsRef<Path>) -> Self {
        self.descriptor = self.resolve(path);
        self
    }

    pub fn with_cache_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.cache_dir = self.resolve(path);
        self
    }

    /// Disable one of the pipeline targets.
    pub fn skip(&mut self, kind: TargetKind) {
        match kind {
            TargetKind::Xml => self.xml_template = None,
            TargetKind::BuildFile => self.build_file = None,
            TargetKind::Manifest => self.manifest = None,
            // Not a pipeline target.
            TargetKind::Properties => {}
        }
    }

    pub fn is_enabled(&self, kind: TargetKind) -> bool {
        match kind {
            TargetKind::Xml => self.xml_template.is_some(),
            TargetKind::BuildFile => self.build_file.is_some(),
            TargetKind::Manifest => self.manifest.is_some(),
            TargetKind::Properties => false,
        }
    }

    /// Relative paths are taken against the project root.
    fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_root_layout() {
        let config = BuildConfig::from_root("/work/jmatrix");
        assert_eq!(config.descriptor, PathBuf::from("/work/jmatrix/pom.xml"));
        assert_eq!(config.cache_dir, PathBuf::from("/work/jmatrix/target/.cache"));
        assert_eq!(
            config.xml_output,
            PathBuf::from("/work/jmatrix/target/classes/configuration/config.xml")
        );
        assert_eq!(config.build_file_keyword, "VERSION");
        assert_eq!(config.manifest_version_key, "Version");
        assert!(config.manifest_output.is_none());
    }

    #[test]
    fn test_skip_disables_target() {
        let mut config = BuildConfig::from_root("/p");
        assert!(config.is_enabled(TargetKind::BuildFile));
        config.skip(TargetKind::BuildFile);
        assert!(!config.is_enabled(TargetKind::BuildFile));
        assert!(config.is_enabled(TargetKind::Xml));
        assert!(config.is_enabled(TargetKind::Manifest));
    }

    #[test]
    fn test_overrides_resolve_against_root() {
        let config = BuildConfig::from_root("/p")
            .with_descriptor("build/pom.xml")
            .with_cache_dir("/tmp/cache");
        assert_eq!(config.descriptor, PathBuf::from("/p/build/pom.xml"));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/cache"));
    }
}
