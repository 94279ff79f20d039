//! On-disk cache of the project namespace, keyed by descriptor content hash.
//!
//! Layout inside the cache directory:
//!
//! * `pom-<md5>`: the namespace as 4-space indented JSON, keys sorted.
//! * `.CURRENT_POM`: the hash of the entry that is currently authoritative,
//!   as plain text.
//!
//! The build timestamp is never persisted; [`MetadataCache::load_or_build`]
//! stamps a fresh one on every call.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::hash::compute_content_hash;
use crate::descriptor::{extract, extractor::stamp, ProjectDescriptor};
use crate::errors::{PomfixError, PomfixResult};
use crate::models::{ProjectNamespace, TIMESTAMP_KEY};

pub const SENTINEL_FILE: &str = ".CURRENT_POM";
const ENTRY_PREFIX: &str = "pom-";

pub struct MetadataCache {
    dir: PathBuf,
}

impl MetadataCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn sentinel_path(&self) -> PathBuf {
        self.dir.join(SENTINEL_FILE)
    }

    pub fn entry_path(&self, hash: &str) -> PathBuf {
        self.dir.join(format!("{ENTRY_PREFIX}{hash}"))
    }

    /// Persist `namespace` under `hash` and point the sentinel at it.
    /// Returns the entry id.
    pub fn store(&self, namespace: &ProjectNamespace, hash: &str) -> PomfixResult<String> {
        std::fs::create_dir_all(&self.dir).map_err(|e| PomfixError::from_io(&self.dir, e))?;

        let mut persisted = namespace.clone();
        persisted.remove(TIMESTAMP_KEY);
        let entry = self.entry_path(hash);
        let body = to_indented_json(&persisted, &entry)?;
        std::fs::write(&entry, body).map_err(|e| PomfixError::from_io(&entry, e))?;

        let sentinel = self.sentinel_path();
        std::fs::write(&sentinel, hash).map_err(|e| PomfixError::from_io(&sentinel, e))?;

        info!(entry = %entry.display(), keys = persisted.len(), "cache entry written");
        Ok(hash.to_string())
    }

    /// Read a cache entry by id.
    pub fn load(&self, id: &str) -> PomfixResult<ProjectNamespace> {
        let entry = self.entry_path(id);
        let text = std::fs::read_to_string(&entry).map_err(|e| PomfixError::from_io(&entry, e))?;
        let namespace: ProjectNamespace = serde_json::from_str(&text)
            .map_err(|e| PomfixError::parse(&entry, format!("invalid cache entry: {e}")))?;
        debug!(entry = %entry.display(), keys = namespace.len(), "cache entry loaded");
        Ok(namespace)
    }

    /// Hash recorded in the sentinel, if there is one.
    pub fn current_hash(&self) -> PomfixResult<Option<String>> {
        read_sentinel(&self.sentinel_path())
    }

    /// Ensure the cache reflects `descriptor_path` and return its namespace,
    /// freshly stamped with the current build time.
    pub fn load_or_build(&self, descriptor_path: &Path) -> PomfixResult<ProjectNamespace> {
        let hash = compute_content_hash(descriptor_path)?;
        let recorded = self.current_hash()?;

        let mut namespace = match recorded {
            Some(ref current) if *current == hash && self.entry_path(&hash).is_file() => {
                debug!(hash = %hash, "cache is current");
                self.load(&hash)?
            }
            _ => {
                info!(
                    descriptor = %descriptor_path.display(),
                    previous = recorded.as_deref().unwrap_or("none"),
                    hash = %hash,
                    "cache is stale, rebuilding"
                );
                let descriptor = ProjectDescriptor::parse(descriptor_path)?;
                let namespace = extract(&descriptor);
                self.store(&namespace, &hash)?;
                namespace
            }
        };
        stamp(&mut namespace, Utc::now());
        Ok(namespace)
    }
}

/// True when the sentinel is missing or names a different hash than the
/// descriptor's current content.
pub fn is_stale(descriptor_path: &Path, sentinel_path: &Path) -> PomfixResult<bool> {
    let recorded = match read_sentinel(sentinel_path)? {
        Some(hash) => hash,
        None => return Ok(true),
    };
    Ok(compute_content_hash(descriptor_path)? != recorded)
}

fn read_sentinel(path: &Path) -> PomfixResult<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(Some(text.trim().to_string())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(PomfixError::from_io(path, e)),
    }
}

fn to_indented_json(namespace: &ProjectNamespace, path: &Path) -> PomfixResult<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    namespace
        .serialize(&mut ser)
        .map_err(|e| PomfixError::parse(path, e.to_string()))?;
    buf.push(b'\n');
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const POM: &str = "<project><name>JMatrix</name><version>1.2.0</version></project>";

    fn sample_namespace() -> ProjectNamespace {
        let mut ns = ProjectNamespace::new();
        ns.insert("project.version".to_string(), Some("1.2.0".to_string()));
        ns.insert("project.name".to_string(), Some("JMatrix".to_string()));
        ns.insert("project.url".to_string(), None);
        ns.insert(TIMESTAMP_KEY.to_string(), Some("2024-01-01T00:00:00Z".to_string()));
        ns
    }

    #[test]
    fn test_store_then_load() {
        let dir = TempDir::new().unwrap();
        let cache = MetadataCache::new(dir.path().join(".cache"));
        let id = cache.store(&sample_namespace(), "abc123").unwrap();
        assert_eq!(id, "abc123");

        let loaded = cache.load(&id).unwrap();
        assert_eq!(loaded["project.name"].as_deref(), Some("JMatrix"));
        assert_eq!(loaded["project.url"], None);
        assert!(!loaded.contains_key(TIMESTAMP_KEY));
        assert_eq!(cache.current_hash().unwrap().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_stored_json_is_sorted_and_indented() {
        let dir = TempDir::new().unwrap();
        let cache = MetadataCache::new(dir.path());
        cache.store(&sample_namespace(), "h").unwrap();
        let text = std::fs::read_to_string(cache.entry_path("h")).unwrap();
        assert_eq!(
            text,
            "{\n    \"project.name\": \"JMatrix\",\n    \"project.url\": null,\n    \"project.version\": \"1.2.0\"\n}\n"
        );
    }

    #[test]
    fn test_sentinel_is_plain_text() {
        let dir = TempDir::new().unwrap();
        let cache = MetadataCache::new(dir.path());
        cache.store(&sample_namespace(), "d41d8cd9").unwrap();
        assert_eq!(std::fs::read_to_string(cache.sentinel_path()).unwrap(), "d41d8cd9");
    }

    #[test]
    fn test_load_missing_entry() {
        let dir = TempDir::new().unwrap();
        let cache = MetadataCache::new(dir.path());
        let err = cache.load("nope").unwrap_err();
        assert!(matches!(err, PomfixError::NotFound { .. }));
    }

    #[test]
    fn test_load_malformed_entry() {
        let dir = TempDir::new().unwrap();
        let cache = MetadataCache::new(dir.path());
        std::fs::write(cache.entry_path("bad"), "{ not json").unwrap();
        let err = cache.load("bad").unwrap_err();
        assert!(matches!(err, PomfixError::Parse { .. }));
    }

    #[test]
    fn test_stale_without_sentinel() {
        let dir = TempDir::new().unwrap();
        let pom = dir.path().join("pom.xml");
        std::fs::write(&pom, POM).unwrap();
        assert!(is_stale(&pom, &dir.path().join(SENTINEL_FILE)).unwrap());
    }

    #[test]
    fn test_stale_after_byte_change() {
        let dir = TempDir::new().unwrap();
        let pom = dir.path().join("pom.xml");
        std::fs::write(&pom, POM).unwrap();
        let cache = MetadataCache::new(dir.path().join(".cache"));
        cache.load_or_build(&pom).unwrap();
        assert!(!is_stale(&pom, &cache.sentinel_path()).unwrap());

        std::fs::write(&pom, format!("{POM}\n")).unwrap();
        assert!(is_stale(&pom, &cache.sentinel_path()).unwrap());
    }

    #[test]
    fn test_rewrite_same_bytes_is_not_stale() {
        let dir = TempDir::new().unwrap();
        let pom = dir.path().join("pom.xml");
        std::fs::write(&pom, POM).unwrap();
        let cache = MetadataCache::new(dir.path().join(".cache"));
        cache.load_or_build(&pom).unwrap();
        std::fs::write(&pom, POM).unwrap();
        assert!(!is_stale(&pom, &cache.sentinel_path()).unwrap());
    }

    #[test]
    fn test_load_or_build_uses_cache_when_current() {
        let dir = TempDir::new().unwrap();
        let pom = dir.path().join("pom.xml");
        std::fs::write(&pom, POM).unwrap();
        let cache = MetadataCache::new(dir.path().join(".cache"));
        let first = cache.load_or_build(&pom).unwrap();
        assert_eq!(first["project.name"].as_deref(), Some("JMatrix"));
        assert!(first.contains_key(TIMESTAMP_KEY));

        // Tamper with the entry: a current cache is read, not rebuilt.
        let hash = cache.current_hash().unwrap().unwrap();
        let mut tampered = cache.load(&hash).unwrap();
        tampered.insert("project.name".to_string(), Some("Cached".to_string()));
        cache.store(&tampered, &hash).unwrap();

        let second = cache.load_or_build(&pom).unwrap();
        assert_eq!(second["project.name"].as_deref(), Some("Cached"));
    }

    #[test]
    fn test_load_or_build_rebuilds_missing_entry() {
        let dir = TempDir::new().unwrap();
        let pom = dir.path().join("pom.xml");
        std::fs::write(&pom, POM).unwrap();
        let cache = MetadataCache::new(dir.path().join(".cache"));
        cache.load_or_build(&pom).unwrap();
        let hash = cache.current_hash().unwrap().unwrap();
        std::fs::remove_file(cache.entry_path(&hash)).unwrap();

        let ns = cache.load_or_build(&pom).unwrap();
        assert_eq!(ns["project.version"].as_deref(), Some("1.2.0"));
        assert!(cache.entry_path(&hash).is_file());
    }

    #[test]
    fn test_load_or_build_rebuilds_after_change() {
        let dir = TempDir::new().unwrap();
        let pom = dir.path().join("pom.xml");
        std::fs::write(&pom, POM).unwrap();
        let cache = MetadataCache::new(dir.path().join(".cache"));
        cache.load_or_build(&pom).unwrap();

        std::fs::write(&pom, POM.replace("1.2.0", "1.3.0")).unwrap();
        let ns = cache.load_or_build(&pom).unwrap();
        assert_eq!(ns["project.version"].as_deref(), Some("1.3.0"));
    }

    #[test]
    fn test_load_or_build_bad_descriptor() {
        let dir = TempDir::new().unwrap();
        let pom = dir.path().join("pom.xml");
        std::fs::write(&pom, "<project>").unwrap();
        let cache = MetadataCache::new(dir.path().join(".cache"));
        let err = cache.load_or_build(&pom).unwrap_err();
        assert!(matches!(err, PomfixError::Parse { .. }));
        assert!(cache.current_hash().unwrap().is_none());
    }
}
