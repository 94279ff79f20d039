//! Content hashing used as the cache key.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use md5::{Digest, Md5};

use crate::errors::{PomfixError, PomfixResult};

/// MD5 of the file's exact bytes, as lowercase hex.
///
/// The file is streamed through the hasher rather than read whole.
pub fn compute_content_hash(path: &Path) -> PomfixResult<String> {
    let file = File::open(path).map_err(|e| PomfixError::from_io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Md5::new();
    io::copy(&mut reader, &mut hasher).map_err(|e| PomfixError::from_io(path, e))?;
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_bytes(data: &[u8]) -> String {
        let mut hasher = Md5::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    #[test]
    fn test_hash_bytes_known_value() {
        assert_eq!(hash_bytes(b""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(hash_bytes(b"hello"), "5d41402abc4b2a76b9719d911017c592");
    }

    #[test]
    fn test_file_hash_matches_bytes_hash() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pom.xml");
        std::fs::write(&path, "<project/>\r\n").unwrap();
        assert_eq!(
            compute_content_hash(&path).unwrap(),
            hash_bytes(b"<project/>\r\n")
        );
    }

    #[test]
    fn test_whitespace_changes_hash() {
        assert_ne!(hash_bytes(b"<project/>\n"), hash_bytes(b"<project/>\r\n"));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = compute_content_hash(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, PomfixError::NotFound { .. }));
    }
}
