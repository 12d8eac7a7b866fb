//! Content hashing using blake3.
//!
//! All versions in the manifest are derived from [`ContentHash`] values, so
//! every digest in the crate goes through this module.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hash an in-memory buffer.
    pub fn of(data: impl AsRef<[u8]>) -> Self {
        Self(*blake3::hash(data.as_ref()).as_bytes())
    }

    /// Convert to hex string. This is the form stored in the manifest.
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl From<blake3::Hash> for ContentHash {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Display first 16 chars of hex for brevity
        write!(f, "{}", &self.to_hex()[..16])
    }
}

/// Compute the blake3 hash of a file, streaming its contents.
pub fn hash_file(path: &Path) -> io::Result<ContentHash> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buffer[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_content_hash_display() {
        let hash = ContentHash::of("body{color:red}");
        assert_eq!(hash.to_hex().len(), 64);
        assert_eq!(format!("{}", hash), hash.to_hex()[..16]);
    }

    #[test]
    fn test_hash_file_matches_in_memory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.css");
        fs::write(&path, "body{color:red}").unwrap();

        assert_eq!(hash_file(&path).unwrap(), ContentHash::of("body{color:red}"));

        fs::write(&path, "body{color:blue}").unwrap();
        assert_ne!(hash_file(&path).unwrap(), ContentHash::of("body{color:red}"));
    }

    #[test]
    fn test_hash_file_nonexistent() {
        let err = hash_file(Path::new("/nonexistent/file.txt")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
