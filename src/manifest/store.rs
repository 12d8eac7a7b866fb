//! Durable storage for the manifest.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::Manifest;
use crate::core::BuildError;
use crate::log;
use crate::utils::path::write_atomic;

/// JSON manifest file at a fixed path.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cached manifest.
    ///
    /// A missing file is a first build. An unreadable or corrupt file is
    /// warned about and also treated as empty, which forces a full rebuild.
    pub fn load(&self) -> Manifest {
        match self.try_load() {
            Ok(Some(manifest)) => manifest,
            Ok(None) => Manifest::new(),
            Err(e) => {
                log!("warning"; "ignoring cached manifest: {}", error_chain(&e));
                Manifest::new()
            }
        }
    }

    fn try_load(&self) -> Result<Option<Manifest>, BuildError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BuildError::io(&self.path, e)),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| BuildError::Manifest {
                path: self.path.clone(),
                source,
            })
    }

    /// Replace the persisted manifest in one atomic step.
    pub fn save(&self, manifest: &Manifest) -> Result<(), BuildError> {
        let json = manifest.to_json().map_err(|source| BuildError::Manifest {
            path: self.path.clone(),
            source,
        })?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
        }
        write_atomic(&self.path, json.as_bytes()).map_err(|e| BuildError::io(&self.path, e))
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        msg.push_str(": ");
        msg.push_str(&cause.to_string());
        source = cause.source();
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{AssetEntry, BlockEntry};
    use tempfile::TempDir;

    fn sample() -> Manifest {
        let mut manifest = Manifest::new();
        let mut entry = AssetEntry::skeleton();
        entry.assign_version(Path::new("a.css"), "v1".into());
        manifest.assets.insert("a.css".into(), entry);
        manifest
            .blocks
            .insert("blk".into(), BlockEntry::new("v2".into(), "css"));
        manifest
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::new(dir.path().join("manifest.json"));
        assert_eq!(store.load(), Manifest::new());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(ManifestStore::new(&path).load(), Manifest::new());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::new(dir.path().join("out/manifest.json"));
        store.save(&sample()).unwrap();
        assert_eq!(store.load(), sample());
    }

    #[test]
    fn test_save_is_byte_stable() {
        let dir = TempDir::new().unwrap();
        let store = ManifestStore::new(dir.path().join("manifest.json"));
        store.save(&sample()).unwrap();
        let first = fs::read(store.path()).unwrap();
        store.save(&store.load()).unwrap();
        assert_eq!(fs::read(store.path()).unwrap(), first);
    }
}
