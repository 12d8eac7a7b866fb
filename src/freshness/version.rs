//! Merkle-style content versions for every asset in a manifest.
//!
//! ```text
//! version(node) = H( hex(H(bytes(node))) ‖ version(dep_1) ‖ … ‖ version(dep_k) )
//! ```
//!
//! Dependencies are sorted before hashing so the result depends only on the
//! *set* of dependency versions, never on traversal or hash-set order.

use std::path::{Path, PathBuf};

use rustc_hash::{FxHashMap, FxHashSet};

use super::hash::{ContentHash, hash_file};
use crate::core::BuildError;
use crate::manifest::Manifest;

/// Computes versions over an already-resolved manifest.
///
/// Reads the graph immutably and memoizes per path, then writes every version
/// back in one pass. Must only run after dependency resolution completes.
pub struct VersionHasher<'a> {
    manifest: &'a Manifest,
    memo: FxHashMap<PathBuf, String>,
    visiting: FxHashSet<PathBuf>,
}

impl<'a> VersionHasher<'a> {
    pub fn new(manifest: &'a Manifest) -> Self {
        Self {
            manifest,
            memo: FxHashMap::default(),
            visiting: FxHashSet::default(),
        }
    }

    /// Version of a single path, computing its dependencies first.
    pub fn version(&mut self, path: &Path) -> Result<String, BuildError> {
        self.version_from(path, path)
    }

    fn version_from(&mut self, path: &Path, parent: &Path) -> Result<String, BuildError> {
        if let Some(version) = self.memo.get(path) {
            return Ok(version.clone());
        }
        let manifest = self.manifest;
        let entry = manifest
            .assets
            .get(path)
            .ok_or_else(|| BuildError::Dependency {
                origin: parent.to_path_buf(),
                missing: vec![path.to_path_buf()],
            })?;

        if !self.visiting.insert(path.to_path_buf()) {
            return Err(BuildError::Cycle {
                cycle: vec![parent.to_path_buf(), path.to_path_buf()],
            });
        }

        let own = hash_file(path).map_err(|e| BuildError::io(path, e))?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(own.to_hex().as_bytes());
        for dep in entry.sorted_deps() {
            let dep_version = self.version_from(dep, path)?;
            hasher.update(dep_version.as_bytes());
        }
        let version = ContentHash::from(hasher.finalize()).to_hex();

        self.visiting.remove(path);
        self.memo.insert(path.to_path_buf(), version.clone());
        Ok(version)
    }

    /// Consume the hasher, returning every computed version.
    pub fn into_versions(self) -> FxHashMap<PathBuf, String> {
        self.memo
    }
}

/// Assign `version` and `versioned_path` to every asset in the manifest.
pub fn assign_versions(manifest: &mut Manifest) -> Result<(), BuildError> {
    let versions = {
        let mut hasher = VersionHasher::new(manifest);
        for path in manifest.assets.keys() {
            hasher.version(path)?;
        }
        hasher.into_versions()
    };

    for (path, entry) in manifest.assets.iter_mut() {
        if let Some(version) = versions.get(path) {
            entry.assign_version(path, version.clone());
        }
    }
    Ok(())
}
