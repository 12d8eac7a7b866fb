//! Asset manifest: the persisted dependency graph and block versions.
//!
//! # Structure
//!
//! ```text
//! Manifest
//! ├── assets: path → { version, versioned_path, deps }
//! └── blocks: block id → { version, versioned_path }
//! ```
//!
//! Two manifests exist per run: the *cached* one loaded from disk (read-only)
//! and the *current* one built fresh, which replaces the cached one on success.
//!
//! The JSON form is a durable contract shared with runtime rendering helpers:
//! keys are sorted and `deps` are written as sorted lists so unchanged trees
//! produce byte-identical files.

mod normalize;
mod store;

pub use normalize::normalize;
pub use store::ManifestStore;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize, Serializer};

use crate::utils::path::versioned_name;

/// One entry per distinct source or static file path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEntry {
    /// Content version, `None` until the version pass assigns it.
    pub version: Option<String>,
    /// `version` + original extension; the cache-busted public name.
    pub versioned_path: Option<String>,
    /// First-level dependencies. Unordered in memory; sorted on write.
    #[serde(default, serialize_with = "serialize_sorted")]
    pub deps: FxHashSet<PathBuf>,
}

impl AssetEntry {
    /// Skeleton entry created when a path is first encountered.
    pub fn skeleton() -> Self {
        Self::default()
    }

    /// Assign the version and derive the versioned path from `path`'s extension.
    pub fn assign_version(&mut self, path: &Path, version: String) {
        self.versioned_path = Some(versioned_name(&version, path));
        self.version = Some(version);
    }

    /// Dependencies in canonical (sorted) order.
    pub fn sorted_deps(&self) -> Vec<&PathBuf> {
        let mut deps: Vec<_> = self.deps.iter().collect();
        deps.sort();
        deps
    }
}

fn serialize_sorted<S: Serializer>(deps: &FxHashSet<PathBuf>, s: S) -> Result<S::Ok, S::Error> {
    let mut sorted: Vec<_> = deps.iter().collect();
    sorted.sort();
    s.collect_seq(sorted)
}

/// Version record of a compiled output unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEntry {
    pub version: String,
    pub versioned_path: String,
}

impl BlockEntry {
    /// Build an entry from a content hash and the block's target extension.
    pub fn new(version: String, extension: &str) -> Self {
        let versioned_path = format!("{}.{}", version, extension.trim_start_matches('.'));
        Self {
            version,
            versioned_path,
        }
    }
}

/// The persisted aggregate of asset and block versions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub assets: BTreeMap<PathBuf, AssetEntry>,
    #[serde(default)]
    pub blocks: BTreeMap<String, BlockEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded version of an asset, if any.
    pub fn version_of(&self, path: &Path) -> Option<&str> {
        self.assets.get(path)?.version.as_deref()
    }

    /// Public URL of a static asset: `static_url_prefix` + versioned path.
    ///
    /// This is the lookup rendering helpers perform at runtime.
    pub fn versioned_url(&self, static_url_prefix: &str, path: &Path) -> Option<String> {
        let versioned = self.assets.get(path)?.versioned_path.as_deref()?;
        Some(format!("{static_url_prefix}{versioned}"))
    }

    /// Serialize to the persisted JSON form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}
