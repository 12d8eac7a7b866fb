//! Structural validation of a freshly built manifest.

use super::Manifest;
use crate::core::BuildError;

/// Check the manifest before anything downstream trusts it.
///
/// Every dependency must have its own entry, and every asset and block must
/// carry a version. A violation means the resolver or hasher is broken, so
/// the first one found is returned as fatal.
pub fn normalize(manifest: &Manifest) -> Result<(), BuildError> {
    for (path, entry) in &manifest.assets {
        let missing: Vec<_> = entry
            .sorted_deps()
            .into_iter()
            .filter(|dep| !manifest.assets.contains_key(*dep))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return Err(BuildError::Dependency {
                origin: path.clone(),
                missing,
            });
        }
        if entry.version.is_none() || entry.versioned_path.is_none() {
            return Err(BuildError::Invariant(format!(
                "asset {} has no version",
                path.display()
            )));
        }
    }
    for (id, block) in &manifest.blocks {
        if block.version.is_empty() {
            return Err(BuildError::Invariant(format!("block {id} has no version")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{AssetEntry, BlockEntry};
    use std::path::{Path, PathBuf};

    fn versioned(deps: &[&str]) -> AssetEntry {
        let mut entry = AssetEntry::skeleton();
        entry.deps = deps.iter().map(PathBuf::from).collect();
        entry.assign_version(Path::new("x.css"), "v".into());
        entry
    }

    #[test]
    fn test_valid_manifest_passes() {
        let mut manifest = Manifest::new();
        manifest.assets.insert("a.css".into(), versioned(&[]));
        manifest.assets.insert("b.less".into(), versioned(&["a.css"]));
        manifest
            .blocks
            .insert("id".into(), BlockEntry::new("v".into(), "css"));
        assert!(normalize(&manifest).is_ok());
    }

    #[test]
    fn test_dangling_dep_is_dependency_error() {
        let mut manifest = Manifest::new();
        manifest.assets.insert("b.less".into(), versioned(&["a.css"]));
        match normalize(&manifest).unwrap_err() {
            BuildError::Dependency { origin, missing } => {
                assert_eq!(origin, PathBuf::from("b.less"));
                assert_eq!(missing, vec![PathBuf::from("a.css")]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unversioned_asset_is_invariant_error() {
        let mut manifest = Manifest::new();
        manifest
            .assets
            .insert("a.css".into(), AssetEntry::skeleton());
        assert!(matches!(
            normalize(&manifest),
            Err(BuildError::Invariant(_))
        ));
    }

    #[test]
    fn test_unversioned_block_is_invariant_error() {
        let mut manifest = Manifest::new();
        manifest.blocks.insert(
            "id".into(),
            BlockEntry {
                version: String::new(),
                versioned_path: String::new(),
            },
        );
        assert!(matches!(
            normalize(&manifest),
            Err(BuildError::Invariant(_))
        ));
    }
}
