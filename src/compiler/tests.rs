//! Test doubles for the collaborator traits, plus tests of the shared helpers.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rustc_hash::FxHashMap;
use tempfile::TempDir;

use super::*;
use crate::core::CancelToken;
use crate::manifest::{AssetEntry, BlockEntry};

/// Block that concatenates its dependency files verbatim.
#[derive(Debug, Clone)]
pub struct FakeBlock {
    id: String,
    paths: Vec<PathBuf>,
    output_dir: PathBuf,
    fail: bool,
    cancel: Option<CancelToken>,
    compiles: Arc<AtomicUsize>,
}

impl FakeBlock {
    pub fn new(id: &str, paths: &[&str]) -> Self {
        Self::with_paths(id, paths.iter().map(PathBuf::from).collect(), Path::new("assets"))
    }

    pub fn with_paths(id: &str, paths: Vec<PathBuf>, output_dir: &Path) -> Self {
        Self {
            id: id.to_string(),
            paths,
            output_dir: output_dir.to_path_buf(),
            fail: false,
            cancel: None,
            compiles: Arc::default(),
        }
    }

    /// Make every compile fail.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Cancel `token` from inside `compile`, as a Ctrl+C mid-batch would.
    pub fn cancelling(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Shared counter of compile calls (clones share it).
    pub fn compile_count(&self) -> Arc<AtomicUsize> {
        self.compiles.clone()
    }
}

impl Block for FakeBlock {
    fn id(&self) -> &str {
        &self.id
    }

    fn dependency_paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn extension(&self) -> &str {
        "js"
    }

    fn compiled_output_path(&self, manifest: &Manifest) -> Result<PathBuf, BuildError> {
        let entry = manifest
            .blocks
            .get(&self.id)
            .ok_or_else(|| BuildError::Invariant(format!("block {} not in manifest", self.id)))?;
        Ok(self.output_dir.join(&entry.versioned_path))
    }

    fn current_content_hash(&self, manifest: &Manifest) -> Result<String, BuildError> {
        hash_dependency_versions(Path::new(&self.id), "fake", &self.paths, manifest)
    }

    fn compile(&self, _manifest: &Manifest, _inline_images: bool) -> Result<Vec<u8>, BuildError> {
        self.compiles.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.cancel {
            token.cancel();
        }
        if self.fail {
            return Err(BuildError::compile(format!("fake {}", self.id), "boom"));
        }
        let mut out = Vec::new();
        for path in &self.paths {
            out.extend(fs::read(path).map_err(|e| BuildError::io(path, e))?);
        }
        Ok(out)
    }
}

/// Parser that hands out preconfigured blocks per template.
#[derive(Debug, Default)]
pub struct FakeParser {
    blocks: FxHashMap<PathBuf, Vec<FakeBlock>>,
}

impl FakeParser {
    pub fn with(mut self, template: &Path, block: FakeBlock) -> Self {
        self.blocks
            .entry(template.to_path_buf())
            .or_default()
            .push(block);
        self
    }
}

impl Parser for FakeParser {
    fn get_compilers(&self, template: &Path) -> Result<Vec<Box<dyn Block>>, BuildError> {
        Ok(self
            .blocks
            .get(template)
            .into_iter()
            .flatten()
            .map(|b| Box::new(b.clone()) as Box<dyn Block>)
            .collect())
    }
}

fn versioned(entries: &[(&str, &str)]) -> Manifest {
    let mut manifest = Manifest::new();
    for (path, version) in entries {
        let mut entry = AssetEntry::skeleton();
        entry.assign_version(Path::new(path), version.to_string());
        manifest.assets.insert(path.into(), entry);
    }
    manifest
}

#[test]
fn test_hash_dependency_versions_is_order_sensitive() {
    let manifest = versioned(&[("a.js", "1"), ("b.js", "2")]);
    let ab = hash_dependency_versions(
        Path::new("t.html"),
        "js",
        &["a.js".into(), "b.js".into()],
        &manifest,
    )
    .unwrap();
    let ba = hash_dependency_versions(
        Path::new("t.html"),
        "js",
        &["b.js".into(), "a.js".into()],
        &manifest,
    )
    .unwrap();
    assert_ne!(ab, ba);
}

#[test]
fn test_hash_dependency_versions_reports_all_missing() {
    let manifest = versioned(&[("a.js", "1")]);
    let err = hash_dependency_versions(
        Path::new("t.html"),
        "js",
        &["x.js".into(), "a.js".into(), "y.js".into()],
        &manifest,
    )
    .unwrap_err();
    match err {
        BuildError::Dependency { origin, missing } => {
            assert_eq!(origin, PathBuf::from("t.html"));
            assert_eq!(missing, vec![PathBuf::from("x.js"), PathBuf::from("y.js")]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_dependencies_changed() {
    let cached = versioned(&[("a.js", "1")]);
    let same = versioned(&[("a.js", "1")]);
    let changed = versioned(&[("a.js", "2")]);
    let paths = [PathBuf::from("a.js")];
    assert!(!dependencies_changed(&paths, &cached, &same));
    assert!(dependencies_changed(&paths, &cached, &changed));
    assert!(dependencies_changed(&paths, &Manifest::new(), &same));
}

#[test]
fn test_fake_block_output_path() {
    let mut manifest = Manifest::new();
    manifest
        .blocks
        .insert("blk".into(), BlockEntry::new("abc".into(), "js"));
    let block = FakeBlock::new("blk", &[]);
    assert_eq!(
        block.compiled_output_path(&manifest).unwrap(),
        PathBuf::from("assets/abc.js")
    );
}

#[test]
fn test_find_templates_filters_and_sorts() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::create_dir_all(root.join("pages/nested")).unwrap();
    fs::write(root.join("pages/nested/b.html"), "").unwrap();
    fs::write(root.join("pages/a.html"), "").unwrap();
    fs::write(root.join("pages/readme.md"), "").unwrap();
    fs::write(root.join("pages/.DS_Store"), "").unwrap();

    let found = find_templates(&[root.join("pages")], ".html");
    assert_eq!(
        found,
        vec![root.join("pages/a.html"), root.join("pages/nested/b.html")]
    );
}

#[test]
fn test_hash_dependency_versions_includes_kind() {
    let manifest = versioned(&[("x.css", "1")]);
    let paths = [PathBuf::from("x.css")];
    let css = hash_dependency_versions(Path::new("t.html"), "css", &paths, &manifest).unwrap();
    let less = hash_dependency_versions(Path::new("t.html"), "less", &paths, &manifest).unwrap();
    assert_ne!(css, less);
}

#[test]
fn test_find_templates_skips_missing_dir() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.html"), "").unwrap();
    let found = find_templates(&[dir.path().join("gone"), dir.path().to_path_buf()], "html");
    assert_eq!(found, vec![dir.path().join("a.html")]);
}
