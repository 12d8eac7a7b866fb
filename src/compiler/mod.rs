//! Compiled asset blocks: collaborator traits, template discovery, and the
//! built-in parser and compilers.
//!
//! A *block* is one `{% apply assetman.include_* %}` directive in a template.
//! It lists source files and compiles them into a single versioned output.

pub mod block;
mod inline;
mod minify;
pub mod orchestrator;
pub mod pool;
pub mod template;

#[cfg(test)]
pub(crate) mod tests;

use std::fmt;
use std::path::{Path, PathBuf};

use jwalk::WalkDir;

use crate::core::BuildError;
use crate::log;
use crate::freshness::ContentHash;
use crate::manifest::Manifest;

pub use block::{AssetBlock, BlockSettings};
pub use orchestrator::{BuildOrchestrator, dedup_blocks};
pub use pool::TaskPool;
pub use template::TemplateParser;

/// A compiled output unit.
pub trait Block: Send + Sync + fmt::Debug {
    /// Stable content hash of the defining directive.
    fn id(&self) -> &str;

    /// Source paths in bundle order.
    fn dependency_paths(&self) -> &[PathBuf];

    /// Extension of the compiled output, without a dot.
    fn extension(&self) -> &str;

    /// Where the compiled bytes go, derived from this block's manifest entry.
    fn compiled_output_path(&self, manifest: &Manifest) -> Result<PathBuf, BuildError>;

    /// Version of the compiled output for the given manifest.
    fn current_content_hash(&self, manifest: &Manifest) -> Result<String, BuildError>;

    /// Whether any dependency changed between the cached and current build.
    ///
    /// A path the cached manifest has never seen counts as changed.
    fn needs_recompile(&self, cached: &Manifest, current: &Manifest) -> bool {
        dependencies_changed(self.dependency_paths(), cached, current)
    }

    fn compile(&self, manifest: &Manifest, inline_images: bool) -> Result<Vec<u8>, BuildError>;
}

/// Extracts blocks from a template.
pub trait Parser: Send + Sync {
    fn get_compilers(&self, template: &Path) -> Result<Vec<Box<dyn Block>>, BuildError>;
}

/// Any of `paths` is new or has a different version than in `cached`.
pub fn dependencies_changed(paths: &[PathBuf], cached: &Manifest, current: &Manifest) -> bool {
    paths.iter().any(|path| {
        cached
            .version_of(path)
            .is_none_or(|old| current.version_of(path) != Some(old))
    })
}

/// Hash `kind` and the versions of `paths`, in order.
///
/// `kind` keeps bundles of different kinds over the same sources apart.
/// Every path must already be versioned; the ones that are not are reported
/// together as a dependency error against `origin`.
pub fn hash_dependency_versions(
    origin: &Path,
    kind: &str,
    paths: &[PathBuf],
    manifest: &Manifest,
) -> Result<String, BuildError> {
    let mut hasher = blake3::Hasher::new();
    hasher.update(kind.as_bytes());
    hasher.update(b"\n");
    let mut missing = Vec::new();
    for path in paths {
        match manifest.version_of(path) {
            Some(version) => {
                hasher.update(version.as_bytes());
            }
            None => missing.push(path.clone()),
        }
    }
    if !missing.is_empty() {
        return Err(BuildError::Dependency {
            origin: origin.to_path_buf(),
            missing,
        });
    }
    Ok(ContentHash::from(hasher.finalize()).to_hex())
}

const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Recursively collect templates with the given extension, sorted.
pub fn find_templates(dirs: &[PathBuf], template_ext: &str) -> Vec<PathBuf> {
    let ext = template_ext.trim_start_matches('.');
    let mut paths: Vec<PathBuf> = dirs
        .iter()
        .flat_map(|dir| {
            WalkDir::new(dir)
                .sort(true)
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(err) => {
                        log!("warning"; "skipping unreadable entry under {}: {}", dir.display(), err);
                        None
                    }
                })
                .filter(|e| e.file_type().is_file())
                .filter(|e| {
                    let name = e.file_name().to_str().unwrap_or_default();
                    !IGNORED_FILES.contains(&name)
                })
                .map(|e| e.path())
        })
        .filter(|path| path.extension().is_some_and(|e| e == ext))
        .collect();
    paths.sort();
    paths.dedup();
    paths
}
