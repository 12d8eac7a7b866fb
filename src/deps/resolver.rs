//! Recursive dependency discovery from root source paths.

use std::fs;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;

use super::extract::ExtractContext;
use crate::core::{AssetKind, BuildError};
use crate::manifest::{AssetEntry, Manifest};
use crate::utils::path::clean_path;
use crate::{debug, log};

/// Walks the reference graph and records every reachable path.
///
/// Single-threaded: the graph is only ever mutated here.
pub struct DependencyResolver<'a> {
    ctx: ExtractContext<'a>,
    template_ext: &'a str,
    manifest: Manifest,
    /// Paths on the current descent, in order (for cycle reports).
    stack: Vec<PathBuf>,
    visiting: FxHashSet<PathBuf>,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(ctx: ExtractContext<'a>, template_ext: &'a str) -> Self {
        Self {
            ctx,
            template_ext,
            manifest: Manifest::new(),
            stack: Vec::new(),
            visiting: FxHashSet::default(),
        }
    }

    /// Build the unversioned manifest for the transitive closure of `roots`.
    ///
    /// Roots missing on disk are skipped with a warning; anything that later
    /// needs them fails with a dependency error.
    pub fn resolve(mut self, roots: &[PathBuf]) -> Result<Manifest, BuildError> {
        let mut roots: Vec<PathBuf> = roots.iter().map(|p| clean_path(p)).collect();
        roots.sort();
        roots.dedup();

        for root in &roots {
            if !root.is_file() {
                log!("warning"; "missing source {}", root.display());
                continue;
            }
            self.visit(root)?;
        }
        debug!("deps"; "resolved {} assets from {} roots", self.manifest.assets.len(), roots.len());
        Ok(self.manifest)
    }

    fn visit(&mut self, path: &Path) -> Result<(), BuildError> {
        if self.visiting.contains(path) {
            let start = self.stack.iter().position(|p| p == path).unwrap_or(0);
            let mut cycle = self.stack[start..].to_vec();
            cycle.push(path.to_path_buf());
            return Err(BuildError::Cycle { cycle });
        }
        if self.manifest.assets.contains_key(path) {
            return Ok(());
        }
        self.manifest
            .assets
            .insert(path.to_path_buf(), AssetEntry::skeleton());

        let Some(kind) = AssetKind::from_path(path, self.template_ext) else {
            return Ok(());
        };
        let bytes = fs::read(path).map_err(|e| BuildError::io(path, e))?;
        let src = String::from_utf8_lossy(&bytes);
        let candidates = kind.extract(path, &src, &self.ctx)?;

        self.visiting.insert(path.to_path_buf());
        self.stack.push(path.to_path_buf());
        for dep in candidates {
            if !dep.is_file() {
                log!("warning"; "missing dep {} (src: {})", dep.display(), path.display());
                continue;
            }
            if let Some(entry) = self.manifest.assets.get_mut(path) {
                entry.deps.insert(dep.clone());
            }
            self.visit(&dep)?;
        }
        self.stack.pop();
        self.visiting.remove(path);
        Ok(())
    }
}
