//! Compile stale blocks and commit the manifest.
//!
//! The manifest is persisted only after every scheduled compile succeeded
//! and the run was not interrupted. Compiled outputs are content-addressed,
//! so outputs written by a failed batch are harmless leftovers that the
//! previous manifest never points to.

use std::fs;
use std::path::PathBuf;

use rustc_hash::FxHashSet;

use super::{Block, TaskPool};
use crate::core::BuildError;
use crate::logger::ProgressLine;
use crate::manifest::{Manifest, ManifestStore};
use crate::utils::path::write_atomic;
use crate::{debug, log};

/// Drop blocks whose id was already seen, keeping the first occurrence.
///
/// Must run after the manifest is built: every embedding template still
/// contributes its block's paths to dependency tracking.
pub fn dedup_blocks(blocks: Vec<Box<dyn Block>>) -> Vec<Box<dyn Block>> {
    let total = blocks.len();
    let mut seen = FxHashSet::default();
    let unique: Vec<_> = blocks
        .into_iter()
        .filter(|block| seen.insert(block.id().to_string()))
        .collect();
    debug!("compile"; "{} block compilers, {} unique", total, unique.len());
    unique
}

/// Runs the compile phase on a [`TaskPool`].
pub struct BuildOrchestrator<'a> {
    pool: &'a TaskPool,
    store: &'a ManifestStore,
    inline_images: bool,
    progress: bool,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(pool: &'a TaskPool, store: &'a ManifestStore) -> Self {
        Self {
            pool,
            store,
            inline_images: true,
            progress: false,
        }
    }

    pub fn inline_images(mut self, inline: bool) -> Self {
        self.inline_images = inline;
        self
    }

    /// Show a progress line while compiling.
    pub fn progress(mut self, show: bool) -> Self {
        self.progress = show;
        self
    }

    /// Compile `stale` against `manifest`, then persist `manifest`.
    ///
    /// Returns the written output paths, in the order of `stale`.
    pub fn run(&self, stale: &[&dyn Block], manifest: &Manifest) -> Result<Vec<PathBuf>, BuildError> {
        let progress = (self.progress && !stale.is_empty())
            .then(|| ProgressLine::new(&[("blocks", stale.len())]));

        let result = self.pool.try_map(stale, |block| {
            let output = compile_one(*block, manifest, self.inline_images)?;
            if let Some(p) = &progress {
                p.inc("blocks");
            }
            Ok(output)
        });

        match result {
            Ok(written) => {
                if let Some(p) = progress {
                    p.finish();
                }
                if self.pool.cancel_token().is_cancelled() {
                    return Err(BuildError::Interrupted);
                }
                self.store.save(manifest)?;
                log!("build"; "wrote {}", self.store.path().display());
                Ok(written)
            }
            Err(e) => {
                drop(progress);
                Err(e)
            }
        }
    }
}

fn compile_one(
    block: &dyn Block,
    manifest: &Manifest,
    inline_images: bool,
) -> Result<PathBuf, BuildError> {
    let output = block.compiled_output_path(manifest)?;
    let bytes = block.compile(manifest, inline_images)?;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e))?;
    }
    write_atomic(&output, &bytes).map_err(|e| BuildError::io(&output, e))?;
    debug!("compile"; "{} -> {}", block.id(), output.display());
    Ok(output)
}
