//! Built-in block compiler for script and stylesheet bundles.
//!
//! | Kind        | Compile step                                   | Output |
//! |-------------|------------------------------------------------|--------|
//! | js          | concatenate, minify (oxc)                      | `.js`  |
//! | css         | concatenate, inline images, minify (lightningcss) | `.css` |
//! | less / sass | external compiler per file, then as css        | `.css` |
//!
//! Static references inside every bundle are rewritten to their versioned
//! public URLs from the current manifest.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{Block, dependencies_changed, hash_dependency_versions, inline, minify};
use crate::core::{AssetKind, BuildError};
use crate::deps::StaticPattern;
use crate::manifest::Manifest;
use crate::utils::exec::Cmd;
use crate::utils::path::make_static_path;

/// Settings shared by every block of a run.
#[derive(Debug, Clone)]
pub struct BlockSettings {
    pub static_dir: PathBuf,
    pub output_dir: PathBuf,
    pub static_pattern: StaticPattern,
    pub minify: bool,
    pub inline_max_bytes: u64,
    pub lessc: Vec<String>,
    pub sass: Vec<String>,
}

/// One `assetman.include_*` directive.
#[derive(Debug, Clone)]
pub struct AssetBlock {
    id: String,
    kind: AssetKind,
    template: PathBuf,
    paths: Vec<PathBuf>,
    settings: Arc<BlockSettings>,
}

impl AssetBlock {
    /// `id` must identify the directive text (kind and ordered paths).
    pub fn new(
        id: String,
        kind: AssetKind,
        template: PathBuf,
        paths: Vec<PathBuf>,
        settings: Arc<BlockSettings>,
    ) -> Self {
        Self {
            id,
            kind,
            template,
            paths,
            settings,
        }
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> AssetKind {
        self.kind
    }

    #[cfg(test)]
    pub(crate) fn template(&self) -> &Path {
        &self.template
    }

    fn read_source(&self, path: &Path) -> Result<String, BuildError> {
        let tool = match self.kind {
            AssetKind::Less => &self.settings.lessc,
            AssetKind::Sass => &self.settings.sass,
            _ => return fs::read_to_string(path).map_err(|e| BuildError::io(path, e)),
        };
        let cmd = Cmd::from_slice(tool).arg(path);
        let operation = cmd.command_line();
        let output = cmd
            .run()
            .map_err(|e| BuildError::compile(operation, format!("{e:#}")))?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Rewrite static references, inlining small images for stylesheets.
    fn rewrite_refs(&self, src: &str, manifest: &Manifest, inline_images: bool) -> String {
        let settings = &self.settings;
        let inline_images = inline_images && self.kind != AssetKind::Script;
        settings.static_pattern.rewrite(src, |rel| {
            let path = make_static_path(&settings.static_dir, rel);
            if inline_images
                && let Some(uri) = inline::data_uri(&path, settings.inline_max_bytes)
            {
                return Some(uri);
            }
            manifest.versioned_url(settings.static_pattern.prefix(), &path)
        })
    }
}

impl Block for AssetBlock {
    fn id(&self) -> &str {
        &self.id
    }

    fn dependency_paths(&self) -> &[PathBuf] {
        &self.paths
    }

    fn extension(&self) -> &str {
        match self.kind {
            AssetKind::Script => "js",
            _ => "css",
        }
    }

    fn compiled_output_path(&self, manifest: &Manifest) -> Result<PathBuf, BuildError> {
        let entry = manifest.blocks.get(&self.id).ok_or_else(|| {
            BuildError::Invariant(format!(
                "block {} from {} has no manifest entry",
                self.id,
                self.template.display()
            ))
        })?;
        Ok(self.settings.output_dir.join(&entry.versioned_path))
    }

    fn current_content_hash(&self, manifest: &Manifest) -> Result<String, BuildError> {
        hash_dependency_versions(&self.template, self.kind.name(), &self.paths, manifest)
    }

    /// Also stale when the compiled file is gone from the output directory.
    fn needs_recompile(&self, cached: &Manifest, current: &Manifest) -> bool {
        dependencies_changed(&self.paths, cached, current)
            || self
                .compiled_output_path(current)
                .map_or(true, |output| !output.is_file())
    }

    fn compile(&self, manifest: &Manifest, inline_images: bool) -> Result<Vec<u8>, BuildError> {
        let mut bundle = String::new();
        for path in &self.paths {
            let src = self.read_source(path)?;
            bundle.push_str(&self.rewrite_refs(&src, manifest, inline_images));
            if !bundle.ends_with('\n') {
                bundle.push('\n');
            }
        }
        if !self.settings.minify {
            return Ok(bundle.into_bytes());
        }
        let minified = match self.kind {
            AssetKind::Script => minify::minify_js(&bundle),
            _ => minify::minify_css(&bundle),
        };
        minified
            .map(String::into_bytes)
            .map_err(|message| BuildError::compile(format!("minify {}", self.id), message))
    }
}
