//! Top-level build run.
//!
//! Pipeline phases:
//! - **Validate** - configuration checks, output directory
//! - **Discover** - collect templates from every template dir
//! - **Parse** - extract blocks from templates on the task pool
//! - **Resolve** - dependency graph from templates and block sources
//! - **Version** - Merkle versions, normalization, block entries
//! - **Diff** - stale blocks and out-of-sync assets vs. the cached manifest
//! - **Compile** - stale blocks on the task pool, then commit the manifest

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::Cli;
use crate::compiler::{
    Block, BuildOrchestrator, Parser, TaskPool, TemplateParser, dedup_blocks, find_templates,
};
use crate::config::AssetmanConfig;
use crate::core::{BuildError, shutdown_token};
use crate::deps::{DependencyResolver, ExtractContext};
use crate::freshness::{StalenessDetector, assign_versions};
use crate::manifest::{BlockEntry, Manifest, ManifestStore, normalize};
use crate::utils::plural_count;
use crate::{debug, log};

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Nothing stale, nothing written.
    UpToDate,
    /// Stale blocks compiled and the manifest persisted.
    Rebuilt { compiled: Vec<PathBuf> },
}

/// Switches from the operational surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    pub force: bool,
    /// Report whether a rebuild is needed without performing it.
    pub check_only: bool,
    pub skip_inline_images: bool,
    pub progress: bool,
}

impl BuildOptions {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            force: cli.force,
            check_only: cli.test_needs_compile,
            skip_inline_images: cli.skip_inline_images,
            progress: true,
        }
    }
}

/// Everything a run needs, with the collaborators injected.
pub struct BuildContext<'a> {
    pub config: &'a AssetmanConfig,
    pub parser: &'a dyn Parser,
    pub pool: &'a TaskPool,
    pub options: BuildOptions,
}

/// Entry point for the binary: wire the built-in parser and a pool tied to Ctrl+C.
pub fn run(cli: &Cli) -> Result<BuildOutcome> {
    let config = AssetmanConfig::load(cli).map_err(BuildError::from)?;
    let settings = config.block_settings().map_err(BuildError::from)?;
    let parser = TemplateParser::new(settings);
    let pool = TaskPool::new(config.compile.jobs, shutdown_token())
        .context("failed to create worker pool")?;
    debug!("build"; "using {} workers", pool.jobs());

    let cx = BuildContext {
        config: &config,
        parser: &parser,
        pool: &pool,
        options: BuildOptions::from_cli(cli),
    };
    Ok(run_build(&cx)?)
}

/// Validate, build the current manifest, diff, and rebuild what is stale.
pub fn run_build(cx: &BuildContext<'_>) -> Result<BuildOutcome, BuildError> {
    let config = cx.config;
    config.validate()?;

    let output_dir = &config.paths.output_dir;
    if !cx.options.check_only && !output_dir.is_dir() {
        log!("build"; "creating output directory {}", output_dir.display());
        fs::create_dir_all(output_dir).map_err(|e| BuildError::io(output_dir, e))?;
    }

    let templates = find_templates(&config.paths.template_dirs, &config.paths.template_ext);
    debug!("build"; "found {}", plural_count(templates.len(), "template"));

    let store = ManifestStore::new(config.manifest_path());
    let cached = store.load();

    let static_pattern = config.static_pattern()?;
    let ctx = ExtractContext {
        static_dir: &config.paths.static_dir,
        template_dirs: &config.paths.template_dirs,
        static_pattern: &static_pattern,
    };
    let (current, blocks) =
        build_manifest(&templates, cx.parser, cx.pool, ctx, &config.paths.template_ext)?;
    let blocks = dedup_blocks(blocks);

    let staleness = StalenessDetector::new(&cached, &current)
        .force(cx.options.force)
        .detect(&blocks);
    if staleness.is_noop() {
        log!("build"; "assets up to date");
        return Ok(BuildOutcome::UpToDate);
    }
    if cx.options.check_only {
        log!("build"; "compile needed: {} stale", plural_count(staleness.stale.len(), "block"));
        return Err(BuildError::NeedsRebuild);
    }

    let compiled = BuildOrchestrator::new(cx.pool, &store)
        .inline_images(!cx.options.skip_inline_images)
        .progress(cx.options.progress)
        .run(&staleness.stale, &current)?;
    log!("build"; "compiled {}", plural_count(compiled.len(), "block"));
    Ok(BuildOutcome::Rebuilt { compiled })
}

/// Parse templates, resolve and version the graph, and record block versions.
///
/// Returns the validated manifest and every block found, duplicates included.
pub fn build_manifest(
    templates: &[PathBuf],
    parser: &dyn Parser,
    pool: &TaskPool,
    ctx: ExtractContext<'_>,
    template_ext: &str,
) -> Result<(Manifest, Vec<Box<dyn Block>>), BuildError> {
    let blocks: Vec<Box<dyn Block>> = pool
        .try_map(templates, |template| parser.get_compilers(template))?
        .into_iter()
        .flatten()
        .collect();
    debug!("build"; "found {}", plural_count(blocks.len(), "block"));

    let mut roots = templates.to_vec();
    for block in &blocks {
        roots.extend(block.dependency_paths().iter().cloned());
    }

    let mut manifest = DependencyResolver::new(ctx, template_ext).resolve(&roots)?;
    assign_versions(&mut manifest)?;

    for block in &blocks {
        let version = block.current_content_hash(&manifest)?;
        let entry = BlockEntry::new(version, block.extension());
        manifest.blocks.insert(block.id().to_string(), entry);
    }
    normalize(&manifest)?;
    Ok((manifest, blocks))
}
