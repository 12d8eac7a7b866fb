//! Configuration for `assetman.toml`.
//!
//! The file is optional; every setting has a default and CLI flags override
//! file values. Relative paths are resolved against the working directory.
//!
//! # Sections
//!
//! | Section     | Purpose                                              |
//! |-------------|------------------------------------------------------|
//! | `[paths]`   | Template, static, output and manifest locations      |
//! | `[compile]` | Worker count, minification, inlining, external tools |
//!
//! # Example
//!
//! ```toml
//! [paths]
//! template_dirs = ["templates"]
//! static_url_prefix = "/static/"
//!
//! [compile]
//! jobs = 4
//! lessc = ["npx", "lessc"]
//! ```

mod error;

pub use error::ConfigError;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::cli::Cli;
use crate::compiler::BlockSettings;
use crate::deps::StaticPattern;
use crate::{debug, log};

/// Root configuration, `assetman.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AssetmanConfig {
    pub paths: PathsConfig,
    pub compile: CompileConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub template_dirs: Vec<PathBuf>,
    pub template_ext: String,
    pub static_dir: PathBuf,
    pub output_dir: PathBuf,
    pub static_url_prefix: String,
    /// Defaults to `manifest.json` inside `output_dir`.
    pub manifest_path: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            template_dirs: Vec::new(),
            template_ext: "html".into(),
            static_dir: "static".into(),
            output_dir: "assets".into(),
            static_url_prefix: "/static/".into(),
            manifest_path: None,
        }
    }
}

/// `[compile]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Worker threads, 0 = host parallelism.
    pub jobs: usize,
    pub minify: bool,
    /// Images up to this size are inlined into CSS as data URIs.
    pub inline_max_bytes: u64,
    pub lessc: Vec<String>,
    pub sass: Vec<String>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            jobs: 0,
            minify: true,
            inline_max_bytes: 4096,
            lessc: vec!["lessc".into()],
            sass: vec!["sass".into()],
        }
    }
}

impl AssetmanConfig {
    /// Load the config file named by the CLI (if present) and apply CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = if cli.config.is_file() {
            Self::from_path(&cli.config)?
        } else {
            debug!("config"; "{} not found, using defaults", cli.config.display());
            Self::default()
        };
        config.apply_cli(cli);
        Ok(config)
    }

    fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            log!("warning"; "unknown fields in {}, ignoring: {}", path.display(), ignored.join(", "));
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// CLI flags win over file values.
    pub fn apply_cli(&mut self, cli: &Cli) {
        let paths = &mut self.paths;
        if !cli.template_dirs.is_empty() {
            paths.template_dirs = cli.template_dirs.clone();
        }
        if let Some(ext) = &cli.template_ext {
            paths.template_ext = ext.clone();
        }
        if let Some(dir) = &cli.static_dir {
            paths.static_dir = dir.clone();
        }
        if let Some(dir) = &cli.output_dir {
            paths.output_dir = dir.clone();
        }
        if let Some(prefix) = &cli.static_url_prefix {
            paths.static_url_prefix = prefix.clone();
        }
        if let Some(path) = &cli.manifest_path {
            paths.manifest_path = Some(path.clone());
        }
        if let Some(jobs) = cli.jobs {
            self.compile.jobs = jobs;
        }
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.paths
            .manifest_path
            .clone()
            .unwrap_or_else(|| self.paths.output_dir.join("manifest.json"))
    }

    /// Check settings that must hold before any build work starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.paths.static_url_prefix;
        if prefix.len() < 2 || !prefix.starts_with('/') || !prefix.ends_with('/') {
            return Err(ConfigError::Validation(format!(
                "static_url_prefix must begin and end with a slash, got `{prefix}`"
            )));
        }
        if self.paths.template_dirs.is_empty() {
            return Err(ConfigError::Validation(
                "no template directories configured (use --template-dir)".into(),
            ));
        }
        for dir in &self.paths.template_dirs {
            if !dir.is_dir() {
                return Err(ConfigError::Validation(format!(
                    "template directory not found: {}",
                    dir.display()
                )));
            }
        }
        if !self.paths.static_dir.is_dir() {
            return Err(ConfigError::Validation(format!(
                "static directory not found: {}",
                self.paths.static_dir.display()
            )));
        }
        if self.compile.lessc.is_empty() || self.compile.sass.is_empty() {
            return Err(ConfigError::Validation(
                "compile.lessc and compile.sass must name a program".into(),
            ));
        }
        Ok(())
    }

    /// Pattern recognizing static references under the URL prefix.
    pub fn static_pattern(&self) -> Result<StaticPattern, ConfigError> {
        StaticPattern::new(&self.paths.static_url_prefix).map_err(|e| {
            ConfigError::Validation(format!("invalid static_url_prefix: {e}"))
        })
    }

    /// Settings shared by the built-in template parser and block compiler.
    pub fn block_settings(&self) -> Result<Arc<BlockSettings>, ConfigError> {
        Ok(Arc::new(BlockSettings {
            static_dir: self.paths.static_dir.clone(),
            output_dir: self.paths.output_dir.clone(),
            static_pattern: self.static_pattern()?,
            minify: self.compile.minify,
            inline_max_bytes: self.compile.inline_max_bytes,
            lessc: self.compile.lessc.clone(),
            sass: self.compile.sass.clone(),
        }))
    }
}
