//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Compile and version the static assets referenced from templates
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: assetman.toml, optional)
    #[arg(short = 'C', long, default_value = "assetman.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Directory to crawl for templates (repeatable)
    #[arg(long = "template-dir", value_name = "DIR", value_hint = clap::ValueHint::DirPath)]
    pub template_dirs: Vec<PathBuf>,

    /// File extension of compilable templates
    #[arg(long, value_name = "EXT")]
    pub template_ext: Option<String>,

    /// Directory where static assets are located
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub static_dir: Option<PathBuf>,

    /// Directory where compiled assets are placed
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// Static asset base URL path, must begin and end with `/`
    #[arg(long = "static-url-path", value_name = "PREFIX")]
    pub static_url_prefix: Option<String>,

    /// Location to read/write the compiled asset manifest
    #[arg(long = "compiled-manifest-path", value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    pub manifest_path: Option<PathBuf>,

    /// Worker threads for parsing and compiling (0 = all cores)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Check whether a compile is needed; exits 1 if so
    #[arg(short = 't', long)]
    pub test_needs_compile: bool,

    /// Force a recompile of everything
    #[arg(short, long)]
    pub force: bool,

    /// Do not substitute data URIs for small images in CSS
    #[arg(short = 'i', long)]
    pub skip_inline_images: bool,

    /// Print debug output
    #[arg(short, long)]
    pub verbose: bool,
}
