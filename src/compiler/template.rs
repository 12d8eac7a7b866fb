//! Built-in template parser.
//!
//! Recognizes asset blocks written as
//!
//! ```text
//! {% apply assetman.include_js %}
//!     js/vendor.js
//!     js/app.js
//! {% end %}
//! ```
//!
//! with `include_css`, `include_less` and `include_sass` for stylesheets.
//! Paths are relative to the static directory; the body must be literal.

use std::fs;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::{AssetBlock, Block, BlockSettings, Parser};
use crate::core::{AssetKind, BuildError};
use crate::freshness::ContentHash;
use crate::utils::path::make_static_path;

static ASSET_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)\{%-?\s*(?:apply\s+)?assetman\.include_(\w+)\s*-?%\}(.*?)\{%-?\s*end\s*-?%\}",
    )
    .expect("valid asset block pattern")
});

/// Parses `assetman.include_*` blocks into [`AssetBlock`]s.
#[derive(Debug, Clone)]
pub struct TemplateParser {
    settings: Arc<BlockSettings>,
}

impl TemplateParser {
    pub fn new(settings: Arc<BlockSettings>) -> Self {
        Self { settings }
    }

    /// Parse blocks out of already-loaded template source.
    pub fn parse(&self, template: &Path, src: &str) -> Result<Vec<AssetBlock>, BuildError> {
        let mut blocks = Vec::new();
        for caps in ASSET_BLOCK.captures_iter(src) {
            let directive = &caps[0];
            let kind = match &caps[1] {
                "js" => AssetKind::Script,
                "css" => AssetKind::Stylesheet,
                "less" => AssetKind::Less,
                "sass" | "scss" => AssetKind::Sass,
                other => {
                    return Err(BuildError::parse(
                        template,
                        format!("unknown asset block type `include_{other}`"),
                    ));
                }
            };
            let body = &caps[2];
            if body.contains("{{") || body.contains("{%") {
                return Err(BuildError::parse(
                    template,
                    format!("vars not allowed in asset blocks: {directive}"),
                ));
            }

            let rel_paths: Vec<&str> = body
                .split_whitespace()
                .map(|p| p.strip_prefix(self.settings.static_pattern.prefix()).unwrap_or(p))
                .collect();
            if rel_paths.is_empty() {
                continue;
            }

            let id = block_id(kind, &rel_paths);
            let paths = rel_paths
                .iter()
                .map(|rel| make_static_path(&self.settings.static_dir, rel))
                .collect();
            blocks.push(AssetBlock::new(
                id,
                kind,
                template.to_path_buf(),
                paths,
                self.settings.clone(),
            ));
        }
        Ok(blocks)
    }
}

impl Parser for TemplateParser {
    fn get_compilers(&self, template: &Path) -> Result<Vec<Box<dyn Block>>, BuildError> {
        let src = fs::read_to_string(template).map_err(|e| BuildError::io(template, e))?;
        Ok(self
            .parse(template, &src)?
            .into_iter()
            .map(|b| Box::new(b) as Box<dyn Block>)
            .collect())
    }
}

/// Identity of a directive: its kind and ordered path list.
///
/// Identical directives in different templates share an id.
fn block_id(kind: AssetKind, rel_paths: &[&str]) -> String {
    let mut text = String::from(kind.name());
    for path in rel_paths {
        text.push('\n');
        text.push_str(path);
    }
    ContentHash::of(text).to_hex()
}
