//! Asset kind definitions.

use std::path::Path;

/// Kind of source file, determines how first-level dependencies are extracted.
///
/// Files with no kind (images, fonts, ...) are leaves of the asset graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// Template file (extension configured by `template_ext`)
    Template,
    /// Plain stylesheet (.css)
    Stylesheet,
    /// Less stylesheet (.less)
    Less,
    /// Sass stylesheet (.scss, .sass)
    Sass,
    /// JavaScript (.js)
    Script,
}

impl AssetKind {
    /// Detect asset kind from a file extension.
    ///
    /// `template_ext` is compared without a leading dot.
    pub fn from_extension(ext: &str, template_ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        if ext == template_ext.trim_start_matches('.').to_ascii_lowercase() {
            return Some(Self::Template);
        }
        match ext.as_str() {
            "css" => Some(Self::Stylesheet),
            "less" => Some(Self::Less),
            "scss" | "sass" => Some(Self::Sass),
            "js" => Some(Self::Script),
            _ => None,
        }
    }

    /// Detect asset kind from a file path.
    pub fn from_path(path: &Path, template_ext: &str) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|ext| Self::from_extension(ext, template_ext))
    }

    /// Display name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Stylesheet => "css",
            Self::Less => "less",
            Self::Sass => "sass",
            Self::Script => "js",
        }
    }

    /// Stylesheet-like kinds follow `@import` directives.
    #[inline]
    pub fn has_imports(self) -> bool {
        matches!(self, Self::Stylesheet | Self::Less | Self::Sass)
    }
}
