//! First-level dependency extraction, one strategy per [`AssetKind`].
//!
//! | Kind                  | Dependencies                                        |
//! |-----------------------|-----------------------------------------------------|
//! | template              | `assetman.static_url('…')` calls, include / extends |
//! | css / less / sass     | `@import` targets, static URL references            |
//! | js                    | static URL references                               |
//!
//! Extraction is purely textual. Candidates are returned whether or not they
//! exist on disk; the resolver decides what to do with missing ones.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::{AssetKind, BuildError};
use crate::utils::path::{clean_path, make_static_path};

/// `assetman.static_url('img/logo.png')`, optionally with extra arguments.
static STATIC_URL_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"assetman\.static_url\((.*?)(,.*?)?\)").expect("valid static_url pattern")
});

/// `{% include "x.html" %}` / `{% extends 'base.html' %}`
static INCLUDE_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{%-?\s*(?:include|extends)\s+(?:"([^"]+)"|'([^']+)')"#)
        .expect("valid include pattern")
});

/// `@import "x";` / `@import url('x');`
static IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@import\s+(?:url\(\s*)?(?:"([^"]*)"|'([^']*)')"#).expect("valid import pattern")
});

/// Matches in-source references to static files under a URL prefix.
///
/// `/static/img/a.png` with prefix `/static/` yields `img/a.png`. Query
/// strings and fragments are not part of the path.
#[derive(Debug, Clone)]
pub struct StaticPattern {
    prefix: String,
    regex: Regex,
}

impl StaticPattern {
    pub fn new(prefix: &str) -> Result<Self, regex::Error> {
        let pattern = format!(r#"{}([^\s"'()<>?#\\]+)"#, regex::escape(prefix));
        Ok(Self {
            prefix: prefix.to_string(),
            regex: Regex::new(&pattern)?,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Relative static paths referenced in `src`.
    pub fn paths<'s>(&'s self, src: &'s str) -> impl Iterator<Item = &'s str> + 's {
        self.regex
            .captures_iter(src)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
    }

    /// Replace each reference with `f(relative_path)`, keeping it when `f`
    /// returns `None`.
    pub fn rewrite(&self, src: &str, mut f: impl FnMut(&str) -> Option<String>) -> String {
        self.regex
            .replace_all(src, |caps: &regex::Captures<'_>| {
                f(&caps[1]).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

/// Everything an extractor needs besides the file itself.
#[derive(Debug, Clone, Copy)]
pub struct ExtractContext<'a> {
    pub static_dir: &'a Path,
    pub template_dirs: &'a [PathBuf],
    pub static_pattern: &'a StaticPattern,
}

impl AssetKind {
    /// First-level dependencies of `path`, whose contents are `src`.
    ///
    /// Fails only for template references that are not string literals.
    pub fn extract(
        self,
        path: &Path,
        src: &str,
        ctx: &ExtractContext<'_>,
    ) -> Result<Vec<PathBuf>, BuildError> {
        let mut deps = Vec::new();
        if self == Self::Template {
            template_static_calls(path, src, ctx.static_dir, &mut deps)?;
            template_includes(path, src, ctx.template_dirs, &mut deps);
            return Ok(deps);
        }
        if self.has_imports() {
            imports(path, src, self == Self::Less, &mut deps);
        }
        static_refs(src, ctx, &mut deps);
        Ok(deps)
    }
}

fn template_static_calls(
    path: &Path,
    src: &str,
    static_dir: &Path,
    deps: &mut Vec<PathBuf>,
) -> Result<(), BuildError> {
    for caps in STATIC_URL_CALL.captures_iter(src) {
        let arg = caps[1].trim();
        match strip_quotes(arg) {
            Some(rel) => deps.push(make_static_path(static_dir, rel)),
            None => {
                return Err(BuildError::parse(
                    path,
                    format!("vars not allowed in static_url calls: {}", &caps[0]),
                ));
            }
        }
    }
    Ok(())
}

fn strip_quotes(arg: &str) -> Option<&str> {
    let quote = arg.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    arg.strip_prefix(quote)?.strip_suffix(quote)
}

/// Included templates resolve against the including template's directory
/// first, then each template root.
fn template_includes(path: &Path, src: &str, template_dirs: &[PathBuf], deps: &mut Vec<PathBuf>) {
    let here = path.parent().unwrap_or(Path::new(""));
    for caps in INCLUDE_DIRECTIVE.captures_iter(src) {
        let Some(target) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
            continue;
        };
        let local = clean_path(&here.join(target));
        let found = std::iter::once(local.clone())
            .chain(template_dirs.iter().map(|dir| clean_path(&dir.join(target))))
            .find(|candidate| candidate.is_file());
        deps.push(found.unwrap_or(local));
    }
}

fn imports(path: &Path, src: &str, is_less: bool, deps: &mut Vec<PathBuf>) {
    let here = path.parent().unwrap_or(Path::new(""));
    for caps in IMPORT.captures_iter(src) {
        let Some(target) = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str()) else {
            continue;
        };
        if target.is_empty() || is_remote(target) {
            continue;
        }
        let mut target = target.to_string();
        if is_less && Path::new(&target).extension().is_none() {
            target.push_str(".less");
        }
        deps.push(clean_path(&here.join(target)));
    }
}

fn is_remote(target: &str) -> bool {
    target.starts_with("http:") || target.starts_with("https:") || target.starts_with("//")
}

fn static_refs(src: &str, ctx: &ExtractContext<'_>, deps: &mut Vec<PathBuf>) {
    deps.extend(
        ctx.static_pattern
            .paths(src)
            .map(|rel| make_static_path(ctx.static_dir, rel)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn extract(kind: AssetKind, path: &str, src: &str) -> Result<Vec<PathBuf>, BuildError> {
        let pattern = StaticPattern::new("/static/").unwrap();
        let ctx = ExtractContext {
            static_dir: Path::new("static"),
            template_dirs: &[],
            static_pattern: &pattern,
        };
        kind.extract(Path::new(path), src, &ctx)
    }

    #[test]
    fn test_template_static_url_calls() {
        let src = r#"<img src="{{ assetman.static_url('img/logo.png') }}">
<link href="{{ assetman.static_url("css/print.css", local=True) }}">"#;
        let deps = extract(AssetKind::Template, "templates/index.html", src).unwrap();
        assert_eq!(
            deps,
            vec![
                PathBuf::from("static/img/logo.png"),
                PathBuf::from("static/css/print.css")
            ]
        );
    }

    #[test]
    fn test_template_variable_argument_is_parse_error() {
        let src = "{{ assetman.static_url(logo_path) }}";
        let err = extract(AssetKind::Template, "templates/index.html", src).unwrap_err();
        match err {
            BuildError::Parse { path, message } => {
                assert_eq!(path, PathBuf::from("templates/index.html"));
                assert!(message.contains("assetman.static_url(logo_path)"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_template_ignores_plain_static_urls() {
        let src = r#"<img src="/static/img/raw.png">"#;
        assert!(extract(AssetKind::Template, "t.html", src).unwrap().is_empty());
    }

    #[test]
    fn test_template_includes_resolve_locally_then_roots() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("templates");
        fs::create_dir_all(root.join("pages")).unwrap();
        fs::write(root.join("base.html"), "").unwrap();
        fs::write(root.join("pages/nav.html"), "").unwrap();

        let pattern = StaticPattern::new("/static/").unwrap();
        let template_dirs = [root.clone()];
        let ctx = ExtractContext {
            static_dir: Path::new("static"),
            template_dirs: &template_dirs,
            static_pattern: &pattern,
        };
        let src = r#"{% extends "base.html" %}{% include 'nav.html' %}"#;
        let deps = AssetKind::Template
            .extract(&root.join("pages/home.html"), src, &ctx)
            .unwrap();
        assert_eq!(deps, vec![root.join("base.html"), root.join("pages/nav.html")]);
    }

    #[test]
    fn test_less_imports_get_extension() {
        let src = r#"@import "mixins"; @import url('../base.css'); @import "theme.less";"#;
        let deps = extract(AssetKind::Less, "static/css/site.less", src).unwrap();
        assert_eq!(
            deps,
            vec![
                PathBuf::from("static/css/mixins.less"),
                PathBuf::from("static/base.css"),
                PathBuf::from("static/css/theme.less"),
            ]
        );
    }

    #[test]
    fn test_css_imports_skip_remote() {
        let src = r#"@import url("https://fonts.example.com/a.css"); @import "//cdn/x.css"; @import "local.css";"#;
        let deps = extract(AssetKind::Stylesheet, "static/site.css", src).unwrap();
        assert_eq!(deps, vec![PathBuf::from("static/local.css")]);
    }

    #[test]
    fn test_css_static_refs() {
        let src = "body { background: url(/static/img/bg.png?v=1); }\n.x { background: url('/static/img/x.gif#a') }";
        let deps = extract(AssetKind::Stylesheet, "static/site.css", src).unwrap();
        assert_eq!(
            deps,
            vec![
                PathBuf::from("static/img/bg.png"),
                PathBuf::from("static/img/x.gif")
            ]
        );
    }

    #[test]
    fn test_script_only_static_refs() {
        let src = r#"import "./other.js"; const icon = "/static/img/icon.svg";"#;
        let deps = extract(AssetKind::Script, "static/js/app.js", src).unwrap();
        assert_eq!(deps, vec![PathBuf::from("static/img/icon.svg")]);
    }

    #[test]
    fn test_static_pattern_rewrite() {
        let pattern = StaticPattern::new("/static/").unwrap();
        let out = pattern.rewrite("url(/static/a.png) url(/static/b.png)", |rel| {
            (rel == "a.png").then(|| "/static/v1.png".to_string())
        });
        assert_eq!(out, "url(/static/v1.png) url(/static/b.png)");
    }

    #[test]
    fn test_static_pattern_escapes_prefix() {
        let pattern = StaticPattern::new("/s.t/").unwrap();
        let src = "/s.t/a.png /sxt/b.png";
        assert_eq!(pattern.paths(src).collect::<Vec<_>>(), vec!["a.png"]);
    }
}
