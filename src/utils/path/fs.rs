//! Path normalization utilities.
//!
//! Manifest keys must be identical across runs and machines, so paths are
//! cleaned lexically instead of canonicalized:
//! - `clean_path` - drop `.` components and fold `..` where possible
//! - `make_static_path` - map a static URL path onto the static directory
//!
//! `write_atomic` lives here too: outputs are never observable half-written.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Lexically normalize a path without touching the filesystem.
///
/// Relative paths stay relative; a leading `..` that cannot be folded is kept.
///
/// # Example
/// ```ignore
/// clean_path(Path::new("static/css/../img/./logo.png")) // -> static/img/logo.png
/// ```
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let can_pop = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                );
                if can_pop {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Resolve a static URL path (relative to the URL prefix) under `static_dir`.
#[inline]
pub fn make_static_path(static_dir: &Path, rel: &str) -> PathBuf {
    clean_path(&static_dir.join(rel.trim_start_matches('/')))
}

/// Cache-busted file name: `version` followed by the original extension.
pub fn versioned_name(version: &str, path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{version}.{ext}"),
        None => version.to_string(),
    }
}

/// Join displayed paths with a separator (for error messages).
pub fn display_chain(paths: &[PathBuf], sep: &str) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(sep)
}

static TMP_SEQ: AtomicUsize = AtomicUsize::new(0);

/// Write `data` to `dest` via a sibling temp file and rename.
///
/// Readers see either the old file or the complete new one.
pub fn write_atomic(dest: &Path, data: &[u8]) -> io::Result<()> {
    let name = dest
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no file name"))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(name);
    let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
    tmp_name.push(format!(".{}.{seq}.tmp", std::process::id()));
    let tmp_path = dest.with_file_name(tmp_name);

    let result = (|| {
        let mut file = File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);
        std::fs::rename(&tmp_path, dest)
    })();
    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}
