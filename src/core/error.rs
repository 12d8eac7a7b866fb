//! Build error taxonomy.
//!
//! Every failure that aborts a run surfaces as one of these variants. The only
//! condition that is *not* an error is a dependency missing on disk, which the
//! resolver logs and skips.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::utils::path::display_chain;

/// Errors that abort a manifest build or a compile batch.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A reference whose argument is not a literal (e.g. a template variable).
    #[error("error parsing {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// The manifest references paths that have no entry. Indicates a resolver bug
    /// or a block listing files that do not exist.
    #[error("dependency error in {}: missing paths: {}", origin.display(), display_chain(missing, ", "))]
    Dependency { origin: PathBuf, missing: Vec<PathBuf> },

    /// The reference graph loops back onto a path still being visited.
    #[error("dependency cycle: {}", display_chain(cycle, " -> "))]
    Cycle { cycle: Vec<PathBuf> },

    /// Structural violation found by the normalizer.
    #[error("invalid manifest: {0}")]
    Invariant(String),

    #[error("compile error in `{operation}`: {message}")]
    Compile { operation: String, message: String },

    #[error("interrupted by user")]
    Interrupted,

    /// Check-only mode found stale blocks or out-of-sync assets.
    #[error("compile needed")]
    NeedsRebuild,

    #[error("IO error at `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest `{}`", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl BuildError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn compile(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Compile {
            operation: operation.into(),
            message: message.into(),
        }
    }
}
