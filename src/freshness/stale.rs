//! Diff a freshly built manifest against the cached one.

use crate::compiler::Block;
use crate::manifest::Manifest;
use crate::{debug, log};

/// What a run has to do.
#[derive(Debug)]
pub struct Staleness<'b> {
    /// Blocks whose compiled output must be regenerated.
    pub stale: Vec<&'b dyn Block>,
    /// Some referenced static asset is new or changed since the cached build.
    pub assets_out_of_sync: bool,
}

impl Staleness<'_> {
    /// Nothing to compile and nothing to persist.
    pub fn is_noop(&self) -> bool {
        self.stale.is_empty() && !self.assets_out_of_sync
    }
}

/// Decides which blocks are stale relative to the previous successful build.
pub struct StalenessDetector<'m> {
    cached: &'m Manifest,
    current: &'m Manifest,
    force: bool,
}

impl<'m> StalenessDetector<'m> {
    pub fn new(cached: &'m Manifest, current: &'m Manifest) -> Self {
        Self {
            cached,
            current,
            force: false,
        }
    }

    /// Treat every block as stale regardless of the diff.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn detect<'b>(&self, blocks: &'b [Box<dyn Block>]) -> Staleness<'b> {
        let stale: Vec<&dyn Block> = if self.force {
            blocks.iter().map(|b| b.as_ref()).collect()
        } else {
            blocks
                .iter()
                .map(|b| b.as_ref())
                .filter(|b| b.needs_recompile(self.cached, self.current))
                .collect()
        };
        debug!("stale"; "{} of {} blocks stale", stale.len(), blocks.len());

        Staleness {
            stale,
            assets_out_of_sync: self.assets_out_of_sync(),
        }
    }

    /// Check every current asset against the cached manifest, warning per asset.
    pub fn assets_out_of_sync(&self) -> bool {
        let mut out_of_sync = false;
        for (path, entry) in &self.current.assets {
            match self.cached.assets.get(path) {
                None => {
                    log!("warning"; "static asset {} not in cached manifest", path.display());
                    out_of_sync = true;
                }
                Some(cached) if cached.version != entry.version => {
                    log!("warning"; "static asset {} version mismatch", path.display());
                    out_of_sync = true;
                }
                Some(_) => {}
            }
        }
        if out_of_sync {
            log!("warning"; "static assets out of sync");
        }
        out_of_sync
    }
}
