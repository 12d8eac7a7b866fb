//! Freshness detection: blake3 content versions and manifest diffing.

mod hash;
mod stale;
mod version;

pub use hash::ContentHash;
pub use stale::StalenessDetector;
pub use version::assign_versions;
