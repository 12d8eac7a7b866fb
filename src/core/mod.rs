//! Core types - pure abstractions shared across the codebase.

mod error;
mod kind;
mod state;

pub use error::BuildError;
pub use kind::AssetKind;
pub use state::{CancelToken, setup_shutdown_handler, shutdown_token};
