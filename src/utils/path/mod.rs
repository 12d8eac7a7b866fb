//! Path utilities.

pub mod fs;

pub use fs::{clean_path, display_chain, make_static_path, versioned_name, write_atomic};
