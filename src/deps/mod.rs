//! Dependency discovery: per-kind extractors and the recursive resolver.

mod extract;
mod resolver;

pub use extract::{ExtractContext, StaticPattern};
pub use resolver::DependencyResolver;
