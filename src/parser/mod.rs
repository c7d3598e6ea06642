// Parser module for extracting model declarations from TypeScript sources

pub mod ast;
pub mod classify;
mod typescript;

pub use ast::*;
pub(crate) use classify::has_excluded_suffix;
pub use classify::{MarkerComment, ModelClassifier, NamingHeuristic};
pub use typescript::{TsVariant, TypeExtractor};
