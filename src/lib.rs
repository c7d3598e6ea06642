//! prisma-typegen - Generate a Prisma schema from TypeScript interfaces
//!
//! Scans a source tree for exported interfaces and object type aliases,
//! infers relations between them and writes a single `schema.prisma`,
//! optionally regenerating it whenever the sources change.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod source;
pub mod watch;

// Re-export main types
pub use analysis::{Analysis, Generator, PassReport, TypeRegistry};
pub use config::Config;
pub use error::{Error, Result};
pub use output::WriteOutcome;
pub use source::{DirectorySource, MemorySource, SourceProvider};
