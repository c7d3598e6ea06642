// Output generation module

pub mod preamble;
pub mod schema;
pub mod templates;

pub use preamble::*;
pub use schema::*;
pub use templates::*;
