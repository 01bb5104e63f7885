//! Schema module - Catalogs, configuration and genome types for ranch layout search.

mod catalog;
mod config;
mod evolution;
mod genome;

pub use catalog::*;
pub use config::*;
pub use evolution::*;
pub use genome::*;
