//! Ranch Layout - Genetic search for livestock enclosure layouts.
//!
//! A ranch plot holds one enclosure per housed species. Each candidate layout
//! is a 52-gene vector in [0, 1] that decodes into enclosure rectangles,
//! feeder and water positions and a circulation corridor. A genetic algorithm
//! searches for layouts that use land well, keep animals easy to handle and
//! stay within the construction budget.
//!
//! # Architecture
//!
//! The crate is split into two main modules:
//!
//! - `schema`: Configuration, catalogs and the genome representation
//! - `compute`: Decoding, fitness evaluation and evolutionary search
//!
//! # Example
//!
//! ```rust,no_run
//! use ranch_layout::{
//!     compute::evolution::optimize,
//!     schema::{Catalogs, OptimizerConfig},
//! };
//!
//! let catalogs = Catalogs::default();
//! let config = OptimizerConfig::default();
//!
//! match optimize(config, &catalogs, |_| {}) {
//!     Ok(result) => println!("Best fitness: {:.3}", result.best_fitness),
//!     Err(err) => eprintln!("{err}"),
//! }
//! ```

pub mod compute;
pub mod schema;

// Re-export commonly used types
pub use compute::evolution::{EvolutionEngine, OptimizationResult, optimize};
pub use compute::{Layout, decode};
pub use schema::{Catalogs, Genome, OptimizerConfig, RanchConfig};
