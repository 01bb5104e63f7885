//! Evolutionary search for enclosure layouts.
//!
//! # Overview
//!
//! The search system consists of:
//!
//! - **Genome Operations** (`genome`): Random generation and per-gene mutation
//! - **Fitness** (`fitness`): Budget-aware scoring of decoded layouts
//! - **Operators** (`operators`): Selection, crossover and reproduction
//! - **Search** (`search`): The generational engine and its stop criteria
//! - **Archive** (`archive`): Run records and population snapshots
//!
//! # Example
//!
//! ```rust,no_run
//! use ranch_layout::schema::{Catalogs, OptimizerConfig};
//! use ranch_layout::compute::evolution::optimize;
//!
//! let catalogs = Catalogs::default();
//! let result = optimize(OptimizerConfig::default(), &catalogs, |progress| {
//!     println!("Generation {}: best fitness = {:.3}",
//!         progress.generation, progress.stats.best);
//! })
//! .expect("valid configuration");
//!
//! println!("Best fitness: {:.3}", result.best_fitness);
//! for enclosure in &result.layout().enclosures {
//!     println!("{}: {:?}", enclosure.species, enclosure.rect());
//! }
//! ```
//!
//! # Fitness bands
//!
//! - Infeasible layouts (unplaced enclosure, overlap, too close): `0.001`
//! - Over-budget layouts: `[0.002, 0.05)`
//! - Feasible layouts: `[0.05, 1.0]`

mod archive;
mod fitness;
mod genome;
mod operators;
mod search;

pub use archive::{PopulationSnapshot, RunRecord};
pub use fitness::{
    Assessment, CostBreakdown, FitnessEvaluator, INFEASIBLE_FITNESS, MAX_BUDGET_PENALTY,
    MIN_BUDGET_PENALTY, MIN_FEASIBLE_FITNESS, Objectives, Verdict,
};
pub use genome::{GenomeRng, genome_distance};
pub use operators::{
    MutationPlan, adaptive_intensity, arithmetic_crossover, block_crossover, crossover,
    elite_indices, mutate_offspring, reproduce, roulette_select, select, tournament_select,
    uniform_crossover,
};
pub use search::{
    DIVERSITY_THRESHOLD, EvolutionEngine, IMPROVEMENT_THRESHOLD, OptimizationResult, optimize,
};
