//! Optimizer configuration and run reporting types.
//!
//! The configuration side describes the genetic algorithm that searches for
//! enclosure layouts. The reporting side carries per-generation statistics
//! and progress snapshots out of the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Catalogs, ConfigError, Individual, RanchConfig};

/// Smallest population the engine accepts.
pub const MIN_POPULATION: usize = 10;

/// Top-level configuration of an optimization run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// The ranch being laid out.
    pub ranch: RanchConfig,
    /// Genetic operators and their rates.
    #[serde(default)]
    pub algorithm: GeneticAlgorithmConfig,
    /// Population and stopping criteria.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Fitness evaluation settings.
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

/// Genetic Algorithm configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticAlgorithmConfig {
    /// Selection method.
    #[serde(default)]
    pub selection: SelectionMethod,
    /// Crossover method.
    #[serde(default)]
    pub crossover: CrossoverMethod,
    /// Crossover probability per parent pair (0.0-1.0).
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    /// Mutation method.
    #[serde(default)]
    pub mutation: MutationMethod,
    /// Mutation probability per gene (0.0-1.0).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Mutation intensity (standard deviation for Gaussian mutation).
    #[serde(default = "default_mutation_intensity")]
    pub mutation_intensity: f64,
    /// Elitism: number of best individuals to preserve unchanged.
    #[serde(default = "default_elitism")]
    pub elitism: usize,
}

impl Default for GeneticAlgorithmConfig {
    fn default() -> Self {
        Self {
            selection: SelectionMethod::default(),
            crossover: CrossoverMethod::default(),
            crossover_rate: default_crossover_rate(),
            mutation: MutationMethod::default(),
            mutation_rate: default_mutation_rate(),
            mutation_intensity: default_mutation_intensity(),
            elitism: default_elitism(),
        }
    }
}

fn default_crossover_rate() -> f64 {
    0.9
}
fn default_mutation_rate() -> f64 {
    0.1
}
fn default_mutation_intensity() -> f64 {
    0.1
}
fn default_elitism() -> usize {
    5
}

/// Selection method for genetic algorithm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method")]
pub enum SelectionMethod {
    /// Tournament selection with configurable size.
    Tournament {
        #[serde(default = "default_tournament_size")]
        size: usize,
    },
    /// Roulette wheel (fitness-proportionate) selection.
    RouletteWheel,
}

impl Default for SelectionMethod {
    fn default() -> Self {
        Self::Tournament {
            size: default_tournament_size(),
        }
    }
}

fn default_tournament_size() -> usize {
    5
}

/// How two parents are recombined.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "method")]
pub enum CrossoverMethod {
    /// Each gene comes from either parent with equal probability.
    #[default]
    Uniform,
    /// Enclosure, feeder, water and infrastructure blocks swap as units.
    Block,
    /// Convex blend of both parents.
    Arithmetic {
        #[serde(default = "default_blend_alpha")]
        alpha: f64,
    },
}

fn default_blend_alpha() -> f64 {
    0.5
}

/// How genes are perturbed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method")]
pub enum MutationMethod {
    /// Additive normal noise.
    Gaussian,
    /// Additive uniform noise within ±intensity.
    Uniform,
    /// Redraw the gene uniformly.
    Replacement,
    /// Gaussian noise whose intensity decays linearly over the run.
    Adaptive {
        #[serde(default = "default_adaptive_floor")]
        floor: f64,
    },
}

impl Default for MutationMethod {
    fn default() -> Self {
        MutationMethod::Adaptive {
            floor: default_adaptive_floor(),
        }
    }
}

fn default_adaptive_floor() -> f64 {
    0.01
}

/// Population and generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals in population.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Maximum number of generations.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
    /// Stop after this many generations without improvement.
    #[serde(default = "default_convergence_window")]
    pub convergence_window: usize,
    /// Target fitness to stop early.
    #[serde(default)]
    pub target_fitness: Option<f64>,
    /// Wall-clock limit in seconds.
    #[serde(default = "default_time_limit")]
    pub time_limit_secs: Option<f64>,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            max_generations: default_max_generations(),
            convergence_window: default_convergence_window(),
            target_fitness: None,
            time_limit_secs: default_time_limit(),
        }
    }
}

fn default_population_size() -> usize {
    50
}
fn default_max_generations() -> usize {
    100
}
fn default_convergence_window() -> usize {
    50
}
fn default_time_limit() -> Option<f64> {
    Some(300.0)
}

/// Evaluation settings for fitness computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Number of parallel evaluations (0 = rayon global pool).
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

fn default_workers() -> usize {
    4
}

// ============================================================================
// Progress and Result Types
// ============================================================================

/// Fitness statistics of one evaluated generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    /// Generation index (0 is the initial population).
    pub generation: usize,
    pub best: f64,
    pub mean: f64,
    pub min: f64,
    /// Population standard deviation of fitness.
    pub std_dev: f64,
    /// Mean gene distance of the population to its best individual.
    pub diversity: f64,
}

/// Append-only record of generation statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct EvolutionHistory {
    pub generations: Vec<GenerationStats>,
}

impl EvolutionHistory {
    pub fn record(&mut self, stats: GenerationStats) {
        self.generations.push(stats);
    }

    pub fn latest(&self) -> Option<&GenerationStats> {
        self.generations.last()
    }

    pub fn len(&self) -> usize {
        self.generations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// Best fitness per generation, for plotting.
    pub fn best_series(&self) -> Vec<f64> {
        self.generations.iter().map(|s| s.best).collect()
    }
}

/// Progress update sent after each generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Current generation number.
    pub generation: usize,
    /// Total generations planned.
    pub max_generations: usize,
    /// Statistics of the current population.
    pub stats: GenerationStats,
    /// Best individual found so far.
    pub best: Individual,
    /// Generations since last improvement.
    pub stagnation_count: usize,
    /// Seconds since the run started.
    pub elapsed_seconds: f64,
    /// Current phase of the algorithm.
    pub phase: EvolutionPhase,
}

/// Current phase of evolution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EvolutionPhase {
    /// No population yet.
    #[default]
    Uninitialized,
    /// Creating the initial population.
    Initializing,
    /// Scoring unevaluated individuals.
    Evaluating,
    /// Selection, reproduction and mutation.
    Evolving,
    /// A stopping criterion fired.
    Terminated,
}

/// Reason evolution stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached maximum generations.
    MaxGenerations,
    /// No meaningful improvement within the convergence window.
    Converged,
    /// Reached target fitness.
    TargetReached,
    /// Wall-clock limit hit.
    TimeLimit,
    /// Fitness spread collapsed.
    DiversityCollapse,
    /// User cancelled.
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StopReason::MaxGenerations => "generation cap reached",
            StopReason::Converged => "converged",
            StopReason::TargetReached => "target fitness reached",
            StopReason::TimeLimit => "time limit reached",
            StopReason::DiversityCollapse => "fitness diversity collapsed",
            StopReason::Cancelled => "cancelled",
        };
        f.write_str(text)
    }
}

// ============================================================================
// Validation
// ============================================================================

/// Errors that prevent an optimization from starting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OptimizeError {
    #[error("Invalid configuration: {}", join_messages(.0))]
    InvalidConfiguration(Vec<ConfigError>),
}

impl OptimizeError {
    /// Human-readable message per problem.
    pub fn messages(&self) -> Vec<String> {
        match self {
            OptimizeError::InvalidConfiguration(errors) => {
                errors.iter().map(ToString::to_string).collect()
            }
        }
    }
}

fn join_messages(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl OptimizerConfig {
    /// Validate the whole configuration, reporting every problem at once.
    pub fn validate(&self, catalogs: &Catalogs) -> Result<(), OptimizeError> {
        let mut errors = self.ranch.validate(catalogs);
        errors.extend(self.algorithm_errors());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(OptimizeError::InvalidConfiguration(errors))
        }
    }

    fn algorithm_errors(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let population = self.population.size;
        let ga = &self.algorithm;

        if population < MIN_POPULATION {
            errors.push(ConfigError::PopulationTooSmall(population));
        }
        if self.population.max_generations == 0 {
            errors.push(ConfigError::ZeroGenerations);
        }
        if ga.elitism >= population {
            errors.push(ConfigError::ElitismTooLarge {
                elitism: ga.elitism,
                population,
            });
        }
        if let SelectionMethod::Tournament { size } = ga.selection
            && (size == 0 || size > population)
        {
            errors.push(ConfigError::InvalidTournamentSize { size, population });
        }

        let mut probabilities = vec![
            ("crossover_rate", ga.crossover_rate),
            ("mutation_rate", ga.mutation_rate),
        ];
        if let CrossoverMethod::Arithmetic { alpha } = ga.crossover {
            probabilities.push(("alpha", alpha));
        }
        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                errors.push(ConfigError::ProbabilityOutOfRange { name, value });
            }
        }

        let mut positives = vec![
            ("mutation_intensity", ga.mutation_intensity),
            (
                "convergence_window",
                self.population.convergence_window as f64,
            ),
        ];
        if let MutationMethod::Adaptive { floor } = ga.mutation {
            positives.push(("adaptive floor", floor));
        }
        if let Some(limit) = self.population.time_limit_secs {
            positives.push(("time_limit_secs", limit));
        }
        for (name, value) in positives {
            if !(value > 0.0) {
                errors.push(ConfigError::NonPositiveParameter { name, value });
            }
        }

        errors
    }
}
