//! Generational genetic algorithm driving the layout search.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::compute::Layout;
use crate::schema::{
    Catalogs, EvolutionHistory, EvolutionPhase, EvolutionProgress, GenerationStats, Individual,
    OptimizeError, OptimizerConfig, StopReason,
};

use super::archive::PopulationSnapshot;
use super::fitness::{Assessment, FitnessEvaluator, INFEASIBLE_FITNESS};
use super::genome::{GenomeRng, genome_distance};
use super::operators::{MutationPlan, mutate_offspring, reproduce, select};

/// Smallest best-fitness gain that resets the convergence window.
pub const IMPROVEMENT_THRESHOLD: f64 = 0.001;
/// Fitness standard deviation below which the population has collapsed.
pub const DIVERSITY_THRESHOLD: f64 = 0.001;

/// Final outcome of an optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Best individual found.
    pub best: Individual,
    pub best_fitness: f64,
    /// Decoded layout and score breakdown of the best individual.
    pub assessment: Assessment,
    /// Generation counter at the end of the run, counting generations of a
    /// resumed snapshot.
    pub generations: usize,
    pub elapsed_seconds: f64,
    /// Number of fitness evaluations performed.
    pub evaluations: u64,
    pub history: EvolutionHistory,
    pub stop_reason: StopReason,
    /// Configuration the run used, with normalized weights.
    pub config: OptimizerConfig,
}

impl OptimizationResult {
    #[inline]
    pub fn layout(&self) -> &Layout {
        &self.assessment.layout
    }
}

/// Evolution engine that runs the search.
pub struct EvolutionEngine<'a> {
    config: OptimizerConfig,
    catalogs: &'a Catalogs,
    rng: GenomeRng,
    pool: Option<rayon::ThreadPool>,
    seeds: Vec<Individual>,
    resume_from: Option<(usize, EvolutionHistory)>,
    population: Vec<Individual>,
    history: EvolutionHistory,
    generation: usize,
    /// Generation this run started from; non-zero when resumed.
    start_generation: usize,
    best: Individual,
    improvement_reference: f64,
    stagnation_count: usize,
    evaluations: u64,
    phase: EvolutionPhase,
    cancelled: Arc<AtomicBool>,
}

impl<'a> EvolutionEngine<'a> {
    /// Create a new evolution engine. Fails if the configuration is invalid.
    pub fn new(mut config: OptimizerConfig, catalogs: &'a Catalogs) -> Result<Self, OptimizeError> {
        config.validate(catalogs)?;
        config.ranch.weights = config.ranch.weights.normalized();

        let mut rng = GenomeRng::with_seed(config.random_seed);
        let placeholder = rng.random_individual();
        let pool = build_pool(config.evaluation.workers);

        Ok(Self {
            config,
            catalogs,
            rng,
            pool,
            seeds: Vec::new(),
            resume_from: None,
            population: Vec::new(),
            history: EvolutionHistory::default(),
            generation: 0,
            start_generation: 0,
            best: placeholder,
            improvement_reference: f64::NEG_INFINITY,
            stagnation_count: 0,
            evaluations: 0,
            phase: EvolutionPhase::Uninitialized,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Start from stored individuals instead of a fully random population.
    /// Extra individuals are dropped; missing ones are drawn at random.
    pub fn with_seed_population(mut self, seeds: Vec<Individual>) -> Self {
        self.seeds = seeds;
        self
    }

    /// Continue a stored run: the snapshot's individuals become the
    /// population and its generation counter and history carry on. The
    /// individuals are re-scored against this engine's configuration, so the
    /// best individual is recovered from them.
    pub fn with_snapshot(mut self, snapshot: PopulationSnapshot) -> Self {
        self.seeds = snapshot.individuals;
        self.resume_from = Some((snapshot.generation, snapshot.history));
        self
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn phase(&self) -> EvolutionPhase {
        self.phase
    }

    pub fn history(&self) -> &EvolutionHistory {
        &self.history
    }

    /// Best individual so far. Unevaluated before the first evaluation.
    pub fn best(&self) -> &Individual {
        &self.best
    }

    /// Scorer bound to this run's configuration.
    pub fn evaluator(&self) -> FitnessEvaluator<'_> {
        FitnessEvaluator::new(&self.config.ranch, self.catalogs)
    }

    /// Initialize the population.
    pub fn initialize(&mut self) {
        self.phase = EvolutionPhase::Initializing;
        let (generation, mut history) = self.resume_from.take().unwrap_or_default();
        // The resumed generation is re-evaluated and recorded again.
        history.generations.retain(|stats| stats.generation < generation);
        self.generation = generation;
        self.start_generation = generation;
        self.history = history;
        self.stagnation_count = 0;
        self.improvement_reference = f64::NEG_INFINITY;

        let size = self.config.population.size;
        let seeds = std::mem::take(&mut self.seeds);
        let reused = seeds.len().min(size);
        if !seeds.is_empty() {
            log::info!("Seeding population with {} stored individuals", reused);
        }

        self.population = seeds
            .into_iter()
            .take(size)
            .map(|seed| Individual::new(seed.into_genome()))
            .collect();
        while self.population.len() < size {
            let individual = self.rng.random_individual();
            self.population.push(individual);
        }
    }

    /// Evaluate every individual without a fitness and refresh the statistics.
    pub fn evaluate_population(&mut self) {
        self.phase = EvolutionPhase::Evaluating;

        let evaluator = FitnessEvaluator::new(&self.config.ranch, self.catalogs);
        let population = &mut self.population;
        let pending = population.iter().filter(|i| i.fitness().is_none()).count();

        let score = |individual: &mut Individual| {
            if individual.fitness().is_none() {
                let fitness = evaluator.evaluate(individual.genome());
                individual.set_fitness(fitness);
            }
        };
        match &self.pool {
            Some(pool) => pool.install(|| population.par_iter_mut().for_each(score)),
            None => population.par_iter_mut().for_each(score),
        }

        self.evaluations += pending as u64;
        self.update_best();
        let stats = self.compute_stats();
        self.history.record(stats);
    }

    fn update_best(&mut self) {
        let Some(current) = self
            .population
            .iter()
            .max_by(|a, b| a.fitness_or_zero().total_cmp(&b.fitness_or_zero()))
        else {
            return;
        };

        let current_fitness = current.fitness_or_zero();
        if self.best.fitness().is_none_or(|best| current_fitness > best) {
            self.best = current.clone();
        }

        if self.improvement_reference == f64::NEG_INFINITY {
            self.improvement_reference = current_fitness;
        } else if current_fitness >= self.improvement_reference + IMPROVEMENT_THRESHOLD {
            self.improvement_reference = current_fitness;
            self.stagnation_count = 0;
        } else {
            self.stagnation_count += 1;
        }
    }

    fn compute_stats(&self) -> GenerationStats {
        let n = self.population.len().max(1) as f64;
        let fitness: Vec<f64> = self.population.iter().map(Individual::fitness_or_zero).collect();

        let best = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = fitness.iter().copied().fold(f64::INFINITY, f64::min);
        let mean = fitness.iter().sum::<f64>() / n;
        let variance = fitness.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;

        let leader = self
            .population
            .iter()
            .max_by(|a, b| a.fitness_or_zero().total_cmp(&b.fitness_or_zero()));
        let diversity = leader.map_or(0.0, |leader| {
            self.population
                .iter()
                .map(|i| genome_distance(i.genome(), leader.genome()))
                .sum::<f64>()
                / n
        });

        GenerationStats {
            generation: self.generation,
            best,
            mean,
            min,
            std_dev: variance.sqrt(),
            diversity,
        }
    }

    /// Selection, reproduction and mutation of one generation.
    pub fn step_generation(&mut self) {
        self.phase = EvolutionPhase::Evolving;
        let ga = &self.config.algorithm;

        let pool = select(&self.population, &ga.selection, &mut self.rng);
        let mut next = reproduce(&self.population, &pool, ga, &mut self.rng);

        let plan = MutationPlan::for_generation(ga, self.generation, self.config.population.max_generations);
        mutate_offspring(&mut next, ga.elitism, &plan, &mut self.rng);

        self.population = next;
        self.generation += 1;
    }

    /// Current progress, once the population has been evaluated.
    pub fn progress(&self, elapsed_seconds: f64) -> Option<EvolutionProgress> {
        let stats = *self.history.latest()?;
        Some(EvolutionProgress {
            generation: self.generation,
            max_generations: self.config.population.max_generations,
            stats,
            best: self.best.clone(),
            stagnation_count: self.stagnation_count,
            elapsed_seconds,
            phase: self.phase,
        })
    }

    /// Check if evolution should stop.
    fn should_stop(&self, elapsed_seconds: f64) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }

        let population = &self.config.population;
        if self.generation >= population.max_generations {
            return Some(StopReason::MaxGenerations);
        }

        if let Some(limit) = population.time_limit_secs
            && elapsed_seconds >= limit
        {
            return Some(StopReason::TimeLimit);
        }

        // The remaining criteria judge generations evolved by this run only.
        if self.generation == self.start_generation {
            return None;
        }

        if let Some(target) = population.target_fitness
            && self.best.fitness_or_zero() >= target
        {
            return Some(StopReason::TargetReached);
        }

        // A population stuck at the infeasible floor is still searching for
        // its first valid layout, not converging.
        if self.best.fitness_or_zero() <= INFEASIBLE_FITNESS {
            return None;
        }

        if self.stagnation_count >= population.convergence_window {
            return Some(StopReason::Converged);
        }

        if let Some(stats) = self.history.latest()
            && stats.std_dev < DIVERSITY_THRESHOLD
        {
            return Some(StopReason::DiversityCollapse);
        }

        None
    }

    /// Run evolution with progress callback.
    ///
    /// The callback runs on this thread after every evaluated generation. A
    /// panic inside it is logged and otherwise ignored. The loop waits for
    /// the callback to return, so a slow callback delays the next generation
    /// and its time counts against `time_limit_secs`.
    pub fn run_with_callback<F>(&mut self, callback: F) -> OptimizationResult
    where
        F: Fn(&EvolutionProgress),
    {
        let start_time = Instant::now();
        log::info!(
            "Starting layout search: population {}, up to {} generations",
            self.config.population.size,
            self.config.population.max_generations
        );

        let report = |engine: &Self| {
            if let Some(progress) = engine.progress(start_time.elapsed().as_secs_f64())
                && catch_unwind(AssertUnwindSafe(|| callback(&progress))).is_err()
            {
                log::warn!("Progress callback panicked at generation {}", progress.generation);
            }
        };

        self.initialize();
        self.evaluate_population();
        report(self);

        let stop_reason = loop {
            if let Some(reason) = self.should_stop(start_time.elapsed().as_secs_f64()) {
                break reason;
            }

            self.step_generation();
            self.evaluate_population();

            if let Some(stats) = self.history.latest() {
                log::debug!(
                    "Generation {}: best {:.4}, mean {:.4}, std {:.4}",
                    stats.generation,
                    stats.best,
                    stats.mean,
                    stats.std_dev
                );
            }
            report(self);
        };

        self.phase = EvolutionPhase::Terminated;
        let elapsed_seconds = start_time.elapsed().as_secs_f64();
        let best = self.best.clone();
        let assessment = self.evaluator().assess(best.genome());

        log::info!(
            "Search stopped after {} generations ({}): best fitness {:.4} in {:.2}s",
            self.generation,
            stop_reason,
            best.fitness_or_zero(),
            elapsed_seconds
        );

        OptimizationResult {
            best_fitness: best.fitness_or_zero(),
            best,
            assessment,
            generations: self.generation,
            elapsed_seconds,
            evaluations: self.evaluations,
            history: self.history.clone(),
            stop_reason,
            config: self.config.clone(),
        }
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> OptimizationResult {
        self.run_with_callback(|_| {})
    }
}

/// Validate, run and report an optimization in one call.
pub fn optimize<F>(
    config: OptimizerConfig,
    catalogs: &Catalogs,
    callback: F,
) -> Result<OptimizationResult, OptimizeError>
where
    F: Fn(&EvolutionProgress),
{
    let mut engine = EvolutionEngine::new(config, catalogs)?;
    Ok(engine.run_with_callback(callback))
}

fn build_pool(workers: usize) -> Option<rayon::ThreadPool> {
    if workers == 0 {
        return None;
    }
    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => Some(pool),
        Err(err) => {
            log::warn!("Could not build a {workers}-thread evaluation pool, using the global pool: {err}");
            None
        }
    }
}
