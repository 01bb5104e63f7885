//! Selection, crossover, mutation and reproduction operators.
//!
//! Selection works on indices into an evaluated population; unevaluated
//! individuals count as zero fitness.

use crate::schema::{
    BLOCKS, CrossoverMethod, GENOME_LEN, GeneticAlgorithmConfig, Genome, Individual, MutationMethod,
    SelectionMethod,
};

use super::genome::GenomeRng;

/// Index of the winner of one tournament of `size` distinct contestants.
pub fn tournament_select(population: &[Individual], size: usize, rng: &mut GenomeRng) -> usize {
    let contestants = rng.distinct_indices(population.len(), size.max(1));
    let mut best = contestants[0];
    for &idx in &contestants[1..] {
        if population[idx].fitness_or_zero() > population[best].fitness_or_zero() {
            best = idx;
        }
    }
    best
}

/// Fitness-proportionate pick; uniform when no individual has positive fitness.
pub fn roulette_select(population: &[Individual], rng: &mut GenomeRng) -> usize {
    let total: f64 = population.iter().map(|i| i.fitness_or_zero().max(0.0)).sum();
    if total <= 0.0 {
        return rng.index(population.len());
    }

    let target = rng.unit() * total;
    let mut cumulative = 0.0;
    for (idx, individual) in population.iter().enumerate() {
        cumulative += individual.fitness_or_zero().max(0.0);
        if cumulative > target {
            return idx;
        }
    }
    population.len() - 1
}

/// Mating pool the size of the population.
pub fn select(population: &[Individual], method: &SelectionMethod, rng: &mut GenomeRng) -> Vec<usize> {
    if population.is_empty() {
        return Vec::new();
    }
    (0..population.len())
        .map(|_| match method {
            SelectionMethod::Tournament { size } => tournament_select(population, *size, rng),
            SelectionMethod::RouletteWheel => roulette_select(population, rng),
        })
        .collect()
}

/// Indices of the `count` fittest individuals, best first. Ties keep
/// population order.
pub fn elite_indices(population: &[Individual], count: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..population.len()).collect();
    order.sort_by(|&a, &b| {
        population[b]
            .fitness_or_zero()
            .total_cmp(&population[a].fitness_or_zero())
    });
    order.truncate(count);
    order
}

/// Each gene goes to the first child from either parent with equal
/// probability; the second child gets the other parent's gene.
pub fn uniform_crossover(p1: &Genome, p2: &Genome, rng: &mut GenomeRng) -> (Genome, Genome) {
    let mut a = *p1.genes();
    let mut b = *p2.genes();
    for i in 0..GENOME_LEN {
        if rng.chance(0.5) {
            std::mem::swap(&mut a[i], &mut b[i]);
        }
    }
    (Genome::from_array(a), Genome::from_array(b))
}

/// Swap whole structural blocks with probability one half each.
pub fn block_crossover(p1: &Genome, p2: &Genome, rng: &mut GenomeRng) -> (Genome, Genome) {
    let mut a = *p1.genes();
    let mut b = *p2.genes();
    for block in BLOCKS {
        if rng.chance(0.5) {
            a[block.clone()].swap_with_slice(&mut b[block]);
        }
    }
    (Genome::from_array(a), Genome::from_array(b))
}

/// Children `alpha*p1 + (1-alpha)*p2` and `(1-alpha)*p1 + alpha*p2`.
pub fn arithmetic_crossover(p1: &Genome, p2: &Genome, alpha: f64) -> (Genome, Genome) {
    let mut a = [0.0; GENOME_LEN];
    let mut b = [0.0; GENOME_LEN];
    for (i, (&x, &y)) in p1.genes().iter().zip(p2.genes().iter()).enumerate() {
        a[i] = alpha * x + (1.0 - alpha) * y;
        b[i] = (1.0 - alpha) * x + alpha * y;
    }
    (Genome::from_array(a), Genome::from_array(b))
}

/// Recombine two parents with the configured method.
pub fn crossover(
    p1: &Genome,
    p2: &Genome,
    method: &CrossoverMethod,
    rng: &mut GenomeRng,
) -> (Genome, Genome) {
    match method {
        CrossoverMethod::Uniform => uniform_crossover(p1, p2, rng),
        CrossoverMethod::Block => block_crossover(p1, p2, rng),
        CrossoverMethod::Arithmetic { alpha } => arithmetic_crossover(p1, p2, *alpha),
    }
}

/// Intensity decaying linearly from `base` at generation zero, never below `floor`.
pub fn adaptive_intensity(base: f64, generation: usize, max_generations: usize, floor: f64) -> f64 {
    let progress = if max_generations == 0 {
        1.0
    } else {
        (generation as f64 / max_generations as f64).min(1.0)
    };
    (base * (1.0 - progress)).max(floor)
}

/// Mutation settings resolved for one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MutationPlan {
    kind: MutationKind,
    rate: f64,
    intensity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MutationKind {
    Gaussian,
    Uniform,
    Replacement,
}

impl MutationPlan {
    pub fn for_generation(config: &GeneticAlgorithmConfig, generation: usize, max_generations: usize) -> Self {
        let (kind, intensity) = match config.mutation {
            MutationMethod::Gaussian => (MutationKind::Gaussian, config.mutation_intensity),
            MutationMethod::Uniform => (MutationKind::Uniform, config.mutation_intensity),
            MutationMethod::Replacement => (MutationKind::Replacement, config.mutation_intensity),
            MutationMethod::Adaptive { floor } => (
                MutationKind::Gaussian,
                adaptive_intensity(config.mutation_intensity, generation, max_generations, floor),
            ),
        };
        Self {
            kind,
            rate: config.mutation_rate,
            intensity,
        }
    }

    pub fn intensity(&self) -> f64 {
        self.intensity
    }

    pub fn apply(&self, individual: &mut Individual, rng: &mut GenomeRng) {
        match self.kind {
            MutationKind::Gaussian => rng.gaussian_mutate(individual, self.rate, self.intensity),
            MutationKind::Uniform => rng.uniform_mutate(individual, self.rate, self.intensity),
            MutationKind::Replacement => rng.replacement_mutate(individual, self.rate),
        }
    }
}

/// Build the next generation: elites copied unchanged, then offspring of
/// random pool pairs until the population is full.
///
/// Returns the new population; the first `elitism` entries are the elites.
pub fn reproduce(
    population: &[Individual],
    pool: &[usize],
    config: &GeneticAlgorithmConfig,
    rng: &mut GenomeRng,
) -> Vec<Individual> {
    let size = population.len();
    let mut next: Vec<Individual> = elite_indices(population, config.elitism.min(size))
        .into_iter()
        .map(|idx| population[idx].clone())
        .collect();

    if pool.is_empty() {
        next.truncate(size);
        return next;
    }

    while next.len() < size {
        let first = &population[pool[rng.index(pool.len())]];
        let second = &population[pool[rng.index(pool.len())]];

        if rng.chance(config.crossover_rate) {
            let (a, b) = crossover(first.genome(), second.genome(), &config.crossover, rng);
            next.push(Individual::new(a));
            next.push(Individual::new(b));
        } else {
            next.push(first.clone());
            next.push(second.clone());
        }
    }

    next.truncate(size);
    next
}

/// Mutate every individual after the elite prefix.
pub fn mutate_offspring(population: &mut [Individual], elitism: usize, plan: &MutationPlan, rng: &mut GenomeRng) {
    for individual in population.iter_mut().skip(elitism) {
        plan.apply(individual, rng);
    }
}
