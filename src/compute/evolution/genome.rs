//! Genome manipulation utilities for evolutionary search.
//!
//! Provides random generation and the per-gene mutation primitives.

use rand::prelude::*;
use rand_distr::StandardNormal;

use crate::schema::{GENOME_LEN, Genome, Individual};

/// Random number generator wrapper for genome operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Seeded when a seed is given, otherwise from entropy.
    pub fn with_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::random, Self::new)
    }

    /// Generate a genome of independent uniform genes.
    pub fn random_genome(&mut self) -> Genome {
        let mut genes = [0.0; GENOME_LEN];
        for gene in &mut genes {
            *gene = self.rng.r#gen::<f64>();
        }
        Genome::from_array(genes)
    }

    /// Generate an unevaluated individual.
    pub fn random_individual(&mut self) -> Individual {
        Individual::new(self.random_genome())
    }

    /// Uniform value in [0, 1).
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.rng.r#gen()
    }

    #[inline]
    pub fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// `amount` distinct indices from `0..len`.
    pub fn distinct_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.rng, len, amount.min(len)).into_vec()
    }

    /// Gaussian mutation: per gene with probability `rate`, add N(0, intensity).
    pub fn gaussian_mutate(&mut self, individual: &mut Individual, rate: f64, intensity: f64) {
        individual.edit_genes(|genes| {
            for gene in genes.iter_mut() {
                if self.chance(rate) {
                    let noise: f64 = self.rng.sample(StandardNormal);
                    *gene = (*gene + noise * intensity).clamp(0.0, 1.0);
                }
            }
        });
    }

    /// Uniform mutation: per gene with probability `rate`, add U(-intensity, intensity).
    pub fn uniform_mutate(&mut self, individual: &mut Individual, rate: f64, intensity: f64) {
        individual.edit_genes(|genes| {
            for gene in genes.iter_mut() {
                if self.chance(rate) {
                    let delta = (self.unit() * 2.0 - 1.0) * intensity;
                    *gene = (*gene + delta).clamp(0.0, 1.0);
                }
            }
        });
    }

    /// Replacement mutation: per gene with probability `rate`, redraw it.
    pub fn replacement_mutate(&mut self, individual: &mut Individual, rate: f64) {
        individual.edit_genes(|genes| {
            for gene in genes.iter_mut() {
                if self.chance(rate) {
                    *gene = self.unit();
                }
            }
        });
    }
}

impl Genome {
    /// Genome of 52 uniform draws.
    pub fn random(rng: &mut GenomeRng) -> Self {
        rng.random_genome()
    }
}

impl Individual {
    /// Gaussian mutation with the given per-gene rate and intensity.
    /// Always invalidates the cached fitness.
    pub fn mutate(&mut self, rng: &mut GenomeRng, rate: f64, intensity: f64) {
        rng.gaussian_mutate(self, rate, intensity);
    }
}

/// Mean absolute gene difference between two genomes, in [0, 1].
pub fn genome_distance(g1: &Genome, g2: &Genome) -> f64 {
    let total: f64 = g1
        .genes()
        .iter()
        .zip(g2.genes().iter())
        .map(|(a, b)| (a - b).abs())
        .sum();
    total / GENOME_LEN as f64
}
