//! Genome representation.
//!
//! A genome is a fixed vector of 52 normalized genes. Its layout is:
//!
//! ```text
//!  0..32  enclosures       4 species x 8 (x, y, size, aspect, orientation,
//!                          density, access, ventilation)
//! 32..40  feeders          4 species x 2 (x, y relative to the enclosure)
//! 40..48  water points     4 species x 2 (x, y relative to the enclosure)
//! 48..52  infrastructure   corridor width, layout style, main access,
//!                          connectivity
//! ```

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::Species;

/// Total number of genes.
pub const GENOME_LEN: usize = 52;

/// Genes per enclosure.
pub const ENCLOSURE_GENES: usize = 8;

/// Enclosure parameters, one block per species.
pub const ENCLOSURE_BLOCK: Range<usize> = 0..32;
/// Feeder positions, two genes per species.
pub const FEEDER_BLOCK: Range<usize> = 32..40;
/// Water point positions, two genes per species.
pub const WATER_BLOCK: Range<usize> = 40..48;
/// Global infrastructure genes.
pub const INFRASTRUCTURE_BLOCK: Range<usize> = 48..52;

/// The four structural sub-ranges, swapped as units by block crossover.
pub const BLOCKS: [Range<usize>; 4] = [ENCLOSURE_BLOCK, FEEDER_BLOCK, WATER_BLOCK, INFRASTRUCTURE_BLOCK];

/// Errors raised when rebuilding a genome from stored values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenomeError {
    #[error("Genome must have exactly {expected} genes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
    #[error("Gene {index} is {value}, expected a value in [0, 1]")]
    GeneOutOfRange { index: usize, value: f64 },
}

/// Enclosure genes of one species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnclosureGenes {
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub aspect: f64,
    pub orientation: f64,
    pub density: f64,
    pub access: f64,
    pub ventilation: f64,
}

/// Global infrastructure genes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfrastructureGenes {
    pub corridor_width: f64,
    pub layout_style: f64,
    pub main_access: f64,
    pub connectivity: f64,
}

/// Fixed-length normalized genome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Genome {
    genes: [f64; GENOME_LEN],
}

impl Genome {
    /// Build a genome from raw genes, clamping each into [0, 1].
    pub(crate) fn from_array(mut genes: [f64; GENOME_LEN]) -> Self {
        for gene in &mut genes {
            *gene = gene.clamp(0.0, 1.0);
        }
        Self { genes }
    }

    /// Rebuild a genome from a stored vector.
    ///
    /// The vector must contain exactly [`GENOME_LEN`] finite values in
    /// [0, 1]; nothing is truncated, padded or clamped.
    pub fn from_vector(values: &[f64]) -> Result<Self, GenomeError> {
        let genes: [f64; GENOME_LEN] =
            values.try_into().map_err(|_| GenomeError::InvalidLength {
                expected: GENOME_LEN,
                actual: values.len(),
            })?;

        if let Some((index, &value)) = genes
            .iter()
            .enumerate()
            .find(|(_, v)| !(0.0..=1.0).contains(*v))
        {
            return Err(GenomeError::GeneOutOfRange { index, value });
        }

        Ok(Self { genes })
    }

    /// All genes.
    #[inline]
    pub fn genes(&self) -> &[f64; GENOME_LEN] {
        &self.genes
    }

    /// Mutable access for operators. Callers must keep genes in [0, 1].
    #[inline]
    pub(crate) fn genes_mut(&mut self) -> &mut [f64; GENOME_LEN] {
        &mut self.genes
    }

    /// Copy of the genes as a vector.
    pub fn to_vec(&self) -> Vec<f64> {
        self.genes.to_vec()
    }

    /// Enclosure parameters of a species.
    pub fn enclosure_genes(&self, species: Species) -> EnclosureGenes {
        let start = ENCLOSURE_BLOCK.start + species.index() * ENCLOSURE_GENES;
        let g = &self.genes[start..start + ENCLOSURE_GENES];
        EnclosureGenes {
            x: g[0],
            y: g[1],
            size: g[2],
            aspect: g[3],
            orientation: g[4],
            density: g[5],
            access: g[6],
            ventilation: g[7],
        }
    }

    /// Feeder position relative to the enclosure, as (x, y).
    pub fn feeder_genes(&self, species: Species) -> (f64, f64) {
        let start = FEEDER_BLOCK.start + species.index() * 2;
        (self.genes[start], self.genes[start + 1])
    }

    /// Water point position relative to the enclosure, as (x, y).
    pub fn water_genes(&self, species: Species) -> (f64, f64) {
        let start = WATER_BLOCK.start + species.index() * 2;
        (self.genes[start], self.genes[start + 1])
    }

    /// Global infrastructure genes.
    pub fn infrastructure_genes(&self) -> InfrastructureGenes {
        let g = &self.genes[INFRASTRUCTURE_BLOCK];
        InfrastructureGenes {
            corridor_width: g[0],
            layout_style: g[1],
            main_access: g[2],
            connectivity: g[3],
        }
    }
}

impl TryFrom<Vec<f64>> for Genome {
    type Error = GenomeError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_vector(&values)
    }
}

impl From<Genome> for Vec<f64> {
    fn from(genome: Genome) -> Self {
        genome.genes.to_vec()
    }
}

/// A genome with its cached fitness.
///
/// Fitness is `None` until evaluated. Every change to the genome goes
/// through this type so the cached value is always reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    genome: Genome,
    fitness: Option<f64>,
}

impl Individual {
    /// Wrap an unevaluated genome.
    pub fn new(genome: Genome) -> Self {
        Self {
            genome,
            fitness: None,
        }
    }

    /// Rebuild an individual from stored values.
    pub fn from_vector(values: &[f64]) -> Result<Self, GenomeError> {
        Genome::from_vector(values).map(Self::new)
    }

    #[inline]
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    #[inline]
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// Fitness, treating unevaluated individuals as zero.
    #[inline]
    pub fn fitness_or_zero(&self) -> f64 {
        self.fitness.unwrap_or(0.0)
    }

    /// Record the evaluated fitness of the current genome.
    pub fn set_fitness(&mut self, fitness: f64) {
        debug_assert!(self.fitness.is_none(), "fitness already set for this genome");
        self.fitness = Some(fitness);
    }

    /// Edit the genome in place. Invalidates the cached fitness.
    pub(crate) fn edit_genes<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut [f64; GENOME_LEN]),
    {
        edit(self.genome.genes_mut());
        self.fitness = None;
    }

    /// Take the genome, discarding fitness.
    pub fn into_genome(self) -> Genome {
        self.genome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Vec<f64> {
        (0..GENOME_LEN).map(|i| i as f64 / (GENOME_LEN - 1) as f64).collect()
    }

    #[test]
    fn test_from_vector_requires_exact_length() {
        assert!(Genome::from_vector(&ramp()).is_ok());

        let short = vec![0.5; 51];
        assert_eq!(
            Genome::from_vector(&short),
            Err(GenomeError::InvalidLength {
                expected: 52,
                actual: 51
            })
        );

        let long = vec![0.5; 53];
        assert!(matches!(
            Genome::from_vector(&long),
            Err(GenomeError::InvalidLength { actual: 53, .. })
        ));
    }

    #[test]
    fn test_from_vector_rejects_out_of_range() {
        let mut values = vec![0.5; GENOME_LEN];
        values[7] = 1.5;
        assert!(matches!(
            Genome::from_vector(&values),
            Err(GenomeError::GeneOutOfRange { index: 7, .. })
        ));

        values[7] = f64::NAN;
        assert!(Genome::from_vector(&values).is_err());
    }

    #[test]
    fn test_block_accessors() {
        let genome = Genome::from_vector(&ramp()).unwrap();
        let step = 1.0 / (GENOME_LEN - 1) as f64;

        let cows = genome.enclosure_genes(Species::Cows);
        assert!((cows.x - 16.0 * step).abs() < 1e-12);
        assert!((cows.ventilation - 23.0 * step).abs() < 1e-12);

        let (fx, fy) = genome.feeder_genes(Species::Goats);
        assert!((fx - 38.0 * step).abs() < 1e-12);
        assert!((fy - 39.0 * step).abs() < 1e-12);

        let (wx, _) = genome.water_genes(Species::Chickens);
        assert!((wx - 40.0 * step).abs() < 1e-12);

        let infra = genome.infrastructure_genes();
        assert!((infra.corridor_width - 48.0 * step).abs() < 1e-12);
        assert!((infra.connectivity - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_blocks_cover_genome() {
        let covered: usize = BLOCKS.iter().map(|b| b.len()).sum();
        assert_eq!(covered, GENOME_LEN);
        for pair in BLOCKS.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn test_clone_preserves_fitness_and_is_independent() {
        let mut original = Individual::from_vector(&vec![0.5; GENOME_LEN]).unwrap();
        original.set_fitness(0.42);

        let mut copy = original.clone();
        assert_eq!(copy.fitness(), Some(0.42));
        assert_eq!(copy.genome(), original.genome());

        copy.edit_genes(|genes| genes[0] = 0.9);
        assert_eq!(copy.fitness(), None);
        assert_eq!(original.genome().genes()[0], 0.5);
        assert_eq!(original.fitness(), Some(0.42));
    }

    #[test]
    fn test_serialization_roundtrip_validates_length() {
        let mut individual = Individual::from_vector(&ramp()).unwrap();
        individual.set_fitness(0.3);

        let json = serde_json::to_string(&individual).unwrap();
        let parsed: Individual = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, individual);

        let bad = r#"{"genome":[0.1,0.2],"fitness":null}"#;
        assert!(serde_json::from_str::<Individual>(bad).is_err());
    }
}
