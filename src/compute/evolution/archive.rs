//! Run records and population snapshots stored as JSON.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;

use crate::schema::{EvolutionHistory, Individual, OptimizeError, OptimizerConfig, StopReason};

use super::search::{EvolutionEngine, OptimizationResult};

/// Flat record of one optimization run, successful or not.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunRecord {
    pub success: bool,
    /// Validation messages of a rejected configuration.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Gene vector of the best individual.
    pub best_genome: Option<Vec<f64>>,
    pub best_fitness: Option<f64>,
    #[serde(default)]
    pub generations: usize,
    #[serde(default)]
    pub elapsed_seconds: f64,
    #[serde(default)]
    pub history: EvolutionHistory,
    pub stop_reason: Option<StopReason>,
    pub config: OptimizerConfig,
}

impl RunRecord {
    /// Build a record from either outcome of [`optimize`](super::optimize).
    pub fn from_outcome(
        outcome: &Result<OptimizationResult, OptimizeError>,
        config: &OptimizerConfig,
    ) -> Self {
        match outcome {
            Ok(result) => Self {
                success: true,
                errors: Vec::new(),
                best_genome: Some(result.best.genome().to_vec()),
                best_fitness: Some(result.best_fitness),
                generations: result.generations,
                elapsed_seconds: result.elapsed_seconds,
                history: result.history.clone(),
                stop_reason: Some(result.stop_reason),
                config: result.config.clone(),
            },
            Err(err) => Self {
                success: false,
                errors: err.messages(),
                best_genome: None,
                best_fitness: None,
                generations: 0,
                elapsed_seconds: 0.0,
                history: EvolutionHistory::default(),
                stop_reason: None,
                config: config.clone(),
            },
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        write_json(path, self)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        read_json(path)
    }
}

/// Population state that a later run can resume from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopulationSnapshot {
    pub generation: usize,
    pub best_fitness: f64,
    pub individuals: Vec<Individual>,
    #[serde(default)]
    pub history: EvolutionHistory,
}

impl PopulationSnapshot {
    /// Capture the engine's current population.
    pub fn capture(engine: &EvolutionEngine<'_>) -> Self {
        Self {
            generation: engine.generation(),
            best_fitness: engine.best().fitness_or_zero(),
            individuals: engine.population().to_vec(),
            history: engine.history().clone(),
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        write_json(path, self)
    }

    /// Load a snapshot. Individuals with a malformed genome reject the file.
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        read_json(path)
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }
}

fn write_json<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> io::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)
}

fn read_json<P: AsRef<Path>, T: DeserializeOwned>(path: P) -> io::Result<T> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::compute::evolution::{GenomeRng, optimize};
    use crate::schema::{Catalogs, ConfigError, GENOME_LEN, PopulationConfig};

    fn quick_config() -> OptimizerConfig {
        OptimizerConfig {
            population: PopulationConfig {
                size: 10,
                max_generations: 3,
                ..Default::default()
            },
            random_seed: Some(5),
            ..Default::default()
        }
    }

    #[test]
    fn test_record_from_success() {
        let catalogs = Catalogs::default();
        let config = quick_config();
        let outcome = optimize(config.clone(), &catalogs, |_| {});
        let record = RunRecord::from_outcome(&outcome, &config);

        assert!(record.success);
        assert!(record.errors.is_empty());
        assert_eq!(record.best_genome.as_ref().map(Vec::len), Some(GENOME_LEN));
        assert!(record.stop_reason.is_some());
        assert_eq!(record.history.len(), record.generations + 1);
    }

    #[test]
    fn test_record_from_failure() {
        let catalogs = Catalogs::default();
        let mut config = quick_config();
        config.ranch.animals.clear();
        let outcome = optimize(config.clone(), &catalogs, |_| {});
        let record = RunRecord::from_outcome(&outcome, &config);

        assert!(!record.success);
        assert!(record.best_genome.is_none());
        assert!(record.errors.contains(&ConfigError::NoAnimals.to_string()));
    }

    #[test]
    fn test_record_save_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.json");

        let catalogs = Catalogs::default();
        let config = quick_config();
        let outcome = optimize(config.clone(), &catalogs, |_| {});
        let record = RunRecord::from_outcome(&outcome, &config);

        record.save(&path).unwrap();
        let loaded = RunRecord::load(&path).unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.config.population, config.population);
    }

    #[test]
    fn test_snapshot_save_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("population.json");

        let mut rng = GenomeRng::new(9);
        let mut scored = rng.random_individual();
        scored.set_fitness(0.4);
        let snapshot = PopulationSnapshot {
            generation: 12,
            best_fitness: 0.4,
            individuals: vec![scored, rng.random_individual()],
            history: EvolutionHistory::default(),
        };

        snapshot.save(&path).unwrap();
        let loaded = PopulationSnapshot::load(&path).unwrap();
        assert_eq!(loaded, snapshot);
        assert_eq!(loaded.len(), 2);
    }

    #[test]
    fn test_snapshot_rejects_short_genome() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(
            &path,
            r#"{"generation": 1, "best_fitness": 0.1, "individuals": [{"genome": [0.5, 0.5], "fitness": null}]}"#,
        )
        .unwrap();

        let err = PopulationSnapshot::load(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_snapshot_capture_and_resume() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("population.json");
        let catalogs = Catalogs::default();
        let mut config = quick_config();
        config.population.convergence_window = 100;

        let mut engine = EvolutionEngine::new(config.clone(), &catalogs).unwrap();
        let first = engine.run();
        assert_eq!(first.stop_reason, StopReason::MaxGenerations);
        PopulationSnapshot::capture(&engine).save(&path).unwrap();

        let snapshot = PopulationSnapshot::load(&path).unwrap();
        assert_eq!(snapshot.len(), 10);
        assert_eq!(snapshot.generation, 3);
        assert_eq!(snapshot.history, first.history);

        config.population.max_generations = 5;
        let mut resumed = EvolutionEngine::new(config, &catalogs)
            .unwrap()
            .with_snapshot(snapshot.clone());
        let result = resumed.run();
        assert_eq!(result.generations, 5);
        assert_eq!(result.history.len(), 6);
        assert!(result.best_fitness >= snapshot.best_fitness);
    }
}
