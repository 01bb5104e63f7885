//! Ranch configuration: plot, herd, materials, budget and objective weights.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Catalogs, Material, Species, SpeciesCatalog};

/// Share of the plot the enclosures may claim before circulation space.
const USABLE_PLOT_SHARE: f64 = 0.85;
/// Allowance for circulation space on top of the minimum enclosure area.
const CIRCULATION_ALLOWANCE: f64 = 1.4;

fn default_circulation_distance() -> f64 {
    2.0
}

/// Everything the caller supplies about the ranch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RanchConfig {
    /// Plot width in meters (X axis).
    pub plot_width: f64,
    /// Plot height in meters (Y axis).
    pub plot_height: f64,
    /// Animal count per species. Missing species count as zero.
    #[serde(default)]
    pub animals: BTreeMap<Species, u32>,
    /// Fence material chosen for each species.
    #[serde(default)]
    pub materials: BTreeMap<Species, Material>,
    /// Minimum clearance between enclosures (m).
    #[serde(default = "default_circulation_distance")]
    pub circulation_distance: f64,
    /// Construction budget.
    pub budget: BudgetConfig,
    /// Objective weights.
    #[serde(default)]
    pub weights: ObjectiveWeights,
    /// Scaling constants of the fitness objectives.
    #[serde(default)]
    pub calibration: FitnessCalibration,
}

impl Default for RanchConfig {
    fn default() -> Self {
        Self {
            plot_width: 40.0,
            plot_height: 30.0,
            animals: BTreeMap::from([
                (Species::Chickens, 50),
                (Species::Pigs, 8),
                (Species::Cows, 3),
                (Species::Goats, 15),
            ]),
            materials: BTreeMap::from([
                (Species::Chickens, Material::PoultryMesh),
                (Species::Pigs, Material::WeldedSteelPanel),
                (Species::Cows, Material::OakRail),
                (Species::Goats, Material::ReinforcedWire),
            ]),
            circulation_distance: default_circulation_distance(),
            budget: BudgetConfig::default(),
            weights: ObjectiveWeights::default(),
            calibration: FitnessCalibration::default(),
        }
    }
}

impl RanchConfig {
    /// Number of animals of a species.
    #[inline]
    pub fn count(&self, species: Species) -> u32 {
        self.animals.get(&species).copied().unwrap_or(0)
    }

    pub fn total_animals(&self) -> u64 {
        self.animals.values().map(|&n| u64::from(n)).sum()
    }

    /// Species with at least one animal, in genome order.
    pub fn housed_species(&self) -> impl Iterator<Item = Species> + '_ {
        Species::ALL.into_iter().filter(|&s| self.count(s) > 0)
    }

    #[inline]
    pub fn plot_area(&self) -> f64 {
        self.plot_width * self.plot_height
    }

    pub fn material(&self, species: Species) -> Option<Material> {
        self.materials.get(&species).copied()
    }

    /// Sum of the minimum enclosure areas of every housed species.
    pub fn min_total_area(&self, catalog: &SpeciesCatalog) -> f64 {
        self.housed_species()
            .map(|s| catalog.min_enclosure_area(s, self.count(s)))
            .sum()
    }

    /// Check the ranch against the catalogs. Returns every problem found.
    pub fn validate(&self, catalogs: &Catalogs) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if !(self.plot_width > 0.0 && self.plot_height > 0.0) {
            errors.push(ConfigError::InvalidPlotDimensions {
                width: self.plot_width,
                height: self.plot_height,
            });
        }

        if !(1.0..=5.0).contains(&self.circulation_distance) {
            errors.push(ConfigError::CirculationOutOfRange(self.circulation_distance));
        }

        if self.total_animals() == 0 {
            errors.push(ConfigError::NoAnimals);
        }

        if !(self.budget.amount > 0.0) {
            errors.push(ConfigError::InvalidBudget(self.budget.amount));
        }
        if let Some(margin) = self.budget.minimum_safe_margin
            && !(margin >= 0.0)
        {
            errors.push(ConfigError::NegativeSafetyMargin(margin));
        }

        errors.extend(self.weights.validate());
        errors.extend(self.calibration.validate());

        for species in self.housed_species() {
            match self.material(species) {
                None => errors.push(ConfigError::MissingMaterial(species)),
                Some(material) => match catalogs.materials.get(material) {
                    None => errors.push(ConfigError::UnknownMaterial { species, material }),
                    Some(info) if !info.suits(species) => {
                        errors.push(ConfigError::IncompatibleMaterial { species, material })
                    }
                    Some(_) => {}
                },
            }
        }

        if self.total_animals() > 0 && self.plot_width > 0.0 && self.plot_height > 0.0 {
            let required = self.min_total_area(&catalogs.species) * CIRCULATION_ALLOWANCE;
            let available = self.plot_area() * USABLE_PLOT_SHARE;
            if required > available {
                errors.push(ConfigError::PlotTooSmall { required, available });
            }
        }

        errors
    }
}

fn default_budget_amount() -> f64 {
    50_000.0
}
fn default_safety_margin() -> Option<f64> {
    Some(0.10)
}

/// Construction budget and its safety-margin policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Amount entered by the user.
    #[serde(default = "default_budget_amount")]
    pub amount: f64,
    /// When set, the effective budget is raised to at least the cheapest
    /// buildable layout plus this fraction. `None` makes `amount` a strict cap.
    #[serde(default = "default_safety_margin")]
    pub minimum_safe_margin: Option<f64>,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            amount: default_budget_amount(),
            minimum_safe_margin: default_safety_margin(),
        }
    }
}

impl BudgetConfig {
    /// A budget the optimizer may not raise.
    pub fn strict(amount: f64) -> Self {
        Self {
            amount,
            minimum_safe_margin: None,
        }
    }
}

fn default_land_weight() -> f64 {
    0.6
}
fn default_handling_weight() -> f64 {
    0.4
}

/// Relative importance of the two objectives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    #[serde(default = "default_land_weight")]
    pub land_utilization: f64,
    #[serde(default = "default_handling_weight")]
    pub handling_efficiency: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            land_utilization: default_land_weight(),
            handling_efficiency: default_handling_weight(),
        }
    }
}

impl ObjectiveWeights {
    /// Weights scaled to sum to one. Unchanged if the sum is not positive.
    pub fn normalized(self) -> Self {
        let total = self.land_utilization + self.handling_efficiency;
        if total > 0.0 {
            Self {
                land_utilization: self.land_utilization / total,
                handling_efficiency: self.handling_efficiency / total,
            }
        } else {
            self
        }
    }

    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        for (objective, value) in [
            ("land_utilization", self.land_utilization),
            ("handling_efficiency", self.handling_efficiency),
        ] {
            if !(value >= 0.0) {
                errors.push(ConfigError::NegativeWeight { objective, value });
            }
        }
        if errors.is_empty() && self.land_utilization + self.handling_efficiency <= 0.0 {
            errors.push(ConfigError::ZeroWeights);
        }
        errors
    }
}

fn default_target_occupancy() -> f64 {
    0.70
}
fn default_expansion_ceiling() -> f64 {
    3.0
}
fn default_occupancy_blend() -> f64 {
    0.6
}
fn default_reference_min_gap() -> f64 {
    4.0
}
fn default_reference_mean_gap() -> f64 {
    10.0
}
fn default_min_gap_blend() -> f64 {
    0.5
}

/// Constants that scale raw layout measurements into objective scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessCalibration {
    /// Plot occupancy that earns the full occupancy score.
    #[serde(default = "default_target_occupancy")]
    pub target_occupancy: f64,
    /// Mean enlargement factor that earns the full expansion score.
    #[serde(default = "default_expansion_ceiling")]
    pub expansion_ceiling: f64,
    /// Share of land utilization given to occupancy (rest is expansion).
    #[serde(default = "default_occupancy_blend")]
    pub occupancy_blend: f64,
    /// Smallest enclosure gap (m) that earns the full score.
    #[serde(default = "default_reference_min_gap")]
    pub reference_min_gap: f64,
    /// Mean enclosure gap (m) that earns the full score.
    #[serde(default = "default_reference_mean_gap")]
    pub reference_mean_gap: f64,
    /// Share of handling efficiency given to the smallest gap.
    #[serde(default = "default_min_gap_blend")]
    pub min_gap_blend: f64,
}

impl Default for FitnessCalibration {
    fn default() -> Self {
        Self {
            target_occupancy: default_target_occupancy(),
            expansion_ceiling: default_expansion_ceiling(),
            occupancy_blend: default_occupancy_blend(),
            reference_min_gap: default_reference_min_gap(),
            reference_mean_gap: default_reference_mean_gap(),
            min_gap_blend: default_min_gap_blend(),
        }
    }
}

impl FitnessCalibration {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        for (name, value) in [
            ("target_occupancy", self.target_occupancy),
            ("reference_min_gap", self.reference_min_gap),
            ("reference_mean_gap", self.reference_mean_gap),
        ] {
            if !(value > 0.0) {
                errors.push(ConfigError::InvalidCalibration { name, value });
            }
        }
        if !(self.expansion_ceiling > 1.0) {
            errors.push(ConfigError::InvalidCalibration {
                name: "expansion_ceiling",
                value: self.expansion_ceiling,
            });
        }
        for (name, value) in [
            ("occupancy_blend", self.occupancy_blend),
            ("min_gap_blend", self.min_gap_blend),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(ConfigError::ProbabilityOutOfRange { name, value });
            }
        }
        errors
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Plot dimensions must be positive (got {width} x {height})")]
    InvalidPlotDimensions { width: f64, height: f64 },
    #[error("Circulation distance must be between 1.0 and 5.0 m (got {0})")]
    CirculationOutOfRange(f64),
    #[error("At least one animal must be configured")]
    NoAnimals,
    #[error("Budget must be positive (got {0})")]
    InvalidBudget(f64),
    #[error("Safety margin cannot be negative (got {0})")]
    NegativeSafetyMargin(f64),
    #[error("Weight of {objective} cannot be negative (got {value})")]
    NegativeWeight { objective: &'static str, value: f64 },
    #[error("At least one objective must have a positive weight")]
    ZeroWeights,
    #[error("Calibration constant {name} is out of range (got {value})")]
    InvalidCalibration { name: &'static str, value: f64 },
    #[error("No fence material selected for {0}")]
    MissingMaterial(Species),
    #[error("Material {material:?} selected for {species} is not in the catalog")]
    UnknownMaterial { species: Species, material: Material },
    #[error("Material {material:?} is not suitable for {species}")]
    IncompatibleMaterial { species: Species, material: Material },
    #[error(
        "Plot is too small once circulation space is included: about {required:.0} m² needed, {available:.0} m² available"
    )]
    PlotTooSmall { required: f64, available: f64 },
    #[error("Population size must be at least 10 (got {0})")]
    PopulationTooSmall(usize),
    #[error("Generation cap must be at least 1")]
    ZeroGenerations,
    #[error("Elite count {elitism} must be smaller than the population size {population}")]
    ElitismTooLarge { elitism: usize, population: usize },
    #[error("Tournament size {size} must be between 1 and the population size {population}")]
    InvalidTournamentSize { size: usize, population: usize },
    #[error("{name} must be within [0, 1] (got {value})")]
    ProbabilityOutOfRange { name: &'static str, value: f64 },
    #[error("{name} must be positive (got {value})")]
    NonPositiveParameter { name: &'static str, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = RanchConfig::default();
        assert!(config.validate(&Catalogs::default()).is_empty());
        assert_eq!(config.total_animals(), 76);
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let config = RanchConfig {
            plot_width: 0.0,
            circulation_distance: 0.5,
            animals: BTreeMap::new(),
            budget: BudgetConfig::strict(-1.0),
            ..RanchConfig::default()
        };
        let errors = config.validate(&Catalogs::default());

        assert!(errors.iter().any(|e| matches!(e, ConfigError::InvalidPlotDimensions { .. })));
        assert!(errors.contains(&ConfigError::CirculationOutOfRange(0.5)));
        assert!(errors.contains(&ConfigError::NoAnimals));
        assert!(errors.contains(&ConfigError::InvalidBudget(-1.0)));
        assert!(errors.len() >= 4);
    }

    #[test]
    fn test_circulation_bounds_inclusive() {
        let catalogs = Catalogs::default();
        for distance in [1.0, 5.0] {
            let config = RanchConfig {
                circulation_distance: distance,
                ..RanchConfig::default()
            };
            assert!(config.validate(&catalogs).is_empty());
        }
        let config = RanchConfig {
            circulation_distance: 5.1,
            ..RanchConfig::default()
        };
        assert_eq!(
            config.validate(&catalogs),
            vec![ConfigError::CirculationOutOfRange(5.1)]
        );
    }

    #[test]
    fn test_plot_too_small() {
        let config = RanchConfig {
            plot_width: 10.0,
            plot_height: 10.0,
            ..RanchConfig::default()
        };
        let errors = config.validate(&Catalogs::default());
        let available = errors.iter().find_map(|e| match e {
            ConfigError::PlotTooSmall { available, .. } => Some(*available),
            _ => None,
        });
        // Reported figure is the usable share the check compares against.
        assert_eq!(available, Some(100.0 * USABLE_PLOT_SHARE));
    }

    #[test]
    fn test_material_checks() {
        let mut config = RanchConfig::default();
        config.materials.insert(Species::Chickens, Material::BarbedWire);
        config.materials.remove(&Species::Pigs);

        let errors = config.validate(&Catalogs::default());
        assert!(errors.contains(&ConfigError::IncompatibleMaterial {
            species: Species::Chickens,
            material: Material::BarbedWire
        }));
        assert!(errors.contains(&ConfigError::MissingMaterial(Species::Pigs)));
    }

    #[test]
    fn test_material_ignored_for_absent_species() {
        let mut config = RanchConfig::default();
        config.animals.insert(Species::Cows, 0);
        config.materials.remove(&Species::Cows);
        assert!(config.validate(&Catalogs::default()).is_empty());
    }

    #[test]
    fn test_weights() {
        let weights = ObjectiveWeights {
            land_utilization: 3.0,
            handling_efficiency: 1.0,
        }
        .normalized();
        assert!((weights.land_utilization - 0.75).abs() < 1e-12);
        assert!((weights.handling_efficiency - 0.25).abs() < 1e-12);

        let zero = ObjectiveWeights {
            land_utilization: 0.0,
            handling_efficiency: 0.0,
        };
        assert_eq!(zero.validate(), vec![ConfigError::ZeroWeights]);

        let negative = ObjectiveWeights {
            land_utilization: -0.1,
            handling_efficiency: 1.0,
        };
        assert_eq!(negative.validate().len(), 1);
    }

    #[test]
    fn test_serialization_defaults() {
        let json = r#"{
            "plot_width": 40.0,
            "plot_height": 30.0,
            "animals": {"chickens": 10},
            "materials": {"chickens": "poultry_mesh"},
            "budget": {"amount": 20000.0}
        }"#;
        let config: RanchConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.count(Species::Chickens), 10);
        assert_eq!(config.count(Species::Cows), 0);
        assert_eq!(config.circulation_distance, 2.0);
        assert_eq!(config.budget.minimum_safe_margin, Some(0.10));
        assert_eq!(config.calibration, FitnessCalibration::default());
        assert!(config.validate(&Catalogs::default()).is_empty());
    }
}
