//! Fitness evaluation for enclosure layouts.
//!
//! Scores fall into three bands so selection always prefers, in order:
//! feasible in-budget layouts, over-budget layouts, structurally invalid
//! layouts.
//!
//! | outcome      | score                          |
//! |--------------|--------------------------------|
//! | infeasible   | [`INFEASIBLE_FITNESS`]         |
//! | over budget  | `[0.002, 0.05)`, by overrun    |
//! | feasible     | `[0.05, 1.0]`                  |

use serde::{Deserialize, Serialize};

use crate::compute::{Layout, Parameter, decode, map};
use crate::schema::{Catalogs, Genome, RanchConfig, Species};

/// Score of a layout with an unplaceable or overlapping enclosure.
pub const INFEASIBLE_FITNESS: f64 = 0.001;
/// Lowest score of an over-budget layout.
pub const MIN_BUDGET_PENALTY: f64 = 0.002;
/// Over-budget scores stay below this value.
pub const MAX_BUDGET_PENALTY: f64 = 0.05;
/// Lowest score of a feasible, in-budget layout.
pub const MIN_FEASIBLE_FITNESS: f64 = 0.05;

/// Corridor surfacing cost per square meter.
const CORRIDOR_COST_PER_M2: f64 = 30.0;
/// Corridor length as a multiple of plot width plus height.
const CORRIDOR_LENGTH_FACTOR: f64 = 1.5;
/// Gates, feeders and water points per enclosure.
const FITTINGS_COST: f64 = 500.0;
/// Fence price used when a material is missing from the catalog.
const FALLBACK_COST_PER_METER: f64 = 85.0;
/// Handling efficiency of a layout without enclosure pairs.
const SINGLE_ENCLOSURE_EFFICIENCY: f64 = 0.9;
/// Largest bonus for staying under budget.
const MAX_SAVINGS_BONUS: f64 = 0.05;
/// Share of the budget below which the savings bonus starts.
const SAVINGS_THRESHOLD: f64 = 0.8;

/// Classification of an evaluated layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Feasible,
    OverBudget,
    Infeasible,
}

/// Construction cost of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub fencing: f64,
    pub corridors: f64,
    pub fittings: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.fencing + self.corridors + self.fittings
    }
}

/// Objective scores in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Objectives {
    pub land_utilization: f64,
    pub handling_efficiency: f64,
}

/// Full breakdown behind a fitness value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub layout: Layout,
    pub verdict: Verdict,
    pub cost: CostBreakdown,
    pub effective_budget: f64,
    /// Present for in-budget layouts only.
    pub objectives: Option<Objectives>,
    pub savings_bonus: f64,
    pub fitness: f64,
}

/// Scores genomes against one ranch.
///
/// Borrows the configuration and catalogs; holds no mutable state, so
/// evaluating the same genome always gives the same score.
pub struct FitnessEvaluator<'a> {
    ranch: &'a RanchConfig,
    catalogs: &'a Catalogs,
    effective_budget: f64,
}

impl<'a> FitnessEvaluator<'a> {
    /// Create a new fitness evaluator. Weights are used as given.
    pub fn new(ranch: &'a RanchConfig, catalogs: &'a Catalogs) -> Self {
        let mut evaluator = Self {
            ranch,
            catalogs,
            effective_budget: ranch.budget.amount,
        };
        if let Some(margin) = ranch.budget.minimum_safe_margin {
            let safe = evaluator.minimum_safe_cost() * (1.0 + margin);
            evaluator.effective_budget = ranch.budget.amount.max(safe);
        }
        evaluator
    }

    /// Budget the cost is checked against.
    #[inline]
    pub fn effective_budget(&self) -> f64 {
        self.effective_budget
    }

    pub fn decode(&self, genome: &Genome) -> Layout {
        decode(genome, self.ranch, &self.catalogs.species)
    }

    /// Fitness of a genome.
    pub fn evaluate(&self, genome: &Genome) -> f64 {
        self.assess(genome).fitness
    }

    /// Decode and score a genome, keeping every intermediate value.
    pub fn assess(&self, genome: &Genome) -> Assessment {
        self.assess_layout(self.decode(genome))
    }

    /// Score an already decoded layout.
    pub fn assess_layout(&self, layout: Layout) -> Assessment {
        let cost = self.construction_cost(&layout);
        let budget = self.effective_budget;

        let mut assessment = Assessment {
            layout,
            verdict: Verdict::Infeasible,
            cost,
            effective_budget: budget,
            objectives: None,
            savings_bonus: 0.0,
            fitness: INFEASIBLE_FITNESS,
        };

        if !assessment.layout.is_feasible() {
            return assessment;
        }

        let total = cost.total();
        if total > budget {
            let overrun = total / budget;
            assessment.verdict = Verdict::OverBudget;
            assessment.fitness = (MAX_BUDGET_PENALTY / overrun).max(MIN_BUDGET_PENALTY);
            return assessment;
        }

        let objectives = Objectives {
            land_utilization: self.land_utilization(&assessment.layout),
            handling_efficiency: self.handling_efficiency(&assessment.layout),
        };
        let bonus = savings_bonus(total, budget);
        let weights = &self.ranch.weights;
        let score = weights.land_utilization * objectives.land_utilization
            + weights.handling_efficiency * objectives.handling_efficiency
            + bonus;

        assessment.verdict = Verdict::Feasible;
        assessment.objectives = Some(objectives);
        assessment.savings_bonus = bonus;
        assessment.fitness = score.clamp(MIN_FEASIBLE_FITNESS, 1.0);
        assessment
    }

    /// Fencing, corridor and fittings cost of a layout.
    pub fn construction_cost(&self, layout: &Layout) -> CostBreakdown {
        let fencing = layout
            .enclosures
            .iter()
            .map(|e| e.rect().perimeter() * self.cost_per_meter(e.species))
            .sum();

        CostBreakdown {
            fencing,
            corridors: self.corridor_cost(layout.infrastructure.corridor_width),
            fittings: FITTINGS_COST * layout.enclosures.len() as f64,
        }
    }

    /// Cost of the cheapest layout the ranch could be built with: square
    /// enclosures of minimum area and the narrowest corridor.
    pub fn minimum_safe_cost(&self) -> f64 {
        let fencing: f64 = self
            .ranch
            .housed_species()
            .map(|s| {
                let area = self.catalogs.species.min_enclosure_area(s, self.ranch.count(s));
                4.0 * area.sqrt() * self.cost_per_meter(s)
            })
            .sum();
        let enclosures = self.ranch.housed_species().count() as f64;

        fencing + self.corridor_cost(map(Parameter::CorridorWidth, 0.0)) + FITTINGS_COST * enclosures
    }

    /// Occupancy against the target, blended with mean enlargement against
    /// the expansion ceiling.
    pub fn land_utilization(&self, layout: &Layout) -> f64 {
        let calibration = &self.ranch.calibration;

        let occupancy = (layout.occupancy() / calibration.target_occupancy).min(1.0);

        let min_total: f64 = layout.enclosures.iter().map(|e| e.min_area).sum();
        let expansion = if min_total > 0.0 {
            let ratio = layout.total_enclosure_area() / min_total;
            ((ratio - 1.0) / (calibration.expansion_ceiling - 1.0)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        calibration.occupancy_blend * occupancy + (1.0 - calibration.occupancy_blend) * expansion
    }

    /// Smallest and mean enclosure gaps against their reference distances.
    pub fn handling_efficiency(&self, layout: &Layout) -> f64 {
        if layout.enclosures.len() < 2 {
            return SINGLE_ENCLOSURE_EFFICIENCY;
        }
        let calibration = &self.ranch.calibration;
        let gaps = layout.gaps();
        let min_gap = gaps.iter().copied().fold(f64::INFINITY, f64::min);
        let mean_gap = gaps.iter().sum::<f64>() / gaps.len() as f64;

        calibration.min_gap_blend * (min_gap / calibration.reference_min_gap).min(1.0)
            + (1.0 - calibration.min_gap_blend) * (mean_gap / calibration.reference_mean_gap).min(1.0)
    }

    fn cost_per_meter(&self, species: Species) -> f64 {
        self.ranch
            .material(species)
            .and_then(|m| self.catalogs.materials.get(m))
            .map_or(FALLBACK_COST_PER_METER, |info| info.cost_per_meter)
    }

    fn corridor_cost(&self, width: f64) -> f64 {
        let length = CORRIDOR_LENGTH_FACTOR * (self.ranch.plot_width + self.ranch.plot_height);
        CORRIDOR_COST_PER_M2 * width * length
    }
}

/// Bonus growing linearly from zero at 80 % of the budget to the maximum
/// at zero cost.
fn savings_bonus(cost: f64, budget: f64) -> f64 {
    let threshold = SAVINGS_THRESHOLD * budget;
    if threshold <= 0.0 || cost >= threshold {
        return 0.0;
    }
    MAX_SAVINGS_BONUS * (1.0 - cost / threshold)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::compute::evolution::GenomeRng;
    use crate::compute::{Enclosure, Infrastructure, Placement, Point, Rect};
    use crate::schema::{BudgetConfig, GENOME_LEN, Material};

    fn chickens_only() -> RanchConfig {
        RanchConfig {
            animals: BTreeMap::from([(Species::Chickens, 10)]),
            materials: BTreeMap::from([(Species::Chickens, Material::PoultryMesh)]),
            ..RanchConfig::default()
        }
    }

    fn square(species: Species, placement: Placement) -> Enclosure {
        Enclosure {
            species,
            animals: 10,
            placement,
            area: 16.0,
            min_area: 8.0,
            enlargement: 2.0,
            aspect_ratio: 1.0,
            orientation: 0.0,
            density: 1.0,
            access: 0.5,
            ventilation: 0.5,
            feeder: Point::new(0.0, 0.0),
            water_point: Point::new(0.0, 0.0),
        }
    }

    fn layout(enclosures: Vec<Enclosure>) -> Layout {
        Layout {
            plot_width: 40.0,
            plot_height: 30.0,
            circulation_distance: 2.0,
            enclosures,
            infrastructure: Infrastructure {
                corridor_width: 2.0,
                requested_corridor_width: 2.0,
                layout_style: 0.5,
                main_access: Point::new(0.0, 0.0),
                connectivity: 0.5,
            },
        }
    }

    #[test]
    fn test_evaluation_is_idempotent() {
        let ranch = RanchConfig::default();
        let catalogs = Catalogs::default();
        let evaluator = FitnessEvaluator::new(&ranch, &catalogs);

        let mut rng = GenomeRng::new(5);
        for _ in 0..20 {
            let genome = rng.random_genome();
            assert_eq!(evaluator.evaluate(&genome), evaluator.evaluate(&genome));
        }
    }

    #[test]
    fn test_single_species_scores_positive() {
        let ranch = chickens_only();
        let catalogs = Catalogs::default();
        let evaluator = FitnessEvaluator::new(&ranch, &catalogs);

        let mut rng = GenomeRng::new(9);
        for _ in 0..20 {
            let assessment = evaluator.assess(&rng.random_genome());
            assert_eq!(assessment.verdict, Verdict::Feasible);
            assert!(assessment.fitness >= MIN_FEASIBLE_FITNESS);
            let objectives = assessment.objectives.unwrap();
            assert_eq!(objectives.handling_efficiency, SINGLE_ENCLOSURE_EFFICIENCY);
        }
    }

    #[test]
    fn test_unresolved_layout_hits_floor() {
        let ranch = RanchConfig::default();
        let catalogs = Catalogs::default();
        let evaluator = FitnessEvaluator::new(&ranch, &catalogs);

        let broken = layout(vec![
            square(Species::Cows, Placement::Placed(Rect::new(0.0, 0.0, 4.0, 4.0))),
            square(Species::Pigs, Placement::Unresolved(Rect::new(1.0, 1.0, 4.0, 4.0))),
        ]);
        let assessment = evaluator.assess_layout(broken);
        assert_eq!(assessment.verdict, Verdict::Infeasible);
        assert_eq!(assessment.fitness, INFEASIBLE_FITNESS);
    }

    #[test]
    fn test_cost_breakdown() {
        let ranch = RanchConfig::default();
        let catalogs = Catalogs::default();
        let evaluator = FitnessEvaluator::new(&ranch, &catalogs);

        let plan = layout(vec![
            square(Species::Cows, Placement::Placed(Rect::new(0.0, 0.0, 4.0, 4.0))),
            square(Species::Chickens, Placement::Placed(Rect::new(10.0, 0.0, 4.0, 4.0))),
        ]);
        let cost = evaluator.construction_cost(&plan);

        assert!((cost.fencing - 16.0 * (220.0 + 45.0)).abs() < 1e-9);
        assert!((cost.corridors - 30.0 * 2.0 * 1.5 * 70.0).abs() < 1e-9);
        assert_eq!(cost.fittings, 1000.0);
    }

    #[test]
    fn test_missing_material_uses_fallback_price() {
        let mut ranch = chickens_only();
        ranch.materials.clear();
        let catalogs = Catalogs::default();
        let evaluator = FitnessEvaluator::new(&ranch, &catalogs);

        let plan = layout(vec![square(
            Species::Chickens,
            Placement::Placed(Rect::new(0.0, 0.0, 4.0, 4.0)),
        )]);
        assert!((evaluator.construction_cost(&plan).fencing - 16.0 * 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_safety_margin_raises_budget() {
        let catalogs = Catalogs::default();

        let mut ranch = RanchConfig::default();
        ranch.budget = BudgetConfig {
            amount: 100.0,
            minimum_safe_margin: Some(0.10),
        };
        let lenient = FitnessEvaluator::new(&ranch, &catalogs);
        let expected = lenient.minimum_safe_cost() * 1.1;
        assert!((lenient.effective_budget() - expected).abs() < 1e-6);

        ranch.budget = BudgetConfig::strict(100.0);
        let strict = FitnessEvaluator::new(&ranch, &catalogs);
        assert_eq!(strict.effective_budget(), 100.0);

        let default_ranch = RanchConfig::default();
        let generous = FitnessEvaluator::new(&default_ranch, &catalogs);
        assert_eq!(generous.effective_budget(), 50_000.0);
    }

    #[test]
    fn test_tiny_budget_stays_in_penalty_band() {
        let catalogs = Catalogs::default();
        let mut ranch = RanchConfig::default();
        ranch.budget = BudgetConfig::strict(500.0);
        let evaluator = FitnessEvaluator::new(&ranch, &catalogs);

        let mut rng = GenomeRng::new(21);
        for _ in 0..30 {
            let assessment = evaluator.assess(&rng.random_genome());
            assert!(assessment.fitness >= INFEASIBLE_FITNESS);
            assert!(assessment.fitness < MAX_BUDGET_PENALTY);
            assert_ne!(assessment.verdict, Verdict::Feasible);
            if assessment.verdict == Verdict::OverBudget {
                assert!(assessment.fitness >= MIN_BUDGET_PENALTY);
            }
        }
    }

    #[test]
    fn test_score_bands_are_ordered() {
        let catalogs = Catalogs::default();
        let ranch = chickens_only();
        let plan = || {
            layout(vec![square(
                Species::Chickens,
                Placement::Placed(Rect::new(0.0, 0.0, 4.0, 4.0)),
            )])
        };

        let feasible = FitnessEvaluator::new(&ranch, &catalogs).assess_layout(plan());

        let mut poor = ranch.clone();
        poor.budget = BudgetConfig::strict(1000.0);
        let over = FitnessEvaluator::new(&poor, &catalogs).assess_layout(plan());

        assert_eq!(feasible.verdict, Verdict::Feasible);
        assert_eq!(over.verdict, Verdict::OverBudget);
        assert!(INFEASIBLE_FITNESS < over.fitness);
        assert!(over.fitness < feasible.fitness);
    }

    #[test]
    fn test_objectives() {
        let ranch = RanchConfig::default();
        let catalogs = Catalogs::default();
        let evaluator = FitnessEvaluator::new(&ranch, &catalogs);

        // Two 16 m² enclosures, each twice its minimum, 6 m apart.
        let plan = layout(vec![
            square(Species::Cows, Placement::Placed(Rect::new(0.0, 0.0, 4.0, 4.0))),
            square(Species::Goats, Placement::Placed(Rect::new(10.0, 0.0, 4.0, 4.0))),
        ]);

        let occupancy = 32.0 / 1200.0 / 0.70;
        let expansion = (2.0 - 1.0) / (3.0 - 1.0);
        let expected_land = 0.6 * occupancy + 0.4 * expansion;
        assert!((evaluator.land_utilization(&plan) - expected_land).abs() < 1e-12);

        let expected_handling = 0.5 * 1.0 + 0.5 * 0.6;
        assert!((evaluator.handling_efficiency(&plan) - expected_handling).abs() < 1e-12);
    }

    #[test]
    fn test_savings_bonus() {
        assert_eq!(savings_bonus(900.0, 1000.0), 0.0);
        assert_eq!(savings_bonus(800.0, 1000.0), 0.0);
        assert!((savings_bonus(400.0, 1000.0) - 0.025).abs() < 1e-12);
        assert!((savings_bonus(0.0, 1000.0) - MAX_SAVINGS_BONUS).abs() < 1e-12);
    }

    #[test]
    fn test_midpoint_genome_scores_consistently() {
        let genome = Genome::from_vector(&[0.5; GENOME_LEN]).unwrap();
        let ranch = RanchConfig::default();
        let catalogs = Catalogs::default();
        let evaluator = FitnessEvaluator::new(&ranch, &catalogs);

        let score = evaluator.evaluate(&genome);
        assert!((INFEASIBLE_FITNESS..=1.0).contains(&score));
        assert_eq!(evaluator.evaluate(&genome), score);
        assert_eq!(evaluator.assess(&genome).fitness, score);
    }
}
