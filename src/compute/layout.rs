//! Layout decoding: genome to physical enclosure layout.
//!
//! Species are placed largest first. Each enclosure starts at the position
//! its genes request and, when that spot is blocked, walks an expanding
//! spiral until it finds a free spot or gives up.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use super::geometry::{Point, Rect, perimeter_point};
use super::mapper::{Parameter, map};
use crate::schema::{Genome, RanchConfig, Species, SpeciesCatalog};

/// Maximum spiral attempts per enclosure.
pub const SPIRAL_ATTEMPTS: usize = 150;
/// Angle advance per spiral attempt (radians).
const SPIRAL_ANGLE_STEP: f64 = 0.3;
const SPIRAL_START_RADIUS: f64 = 0.5;
const SPIRAL_RADIUS_STEP: f64 = 0.5;
/// Attempts made at each radius before it grows.
const SPIRAL_RING_LEN: usize = 15;

/// Narrowest corridor the gap-based reduction may produce (m).
const MIN_CORRIDOR_WIDTH: f64 = 1.0;
/// Share of the tightest enclosure gap a corridor may occupy.
const CORRIDOR_GAP_SHARE: f64 = 0.8;

/// Outcome of the placement search for one enclosure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "rect", rename_all = "snake_case")]
pub enum Placement {
    /// Inside the plot and clear of every earlier enclosure.
    Placed(Rect),
    /// No valid spot found; holds the requested rectangle.
    Unresolved(Rect),
}

impl Placement {
    #[inline]
    pub fn rect(&self) -> &Rect {
        match self {
            Placement::Placed(rect) | Placement::Unresolved(rect) => rect,
        }
    }

    #[inline]
    pub fn is_placed(&self) -> bool {
        matches!(self, Placement::Placed(_))
    }
}

/// One decoded enclosure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enclosure {
    pub species: Species,
    pub animals: u32,
    pub placement: Placement,
    /// Target area (m²).
    pub area: f64,
    /// Minimum area required by the herd (m²).
    pub min_area: f64,
    /// Applied multiplier over the minimum area.
    pub enlargement: f64,
    pub aspect_ratio: f64,
    /// Degrees.
    pub orientation: f64,
    pub density: f64,
    pub access: f64,
    pub ventilation: f64,
    pub feeder: Point,
    pub water_point: Point,
}

impl Enclosure {
    #[inline]
    pub fn rect(&self) -> &Rect {
        self.placement.rect()
    }
}

/// Shared infrastructure of the layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Infrastructure {
    /// Corridor width after fitting it to the enclosure gaps (m).
    pub corridor_width: f64,
    /// Corridor width requested by the genome (m).
    pub requested_corridor_width: f64,
    pub layout_style: f64,
    /// Main gate on the plot boundary.
    pub main_access: Point,
    pub connectivity: f64,
}

/// Pair of enclosures closer than their species recommend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparationWarning {
    pub first: Species,
    pub second: Species,
    pub distance: f64,
    pub recommended: f64,
}

/// Physical layout decoded from a genome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub plot_width: f64,
    pub plot_height: f64,
    /// Clearance every pair of enclosures must keep (m).
    pub circulation_distance: f64,
    /// Enclosures in placement order.
    pub enclosures: Vec<Enclosure>,
    pub infrastructure: Infrastructure,
}

impl Layout {
    pub fn enclosure(&self, species: Species) -> Option<&Enclosure> {
        self.enclosures.iter().find(|e| e.species == species)
    }

    /// Whether every enclosure found a valid spot.
    pub fn is_resolved(&self) -> bool {
        self.enclosures.iter().all(|e| e.placement.is_placed())
    }

    /// Whether every enclosure is inside the plot and all pairs keep the
    /// circulation distance.
    pub fn is_feasible(&self) -> bool {
        if !self.is_resolved() {
            return false;
        }
        if !self
            .enclosures
            .iter()
            .all(|e| e.rect().within(self.plot_width, self.plot_height))
        {
            return false;
        }
        if self.enclosures.len() < 2 {
            return true;
        }
        self.pairs()
            .all(|(a, b)| !a.rect().overlaps(b.rect(), self.circulation_distance))
    }

    pub fn total_enclosure_area(&self) -> f64 {
        self.enclosures.iter().map(|e| e.rect().area()).sum()
    }

    pub fn free_area(&self) -> f64 {
        (self.plot_width * self.plot_height - self.total_enclosure_area()).max(0.0)
    }

    /// Total enclosure area as a share of the plot.
    pub fn occupancy(&self) -> f64 {
        let plot = self.plot_width * self.plot_height;
        if plot > 0.0 {
            self.total_enclosure_area() / plot
        } else {
            0.0
        }
    }

    pub fn total_fence_length(&self) -> f64 {
        self.enclosures.iter().map(|e| e.rect().perimeter()).sum()
    }

    /// Edge-to-edge distances of every enclosure pair.
    pub fn gaps(&self) -> Vec<f64> {
        self.pairs()
            .map(|(a, b)| a.rect().edge_distance(b.rect()))
            .collect()
    }

    /// Pairs of enclosures closer than their species' recommended separation.
    pub fn separation_warnings(&self, catalog: &SpeciesCatalog) -> Vec<SeparationWarning> {
        self.pairs()
            .filter_map(|(a, b)| {
                let distance = a.rect().edge_distance(b.rect());
                let recommended = catalog.required_separation(a.species, b.species);
                (distance < recommended).then_some(SeparationWarning {
                    first: a.species,
                    second: b.species,
                    distance,
                    recommended,
                })
            })
            .collect()
    }

    fn pairs(&self) -> impl Iterator<Item = (&Enclosure, &Enclosure)> {
        self.enclosures
            .iter()
            .enumerate()
            .flat_map(move |(i, a)| self.enclosures[i + 1..].iter().map(move |b| (a, b)))
    }
}

/// Decode a genome into a layout. Never fails and has no hidden state.
pub fn decode(genome: &Genome, ranch: &RanchConfig, catalog: &SpeciesCatalog) -> Layout {
    let mut order: Vec<(Species, f64)> = ranch
        .housed_species()
        .map(|s| (s, catalog.min_enclosure_area(s, ranch.count(s))))
        .collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1));

    let land_weight = ranch.weights.land_utilization;
    let mut enclosures: Vec<Enclosure> = Vec::with_capacity(order.len());

    for (species, min_area) in order {
        let genes = genome.enclosure_genes(species);

        let enlargement = map(Parameter::Enlargement, genes.size) * enlargement_bias(land_weight);
        let aspect_ratio = map(Parameter::AspectRatio, genes.aspect);
        let area = min_area * enlargement;
        let width = (area * aspect_ratio).sqrt();
        let height = if width > 0.0 { area / width } else { 0.0 };

        let initial = Rect::new(
            genes.x * (ranch.plot_width - width).max(0.0),
            genes.y * (ranch.plot_height - height).max(0.0),
            width,
            height,
        );
        let placed: Vec<Rect> = enclosures.iter().map(|e| *e.rect()).collect();
        let placement = place(
            initial,
            &placed,
            ranch.plot_width,
            ranch.plot_height,
            ranch.circulation_distance,
        );

        let rect = *placement.rect();
        let (fx, fy) = genome.feeder_genes(species);
        let (wx, wy) = genome.water_genes(species);

        enclosures.push(Enclosure {
            species,
            animals: ranch.count(species),
            placement,
            area,
            min_area,
            enlargement,
            aspect_ratio,
            orientation: map(Parameter::Orientation, genes.orientation),
            density: map(Parameter::Density, genes.density),
            access: map(Parameter::Access, genes.access),
            ventilation: map(Parameter::Ventilation, genes.ventilation),
            feeder: rect.point_at(fx, fy),
            water_point: rect.point_at(wx, wy),
        });
    }

    let infra = genome.infrastructure_genes();
    let requested_corridor_width = map(Parameter::CorridorWidth, infra.corridor_width);

    let mut layout = Layout {
        plot_width: ranch.plot_width,
        plot_height: ranch.plot_height,
        circulation_distance: ranch.circulation_distance,
        enclosures,
        infrastructure: Infrastructure {
            corridor_width: requested_corridor_width,
            requested_corridor_width,
            layout_style: map(Parameter::LayoutStyle, infra.layout_style),
            main_access: perimeter_point(
                ranch.plot_width,
                ranch.plot_height,
                map(Parameter::MainAccess, infra.main_access),
            ),
            connectivity: map(Parameter::Connectivity, infra.connectivity),
        },
    };

    if let Some(min_gap) = layout.gaps().into_iter().reduce(f64::min) {
        layout.infrastructure.corridor_width = requested_corridor_width
            .min((CORRIDOR_GAP_SHARE * min_gap).max(MIN_CORRIDOR_WIDTH));
    }

    layout
}

/// Extra enlargement applied when land utilization dominates the objectives.
fn enlargement_bias(land_weight: f64) -> f64 {
    if land_weight > 0.5 {
        1.0 + land_weight
    } else if land_weight > 0.3 {
        1.0 + 0.5 * land_weight
    } else {
        1.0
    }
}

/// Find a spot for `initial` that is inside the plot and keeps `clearance`
/// from every rectangle in `placed`.
///
/// Tries the requested spot first, then up to [`SPIRAL_ATTEMPTS`] spots on
/// an expanding spiral around it, clamped into the plot.
pub fn place(initial: Rect, placed: &[Rect], plot_width: f64, plot_height: f64, clearance: f64) -> Placement {
    let fits = |candidate: &Rect| {
        candidate.within(plot_width, plot_height)
            && placed.iter().all(|other| !candidate.overlaps(other, clearance))
    };

    if fits(&initial) {
        return Placement::Placed(initial);
    }

    let max_x = (plot_width - initial.width).max(0.0);
    let max_y = (plot_height - initial.height).max(0.0);

    for attempt in 0..SPIRAL_ATTEMPTS {
        let angle = (attempt as f64 * SPIRAL_ANGLE_STEP) % TAU;
        let radius = SPIRAL_START_RADIUS + SPIRAL_RADIUS_STEP * (attempt / SPIRAL_RING_LEN) as f64;

        let candidate = initial.moved_to(
            (initial.x + radius * angle.cos()).clamp(0.0, max_x),
            (initial.y + radius * angle.sin()).clamp(0.0, max_y),
        );
        if fits(&candidate) {
            return Placement::Placed(candidate);
        }
    }

    Placement::Unresolved(initial)
}
