//! Species and material catalogs.
//!
//! Both catalogs are plain immutable values. They are constructed once (the
//! built-in standard tables, or a material table loaded from JSON) and then
//! passed by reference into the decoder and the fitness evaluator.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Animal species a ranch can house.
///
/// The declaration order is the order of the per-species blocks in the
/// genome and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Chickens,
    Pigs,
    Cows,
    Goats,
}

impl Species {
    /// All species in genome order.
    pub const ALL: [Species; 4] = [Species::Chickens, Species::Pigs, Species::Cows, Species::Goats];

    /// Position of this species in the genome blocks.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Species::Chickens => 0,
            Species::Pigs => 1,
            Species::Cows => 2,
            Species::Goats => 3,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Species::Chickens => "Chickens",
            Species::Pigs => "Pigs",
            Species::Cows => "Cows",
            Species::Goats => "Goats",
        }
    }
}

impl std::fmt::Display for Species {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Feeder installed in an enclosure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeederType {
    Hopper,
    ConcreteTrough,
    LongTrough,
    RaisedRack,
}

/// Water point installed in an enclosure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaterPointType {
    Automatic,
    Nipple,
    LargeTrough,
    MediumTrough,
}

/// Fixed husbandry requirements of one species.
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesInfo {
    pub species: Species,
    /// Minimum enclosure area per animal (m²).
    pub min_area_per_animal: f64,
    /// Recommended clearance from enclosures of other species (m).
    pub min_separation: f64,
    pub feeder: FeederType,
    pub water_point: WaterPointType,
}

/// Per-species requirement table.
#[derive(Debug, Clone, Serialize)]
pub struct SpeciesCatalog {
    entries: [SpeciesInfo; 4],
}

impl SpeciesCatalog {
    /// Standard livestock requirements.
    pub fn standard() -> Self {
        Self {
            entries: [
                SpeciesInfo {
                    species: Species::Chickens,
                    min_area_per_animal: 0.5,
                    min_separation: 3.0,
                    feeder: FeederType::Hopper,
                    water_point: WaterPointType::Automatic,
                },
                SpeciesInfo {
                    species: Species::Pigs,
                    min_area_per_animal: 2.5,
                    min_separation: 5.0,
                    feeder: FeederType::ConcreteTrough,
                    water_point: WaterPointType::Nipple,
                },
                SpeciesInfo {
                    species: Species::Cows,
                    min_area_per_animal: 15.0,
                    min_separation: 8.0,
                    feeder: FeederType::LongTrough,
                    water_point: WaterPointType::LargeTrough,
                },
                SpeciesInfo {
                    species: Species::Goats,
                    min_area_per_animal: 3.0,
                    min_separation: 2.0,
                    feeder: FeederType::RaisedRack,
                    water_point: WaterPointType::MediumTrough,
                },
            ],
        }
    }

    /// Requirements for a species.
    #[inline]
    pub fn get(&self, species: Species) -> &SpeciesInfo {
        &self.entries[species.index()]
    }

    /// Minimum enclosure area for `count` animals.
    pub fn min_enclosure_area(&self, species: Species, count: u32) -> f64 {
        self.get(species).min_area_per_animal * count as f64
    }

    /// Recommended clearance between enclosures of two species.
    pub fn required_separation(&self, a: Species, b: Species) -> f64 {
        self.get(a).min_separation.max(self.get(b).min_separation)
    }
}

impl Default for SpeciesCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Fencing materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    PoultryMesh,
    WeldedSteelPanel,
    OakRail,
    ReinforcedWire,
    BarbedWire,
    ElectricTape,
}

/// Durability tier of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    Low,
    Medium,
    High,
}

/// Catalog entry for one fencing material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialInfo {
    pub material: Material,
    pub name: String,
    /// Cost per linear meter of fence.
    pub cost_per_meter: f64,
    pub durability: Durability,
    pub compatible_species: Vec<Species>,
    #[serde(default)]
    pub description: String,
}

impl MaterialInfo {
    /// Whether this material is suitable for a species.
    pub fn suits(&self, species: Species) -> bool {
        self.compatible_species.contains(&species)
    }
}

/// Table of available fencing materials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialCatalog {
    materials: Vec<MaterialInfo>,
}

impl MaterialCatalog {
    /// Build a catalog from explicit entries.
    pub fn new(materials: Vec<MaterialInfo>) -> Self {
        Self { materials }
    }

    /// Built-in material prices.
    pub fn standard() -> Self {
        use Species::*;

        Self::new(vec![
            entry(
                Material::PoultryMesh,
                "Poultry mesh",
                45.0,
                Durability::Medium,
                &[Chickens],
                "Hexagonal galvanized mesh on wooden posts",
            ),
            entry(
                Material::WeldedSteelPanel,
                "Welded steel panel",
                180.0,
                Durability::High,
                &[Pigs, Goats, Cows],
                "Rigid welded panels resistant to rooting",
            ),
            entry(
                Material::OakRail,
                "Oak rail fence",
                220.0,
                Durability::High,
                &[Cows, Goats],
                "Three-rail hardwood fence",
            ),
            entry(
                Material::ReinforcedWire,
                "Reinforced wire",
                95.0,
                Durability::Medium,
                &[Goats, Pigs, Chickens],
                "Tensioned woven wire with top strand",
            ),
            entry(
                Material::BarbedWire,
                "Barbed wire",
                35.0,
                Durability::Low,
                &[Cows],
                "Four strands on steel posts",
            ),
            entry(
                Material::ElectricTape,
                "Electric tape",
                60.0,
                Durability::Low,
                &[Cows, Goats],
                "Energized polytape on insulated posts",
            ),
        ])
    }

    /// Load a material table from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Look up a material.
    pub fn get(&self, material: Material) -> Option<&MaterialInfo> {
        self.materials.iter().find(|m| m.material == material)
    }

    /// Materials suitable for a species.
    pub fn compatible_with(&self, species: Species) -> impl Iterator<Item = &MaterialInfo> {
        self.materials.iter().filter(move |m| m.suits(species))
    }

    /// All entries.
    pub fn all(&self) -> impl Iterator<Item = &MaterialInfo> {
        self.materials.iter()
    }
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn entry(
    material: Material,
    name: &str,
    cost_per_meter: f64,
    durability: Durability,
    species: &[Species],
    description: &str,
) -> MaterialInfo {
    MaterialInfo {
        material,
        name: name.to_string(),
        cost_per_meter,
        durability,
        compatible_species: species.to_vec(),
        description: description.to_string(),
    }
}

/// Both read-only catalogs, loaded before an optimization starts.
#[derive(Debug, Clone, Default)]
pub struct Catalogs {
    pub species: SpeciesCatalog,
    pub materials: MaterialCatalog,
}

impl Catalogs {
    /// Standard species table with the given material table.
    pub fn with_materials(materials: MaterialCatalog) -> Self {
        Self {
            species: SpeciesCatalog::standard(),
            materials,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_species_index_matches_order() {
        for (i, species) in Species::ALL.iter().enumerate() {
            assert_eq!(species.index(), i);
        }
    }

    #[test]
    fn test_min_enclosure_area() {
        let catalog = SpeciesCatalog::standard();
        assert!((catalog.min_enclosure_area(Species::Chickens, 50) - 25.0).abs() < 1e-9);
        assert!((catalog.min_enclosure_area(Species::Cows, 3) - 45.0).abs() < 1e-9);
        assert_eq!(catalog.min_enclosure_area(Species::Pigs, 0), 0.0);
    }

    #[test]
    fn test_required_separation_takes_larger() {
        let catalog = SpeciesCatalog::standard();
        assert_eq!(catalog.required_separation(Species::Goats, Species::Cows), 8.0);
        assert_eq!(catalog.required_separation(Species::Goats, Species::Chickens), 3.0);
    }

    #[test]
    fn test_every_species_has_a_material() {
        let catalog = MaterialCatalog::standard();
        for species in Species::ALL {
            assert!(catalog.compatible_with(species).next().is_some());
        }
    }

    #[test]
    fn test_material_serialization() {
        let catalog = MaterialCatalog::standard();
        let json = serde_json::to_string(&catalog).unwrap();
        let parsed: MaterialCatalog = serde_json::from_str(&json).unwrap();
        let oak = parsed.get(Material::OakRail).unwrap();
        assert_eq!(oak.cost_per_meter, 220.0);
        assert!(oak.suits(Species::Cows));
    }

    #[test]
    fn test_load_material_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("materials.json");
        fs::write(&path, serde_json::to_string(&MaterialCatalog::standard()).unwrap()).unwrap();

        let loaded = MaterialCatalog::load(&path).unwrap();
        assert_eq!(loaded.all().count(), 6);

        fs::write(&path, "not json").unwrap();
        let err = MaterialCatalog::load(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
