use serde::{Deserialize, Serialize};

use crate::ids::MaterialId;
use crate::ModelError;

/// How a constituent fraction is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FractionBasis {
    /// Atom fraction (`ao`).
    Atom,
    /// Weight fraction (`wo`).
    Weight,
}

impl FractionBasis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Atom => "ao",
            Self::Weight => "wo",
        }
    }
}

/// What a constituent names: a single nuclide or a natural element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name")]
pub enum Species {
    Nuclide(String),
    Element(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constituent {
    pub species: Species,
    pub fraction: f64,
    pub basis: FractionBasis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DensityUnits {
    GramsPerCc,
    KilogramsPerM3,
    AtomsPerBarnCm,
}

impl DensityUnits {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GramsPerCc => "g/cc",
            Self::KilogramsPerM3 => "kg/m3",
            Self::AtomsPerBarnCm => "atom/b-cm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Density {
    pub value: f64,
    pub units: DensityUnits,
}

/// A named substance with a composition and a density.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    pub density: Option<Density>,
    pub constituents: Vec<Constituent>,
}

impl Material {
    pub fn new(id: MaterialId, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            density: None,
            constituents: Vec::new(),
        }
    }

    pub fn add_nuclide(&mut self, nuclide: &str, fraction: f64, basis: FractionBasis) -> &mut Self {
        self.constituents.push(Constituent {
            species: Species::Nuclide(nuclide.to_string()),
            fraction,
            basis,
        });
        self
    }

    pub fn add_element(&mut self, symbol: &str, fraction: f64, basis: FractionBasis) -> &mut Self {
        self.constituents.push(Constituent {
            species: Species::Element(symbol.to_string()),
            fraction,
            basis,
        });
        self
    }

    pub fn set_density(&mut self, units: DensityUnits, value: f64) -> &mut Self {
        self.density = Some(Density { value, units });
        self
    }

    /// Resolve every constituent to nuclides, expanding natural elements.
    ///
    /// Weight-basis elements are split by abundance times mass number so the
    /// isotopes keep the element's total weight fraction.
    pub fn expanded_nuclides(&self) -> Result<Vec<(String, f64, FractionBasis)>, ModelError> {
        if self.constituents.is_empty() {
            return Err(ModelError::EmptyMaterial {
                name: self.name.clone(),
            });
        }
        let mut out = Vec::new();
        for c in &self.constituents {
            match &c.species {
                Species::Nuclide(name) => out.push((name.clone(), c.fraction, c.basis)),
                Species::Element(symbol) => {
                    let isotopes = natural_isotopes(symbol).ok_or_else(|| {
                        ModelError::UnknownElement {
                            symbol: symbol.clone(),
                        }
                    })?;
                    match c.basis {
                        FractionBasis::Atom => {
                            for &(nuclide, abundance, _) in isotopes {
                                out.push((nuclide.to_string(), c.fraction * abundance, c.basis));
                            }
                        }
                        FractionBasis::Weight => {
                            let total: f64 = isotopes.iter().map(|&(_, a, m)| a * m as f64).sum();
                            for &(nuclide, abundance, mass) in isotopes {
                                let share = abundance * mass as f64 / total;
                                out.push((nuclide.to_string(), c.fraction * share, c.basis));
                            }
                        }
                    }
                }
            }
        }
        Ok(out)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if let Some(density) = self.density {
            if !(density.value.is_finite() && density.value > 0.0) {
                return Err(ModelError::InvalidDensity {
                    name: self.name.clone(),
                    value: density.value,
                    units: density.units.as_str().to_string(),
                });
            }
        }
        self.expanded_nuclides().map(|_| ())
    }
}

/// (nuclide, atom abundance, mass number)
type Isotope = (&'static str, f64, u32);

const HYDROGEN: &[Isotope] = &[("H1", 0.999885, 1), ("H2", 0.000115, 2)];
const OXYGEN: &[Isotope] = &[("O16", 0.99757, 16), ("O17", 0.00038, 17), ("O18", 0.00205, 18)];
const ZIRCONIUM: &[Isotope] = &[
    ("Zr90", 0.5145, 90),
    ("Zr91", 0.1122, 91),
    ("Zr92", 0.1715, 92),
    ("Zr94", 0.1738, 94),
    ("Zr96", 0.0280, 96),
];
const URANIUM: &[Isotope] = &[
    ("U234", 0.000054, 234),
    ("U235", 0.007204, 235),
    ("U238", 0.992742, 238),
];

/// Natural isotopic composition for the elements the harness models use.
pub fn natural_isotopes(symbol: &str) -> Option<&'static [Isotope]> {
    match symbol {
        "H" => Some(HYDROGEN),
        "O" => Some(OXYGEN),
        "Zr" => Some(ZIRCONIUM),
        "U" => Some(URANIUM),
        _ => None,
    }
}

/// An ordered collection of materials with unique names.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Materials {
    items: Vec<Material>,
}

impl Materials {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn from_vec(items: Vec<Material>) -> Result<Self, ModelError> {
        let mut materials = Self::new();
        for m in items {
            materials.push(m)?;
        }
        Ok(materials)
    }

    pub fn push(&mut self, material: Material) -> Result<(), ModelError> {
        if self.items.iter().any(|m| m.name == material.name) {
            return Err(ModelError::DuplicateMaterial {
                name: material.name,
            });
        }
        self.items.push(material);
        Ok(())
    }

    pub fn first(&self) -> Option<&Material> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Material> {
        self.items.last()
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.items.iter().find(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.items.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|m| m.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn water() -> Material {
        let mut m = Material::new(MaterialId(1), "h2o");
        m.add_element("O", 1.0 / 3.0, FractionBasis::Atom)
            .add_element("H", 2.0 / 3.0, FractionBasis::Atom)
            .set_density(DensityUnits::GramsPerCc, 1.0);
        m
    }

    #[test]
    fn abundance_tables_sum_to_one() {
        for symbol in ["H", "O", "Zr", "U"] {
            let total: f64 = natural_isotopes(symbol).unwrap().iter().map(|i| i.1).sum();
            assert_relative_eq!(total, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn element_expansion_preserves_atom_fraction() {
        let nuclides = water().expanded_nuclides().unwrap();
        assert_eq!(nuclides.len(), 5);
        let oxygen: f64 = nuclides
            .iter()
            .filter(|(n, _, _)| n.starts_with('O'))
            .map(|(_, f, _)| f)
            .sum();
        assert_relative_eq!(oxygen, 1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn weight_basis_expansion_preserves_total() {
        let mut m = Material::new(MaterialId(1), "zr");
        m.add_element("Zr", 1.0, FractionBasis::Weight);
        let total: f64 = m.expanded_nuclides().unwrap().iter().map(|n| n.1).sum();
        assert_relative_eq!(total, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn unknown_element_is_rejected() {
        let mut m = Material::new(MaterialId(1), "mystery");
        m.add_element("Xx", 1.0, FractionBasis::Atom);
        assert!(matches!(
            m.expanded_nuclides(),
            Err(ModelError::UnknownElement { .. })
        ));
    }

    #[test]
    fn empty_material_fails_validation() {
        let m = Material::new(MaterialId(1), "void");
        assert!(m.validate().is_err());
    }

    #[test]
    fn non_positive_density_fails_validation() {
        let mut m = water();
        m.set_density(DensityUnits::GramsPerCc, 0.0);
        assert!(matches!(
            m.validate(),
            Err(ModelError::InvalidDensity { .. })
        ));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut mats = Materials::new();
        mats.push(water()).unwrap();
        let err = mats.push(water()).unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateMaterial {
                name: "h2o".into()
            }
        );
        assert_eq!(mats.len(), 1);
    }
}
