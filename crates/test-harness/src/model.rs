//! The reference model the simulation harness runs.
//!
//! Fixed settings and materials, and the geometry assembly: an inner
//! universe (external DAGMC model or a synthetic two-region sphere) embedded
//! in a single cell bounded by a vacuum sphere.

use std::path::PathBuf;

use transport_types::{
    BoundaryType, Cell, DagmcUniverse, DensityUnits, Fill, FractionBasis, Geometry, IdAllocator,
    Material, Materials, ModelError, RunMode, Settings, Source, Surface, Universe, UniverseNode,
};

use crate::helpers::HarnessError;

pub const BATCHES: u32 = 20;
pub const PARTICLES: u64 = 2000;
pub const INACTIVE: u32 = 5;
pub const SOURCE_ENERGY_EV: f64 = 2.0e6;
/// Radius of the vacuum sphere bounding the whole model.
pub const BOUNDARY_RADIUS: f64 = 200.0;
/// Radius of the sphere splitting the synthetic universe in two.
pub const INNER_RADIUS: f64 = 1.0;

/// Where the inner universe comes from, chosen once at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometrySource {
    /// A pre-built DAGMC model file.
    External(PathBuf),
    /// Two concentric regions filled with the first and last material.
    SyntheticFallback,
}

impl GeometrySource {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(p) => Self::External(p),
            None => Self::SyntheticFallback,
        }
    }
}

/// Materials are built at most once; the first build wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MaterialState {
    #[default]
    Unbuilt,
    Built(Materials),
}

impl MaterialState {
    /// Build with `f` if nothing is built yet.
    ///
    /// Returns whether this call did the build. Once built, later calls
    /// never invoke `f`. A failed build leaves the state unbuilt.
    pub fn build_with<E>(&mut self, f: impl FnOnce() -> Result<Materials, E>) -> Result<bool, E> {
        if self.is_built() {
            return Ok(false);
        }
        *self = Self::Built(f()?);
        Ok(true)
    }

    pub fn get(&self) -> Option<&Materials> {
        match self {
            Self::Built(m) => Some(m),
            Self::Unbuilt => None,
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(self, Self::Built(_))
    }
}

/// 20 batches of 2000 particles, 5 inactive, 2 MeV isotropic point source.
pub fn reference_settings() -> Settings {
    Settings {
        run_mode: RunMode::Eigenvalue,
        batches: BATCHES,
        inactive: INACTIVE,
        particles: PARTICLES,
        source: Source::monoenergetic_point(SOURCE_ENERGY_EV),
    }
}

/// The three reference materials, in order: `uo2`, `zirconium`, `h2o`.
pub fn reference_materials(ids: &mut IdAllocator) -> Result<Materials, ModelError> {
    let mut uo2 = Material::new(ids.material(), "uo2");
    uo2.add_nuclide("U235", 1.0 / 3.0, FractionBasis::Atom)
        .add_element("O", 2.0 / 3.0, FractionBasis::Atom)
        .set_density(DensityUnits::GramsPerCc, 10.97);

    let mut zirconium = Material::new(ids.material(), "zirconium");
    zirconium
        .add_element("Zr", 1.0, FractionBasis::Atom)
        .set_density(DensityUnits::GramsPerCc, 6.52);

    let mut h2o = Material::new(ids.material(), "h2o");
    h2o.add_element("O", 1.0 / 3.0, FractionBasis::Atom)
        .add_element("H", 2.0 / 3.0, FractionBasis::Atom)
        .set_density(DensityUnits::GramsPerCc, 1.0);

    for m in [&uo2, &zirconium, &h2o] {
        m.validate()?;
    }
    Materials::from_vec(vec![uo2, zirconium, h2o])
}

/// The inner universe for `source`.
///
/// An external model path is made absolute against the current directory,
/// since the engine runs inside the workspace. The synthetic fallback needs
/// materials; with a single material both regions share it.
pub fn inner_universe(
    source: &GeometrySource,
    materials: Option<&Materials>,
    ids: &mut IdAllocator,
) -> Result<UniverseNode, HarnessError> {
    match source {
        GeometrySource::External(path) => {
            let filename = std::path::absolute(path).map_err(|e| HarnessError::io(path, e))?;
            Ok(UniverseNode::Dagmc(DagmcUniverse {
                id: ids.universe(),
                filename,
                auto_geom_ids: true,
            }))
        }
        GeometrySource::SyntheticFallback => {
            let materials = materials.ok_or(HarnessError::NoMaterials)?;
            let (first, last) = match (materials.first(), materials.last()) {
                (Some(f), Some(l)) => (f, l),
                _ => return Err(HarnessError::NoMaterials),
            };
            let sphere = Surface::sphere(ids.surface(), INNER_RADIUS);
            let inside = Cell {
                id: ids.cell(),
                name: None,
                region: sphere.inside(),
                fill: Fill::Material(first.id),
            };
            let outside = Cell {
                id: ids.cell(),
                name: None,
                region: sphere.outside(),
                fill: Fill::Material(last.id),
            };
            Ok(UniverseNode::Cells(Universe {
                id: ids.universe(),
                cells: vec![inside, outside],
            }))
        }
    }
}

/// Embed `inner` in one cell inside a vacuum sphere; that cell forms the root universe.
pub fn bounded_geometry(inner: UniverseNode, ids: &mut IdAllocator) -> Geometry {
    let boundary =
        Surface::sphere(ids.surface(), BOUNDARY_RADIUS).with_boundary(BoundaryType::Vacuum);
    let cell = Cell {
        id: ids.cell(),
        name: None,
        region: boundary.inside(),
        fill: Fill::Universe(Box::new(inner)),
    };
    Geometry::new(Universe {
        id: ids.universe(),
        cells: vec![cell],
    })
}
