use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ids::{CellId, MaterialId, SurfaceId, UniverseId};

/// Particle behavior when crossing a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryType {
    Transmission,
    Vacuum,
    Reflective,
}

impl BoundaryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transmission => "transmission",
            Self::Vacuum => "vacuum",
            Self::Reflective => "reflective",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SurfaceKind {
    Sphere { center: [f64; 3], radius: f64 },
}

impl SurfaceKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Sphere { .. } => "sphere",
        }
    }

    /// Coefficients in engine order (`x0 y0 z0 r` for spheres).
    pub fn coefficients(&self) -> Vec<f64> {
        match self {
            Self::Sphere { center, radius } => vec![center[0], center[1], center[2], *radius],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub id: SurfaceId,
    pub kind: SurfaceKind,
    pub boundary: BoundaryType,
}

impl Surface {
    /// A sphere centered at the origin.
    pub fn sphere(id: SurfaceId, radius: f64) -> Self {
        Self {
            id,
            kind: SurfaceKind::Sphere {
                center: [0.0; 3],
                radius,
            },
            boundary: BoundaryType::Transmission,
        }
    }

    pub fn with_boundary(mut self, boundary: BoundaryType) -> Self {
        self.boundary = boundary;
        self
    }

    /// The negative halfspace (`-s`).
    pub fn inside(&self) -> Region {
        Region::Halfspace {
            surface: self.clone(),
            side: Side::Negative,
        }
    }

    /// The positive halfspace (`+s`).
    pub fn outside(&self) -> Region {
        Region::Halfspace {
            surface: self.clone(),
            side: Side::Positive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Negative,
    Positive,
}

/// A boolean combination of surface halfspaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Region {
    Halfspace { surface: Surface, side: Side },
    Intersection(Vec<Region>),
    Union(Vec<Region>),
}

impl Region {
    /// Render the region in the engine's expression syntax, e.g. `-1` or `(1 -2)`.
    pub fn expression(&self) -> String {
        match self {
            Self::Halfspace { surface, side } => match side {
                Side::Negative => format!("-{}", surface.id.0),
                Side::Positive => format!("{}", surface.id.0),
            },
            Self::Intersection(parts) => {
                let inner: Vec<String> = parts.iter().map(Region::expression).collect();
                format!("({})", inner.join(" "))
            }
            Self::Union(parts) => {
                let inner: Vec<String> = parts.iter().map(Region::expression).collect();
                format!("({})", inner.join(" | "))
            }
        }
    }

    /// All surfaces referenced by the region, in first-seen order.
    pub fn surfaces(&self) -> Vec<&Surface> {
        let mut out = Vec::new();
        self.collect_surfaces(&mut out);
        out
    }

    fn collect_surfaces<'a>(&'a self, out: &mut Vec<&'a Surface>) {
        match self {
            Self::Halfspace { surface, .. } => {
                if !out.iter().any(|s| s.id == surface.id) {
                    out.push(surface);
                }
            }
            Self::Intersection(parts) | Self::Union(parts) => {
                for p in parts {
                    p.collect_surfaces(out);
                }
            }
        }
    }
}

/// What occupies a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fill {
    Material(MaterialId),
    Universe(Box<UniverseNode>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub name: Option<String>,
    pub region: Region,
    pub fill: Fill,
}

/// A universe made of explicit cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe {
    pub id: UniverseId,
    pub cells: Vec<Cell>,
}

/// A universe whose cells come from a pre-built DAGMC model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DagmcUniverse {
    pub id: UniverseId,
    pub filename: PathBuf,
    pub auto_geom_ids: bool,
}

/// The "inner universe" a geometry source produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UniverseNode {
    Cells(Universe),
    Dagmc(DagmcUniverse),
}

impl UniverseNode {
    pub fn id(&self) -> UniverseId {
        match self {
            Self::Cells(u) => u.id,
            Self::Dagmc(d) => d.id,
        }
    }
}

/// The root of a model's spatial description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub root: Universe,
}

impl Geometry {
    pub fn new(root: Universe) -> Self {
        Self { root }
    }

    /// Every material id filled anywhere in the cell tree, in visit order.
    pub fn material_fills(&self) -> Vec<MaterialId> {
        let mut out = Vec::new();
        collect_fills(&self.root, &mut out);
        out
    }

    /// Surfaces that carry a vacuum boundary.
    pub fn vacuum_boundaries(&self) -> Vec<&Surface> {
        let mut out: Vec<&Surface> = Vec::new();
        for cell in &self.root.cells {
            for s in cell.region.surfaces() {
                if s.boundary == BoundaryType::Vacuum && !out.iter().any(|o| o.id == s.id) {
                    out.push(s);
                }
            }
        }
        out
    }
}

fn collect_fills(universe: &Universe, out: &mut Vec<MaterialId>) {
    for cell in &universe.cells {
        match &cell.fill {
            Fill::Material(id) => out.push(*id),
            Fill::Universe(node) => {
                if let UniverseNode::Cells(inner) = node.as_ref() {
                    collect_fills(inner, out);
                }
            }
        }
    }
}
