use std::collections::BTreeSet;

use transport_types::{
    Fill, Geometry, Surface, SurfaceId, Universe, UniverseId, UniverseNode,
};

use crate::errors::ExportError;
use crate::materials::MaterialIndex;
use crate::xml::{join_numbers, XmlElement};

/// Build the `<geometry>` element by flattening the universe tree.
///
/// Every material fill must be present in `materials`.
pub fn geometry_xml(
    geometry: &Geometry,
    materials: &MaterialIndex,
) -> Result<XmlElement, ExportError> {
    let mut flat = Flattened::default();
    flat.visit(&geometry.root, materials)?;

    let mut root = XmlElement::new("geometry");
    for cell in flat.cells {
        root.push(cell);
    }
    for surface in &flat.surfaces {
        root.push(surface_xml(surface));
    }
    for dagmc in flat.dagmc {
        root.push(dagmc);
    }
    Ok(root)
}

#[derive(Default)]
struct Flattened {
    cells: Vec<XmlElement>,
    surfaces: Vec<Surface>,
    dagmc: Vec<XmlElement>,
    seen_universes: BTreeSet<UniverseId>,
    seen_surfaces: BTreeSet<SurfaceId>,
}

impl Flattened {
    fn visit(&mut self, universe: &Universe, materials: &MaterialIndex) -> Result<(), ExportError> {
        if !self.seen_universes.insert(universe.id) {
            return Ok(());
        }
        for cell in &universe.cells {
            let mut el = XmlElement::new("cell").attr("id", cell.id.0);
            if let Some(name) = &cell.name {
                el = el.attr("name", name);
            }
            el = match &cell.fill {
                Fill::Material(id) => {
                    if !materials.contains(*id) {
                        return Err(ExportError::UnknownMaterial { id: *id });
                    }
                    el.attr("material", id.0)
                }
                Fill::Universe(node) => el.attr("fill", node.id().0),
            };
            el = el
                .attr("region", cell.region.expression())
                .attr("universe", universe.id.0);
            self.cells.push(el);

            for s in cell.region.surfaces() {
                if self.seen_surfaces.insert(s.id) {
                    self.surfaces.push(s.clone());
                }
            }

            if let Fill::Universe(node) = &cell.fill {
                match node.as_ref() {
                    UniverseNode::Cells(inner) => self.visit(inner, materials)?,
                    UniverseNode::Dagmc(d) => {
                        if self.seen_universes.insert(d.id) {
                            self.dagmc.push(
                                XmlElement::new("dagmc_universe")
                                    .attr("auto_geom_ids", d.auto_geom_ids)
                                    .attr("filename", d.filename.display())
                                    .attr("id", d.id.0),
                            );
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn surface_xml(surface: &Surface) -> XmlElement {
    let mut el = XmlElement::new("surface");
    if surface.boundary != transport_types::BoundaryType::Transmission {
        el = el.attr("boundary", surface.boundary.as_str());
    }
    el.attr("coeffs", join_numbers(&surface.kind.coefficients()))
        .attr("id", surface.id.0)
        .attr("type", surface.kind.type_name())
}
