use std::collections::BTreeMap;

use transport_types::{MaterialId, Materials};

use crate::errors::ExportError;
use crate::xml::XmlElement;

/// Material ids known to the engine after materials have been written.
///
/// Geometry serialization takes this index so it can only run after the
/// materials it refers to have been exported.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialIndex {
    names: BTreeMap<MaterialId, String>,
}

impl MaterialIndex {
    pub fn contains(&self, id: MaterialId) -> bool {
        self.names.contains_key(&id)
    }

    pub fn name(&self, id: MaterialId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Build the `<materials>` element, expanding natural elements to nuclides.
pub fn materials_xml(materials: &Materials) -> Result<(XmlElement, MaterialIndex), ExportError> {
    let mut root = XmlElement::new("materials");
    let mut index = MaterialIndex::default();

    for material in materials.iter() {
        material.validate()?;

        let mut el = XmlElement::new("material")
            .attr("id", material.id.0)
            .attr("name", &material.name);
        if let Some(density) = material.density {
            el.push(
                XmlElement::new("density")
                    .attr("units", density.units.as_str())
                    .attr("value", density.value),
            );
        }
        for (nuclide, fraction, basis) in material.expanded_nuclides()? {
            el.push(
                XmlElement::new("nuclide")
                    .attr("name", nuclide)
                    .attr(basis.as_str(), fraction),
            );
        }
        root.push(el);
        index.names.insert(material.id, material.name.clone());
    }

    Ok((root, index))
}
