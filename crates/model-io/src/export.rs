use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};
use transport_types::ModelBundle;

use crate::errors::ExportError;
use crate::geometry::geometry_xml;
use crate::materials::materials_xml;
use crate::settings::settings_xml;
use crate::xml::XmlElement;

pub const MATERIALS_XML: &str = "materials.xml";
pub const SETTINGS_XML: &str = "settings.xml";
pub const GEOMETRY_XML: &str = "geometry.xml";

/// Paths of the input files written for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedModel {
    pub materials: PathBuf,
    pub settings: PathBuf,
    pub geometry: PathBuf,
}

impl ExportedModel {
    pub fn paths(&self) -> [&Path; 3] {
        [&self.materials, &self.settings, &self.geometry]
    }
}

/// Write materials, settings and geometry XML into `dir`, in that order.
#[instrument(skip(model), fields(dir = %dir.display()))]
pub fn export_model(model: &ModelBundle, dir: &Path) -> Result<ExportedModel, ExportError> {
    let (materials, index) = materials_xml(&model.materials)?;
    let materials_path = write_document(dir, MATERIALS_XML, &materials)?;

    let settings_path = write_document(dir, SETTINGS_XML, &settings_xml(&model.settings))?;

    let geometry = geometry_xml(&model.geometry, &index)?;
    let geometry_path = write_document(dir, GEOMETRY_XML, &geometry)?;

    Ok(ExportedModel {
        materials: materials_path,
        settings: settings_path,
        geometry: geometry_path,
    })
}

fn write_document(dir: &Path, name: &str, root: &XmlElement) -> Result<PathBuf, ExportError> {
    let path = dir.join(name);
    fs::write(&path, root.to_document()).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path.display(), "wrote model file");
    Ok(path)
}
