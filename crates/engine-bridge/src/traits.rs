use std::path::{Path, PathBuf};

use model_io::ExportedModel;
use transport_types::{ModelBundle, StatepointSummary};

use crate::types::*;

/// The Monte Carlo transport engine.
/// Implemented by ProcessEngine (runs the real executable) and MockEngine
/// (deterministic test double).
pub trait TransportEngine {
    /// Write the engine input files for `model` into `dir`.
    fn export_model(
        &mut self,
        model: &ModelBundle,
        dir: &Path,
    ) -> Result<ExportedModel, EngineError> {
        Ok(model_io::export_model(model, dir)?)
    }

    /// Run the engine synchronously with `dir` as its working directory.
    fn run(&mut self, dir: &Path) -> Result<RunOutput, EngineError>;

    /// Read run mode and scalar results from a statepoint artifact.
    fn read_statepoint(&self, path: &Path) -> Result<StatepointSummary, EngineError>;
}

/// The CAD-to-mesh conversion library.
///
/// Calls must follow import → [merge] → export; implementations may reject
/// anything else.
pub trait ConversionBackend {
    /// Load the given CAD solid files.
    fn import_solids(&mut self, files: &[PathBuf]) -> Result<ImportSummary, ConversionError>;

    /// Merge coincident surfaces between imported solids.
    fn merge(&mut self) -> Result<MergeSummary, ConversionError>;

    /// Write the mesh container to `destination`. Intermediate files land next to it.
    fn export_h5m(
        &mut self,
        backend: MeshBackend,
        destination: &Path,
    ) -> Result<MeshExport, ConversionError>;
}

/// Structural check of a mesh container.
pub trait MeshValidator {
    fn validate(&self, path: &Path) -> Result<bool, ConversionError>;
}
