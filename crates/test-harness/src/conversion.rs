//! ConversionHarness: import CAD solids, optionally merge, export an h5m mesh, validate.

use std::fs;
use std::path::{Path, PathBuf};

use engine_bridge::stl::read_stl;
use engine_bridge::{
    ConversionBackend, Hdf5SignatureValidator, ImportSummary, MergeSummary, MeshBackend,
    MeshExport, MeshValidator, MockConverter, ScriptedConverter,
};
use tracing::{debug, info, instrument, warn};

use crate::assertions::{require, require_all};
use crate::config::{HarnessConfig, DEFAULT_MESH_FILENAME};
use crate::helpers::HarnessError;
use crate::oracle::{
    check_face_intermediates, check_merge_honored, check_mesh_exists, check_mesh_valid,
    run_face_checks, OracleVerdict,
};
use crate::report::{HarnessKind, RunReport};
use crate::workspace::{
    patterns, FilePattern, Workspace, FACE_INTERMEDIATES, MESH_CONTAINER, STANDARD_PATTERNS,
};

/// How far a conversion has progressed. Calls must move forward through these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Fresh,
    Imported,
    Merged,
    Exported,
}

pub struct ConversionHarness<B: ConversionBackend, V: MeshValidator> {
    backend: B,
    validator: V,
    mesh_backend: MeshBackend,
    mesh_filename: String,
    stage: Stage,
    merge_requested: bool,
    last_export: Option<MeshExport>,
}

impl ConversionHarness<MockConverter, Hdf5SignatureValidator> {
    /// A harness over the deterministic mock converter.
    pub fn mock() -> Self {
        Self::new(MockConverter::new(), Hdf5SignatureValidator)
    }
}

impl ConversionHarness<ScriptedConverter, Hdf5SignatureValidator> {
    /// A harness driving the python conversion package named in `config`.
    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.converter(), Hdf5SignatureValidator)
            .with_mesh_backend(config.converter.backend)
            .with_mesh_filename(&config.mesh.filename)
    }
}

impl<B: ConversionBackend, V: MeshValidator> ConversionHarness<B, V> {
    pub fn new(backend: B, validator: V) -> Self {
        Self {
            backend,
            validator,
            mesh_backend: MeshBackend::Stl,
            mesh_filename: DEFAULT_MESH_FILENAME.to_string(),
            stage: Stage::Fresh,
            merge_requested: false,
            last_export: None,
        }
    }

    pub fn with_mesh_backend(mut self, backend: MeshBackend) -> Self {
        self.mesh_backend = backend;
        self
    }

    pub fn with_mesh_filename(mut self, filename: &str) -> Self {
        self.mesh_filename = filename.to_string();
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn last_export(&self) -> Option<&MeshExport> {
        self.last_export.as_ref()
    }

    /// Where the mesh container lands in `ws`.
    pub fn mesh_path(&self, ws: &Workspace) -> PathBuf {
        ws.join(&self.mesh_filename)
    }

    fn expect_stage(&self, operation: &str, allowed: &[Stage]) -> Result<(), HarnessError> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(HarnessError::OutOfOrder {
                operation: operation.to_string(),
                detail: format!("harness is at stage {:?}", self.stage),
            })
        }
    }

    /// Load the CAD solid files. Must be the first call.
    pub fn import_solids(&mut self, files: &[PathBuf]) -> Result<ImportSummary, HarnessError> {
        self.expect_stage("import_solids", &[Stage::Fresh])?;
        let summary = self.backend.import_solids(files)?;
        info!(files = summary.files, solids = ?summary.solids, "solids imported");
        self.stage = Stage::Imported;
        Ok(summary)
    }

    /// Merge shared surfaces when `requested`; otherwise nothing happens.
    ///
    /// A requested merge must come after import and before export.
    pub fn merge(&mut self, requested: bool) -> Result<Option<MergeSummary>, HarnessError> {
        if !requested {
            return Ok(None);
        }
        self.expect_stage("merge", &[Stage::Imported])?;
        let summary = self.backend.merge()?;
        info!(solids = summary.solids, shared_faces = ?summary.shared_faces, "solids merged");
        self.merge_requested = true;
        self.stage = Stage::Merged;
        Ok(Some(summary))
    }

    /// Export the mesh container to `destination` with the named backend.
    ///
    /// Existence of the file is checked by the caller, not here.
    #[instrument(skip(self))]
    pub fn export_to_mesh(
        &mut self,
        backend: MeshBackend,
        destination: &Path,
    ) -> Result<MeshExport, HarnessError> {
        self.expect_stage("export_to_mesh", &[Stage::Imported, Stage::Merged])?;
        let export = self.backend.export_h5m(backend, destination)?;
        require(&check_merge_honored(self.merge_requested, &export))?;
        debug!(volumes = ?export.volumes, surfaces = ?export.surfaces, "mesh exported");
        self.stage = Stage::Exported;
        self.last_export = Some(export.clone());
        Ok(export)
    }

    /// Ask the validator whether `path` is a structurally valid mesh container.
    pub fn validate(&self, path: &Path) -> Result<OracleVerdict, HarnessError> {
        let valid = self.validator.validate(path)?;
        Ok(check_mesh_valid(path, valid))
    }

    /// Per-face oracles over the `vol*_face*` intermediates written into `ws`.
    ///
    /// The number of face files is checked against the surface count of the
    /// last export.
    pub fn mesh_checks(&self, ws: &Workspace) -> Result<Vec<OracleVerdict>, HarnessError> {
        let faces = ws.find(&FilePattern::new(FACE_INTERMEDIATES))?;
        let mut verdicts = Vec::new();
        if let Some(export) = &self.last_export {
            verdicts.push(check_face_intermediates(faces.len(), export));
        }
        for path in &faces {
            let mesh = read_stl(path)?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            for mut v in run_face_checks(&mesh) {
                v.detail = format!("{}: {}", name, v.detail);
                verdicts.push(v);
            }
        }
        Ok(verdicts)
    }

    /// Remove generated files, mesh containers and `vol*_face*` intermediates.
    pub fn cleanup(&self, ws: &Workspace) -> Result<Vec<PathBuf>, HarnessError> {
        let mut globs = STANDARD_PATTERNS.to_vec();
        globs.extend([MESH_CONTAINER, FACE_INTERMEDIATES]);
        let removed = ws.remove_matching(&patterns(&globs))?;
        debug!(count = removed.len(), "cleanup done");
        Ok(removed)
    }

    /// Import, optionally merge, export, then require the mesh to exist and be valid.
    ///
    /// A harness runs once: the backend keeps what it imported, so a second
    /// `run` is rejected before anything is touched. Cleanup is attempted on
    /// every other path; the first failure wins.
    #[instrument(skip(self, ws, files), fields(dir = %ws.path().display()))]
    pub fn run(
        &mut self,
        ws: &Workspace,
        files: &[PathBuf],
        merge: bool,
    ) -> Result<RunReport, HarnessError> {
        self.expect_stage("run", &[Stage::Fresh])?;
        let mut report = RunReport::new(HarnessKind::Conversion, ws.path());
        let outcome = self.convert_and_check(ws, files, merge, &mut report);
        let cleaned = self.cleanup(ws);
        match (outcome, cleaned) {
            (Ok(()), Ok(removed)) => {
                report.step("cleanup", format!("{} files removed", removed.len()));
                report.removed = removed;
                info!(run_id = %report.run_id, merge, "conversion harness passed");
                Ok(report)
            }
            (Ok(()), Err(e)) => Err(e),
            (Err(e), Ok(_)) => Err(e),
            (Err(e), Err(cleanup_err)) => {
                warn!(error = %cleanup_err, "cleanup failed after an earlier failure");
                Err(e)
            }
        }
    }

    fn convert_and_check(
        &mut self,
        ws: &Workspace,
        files: &[PathBuf],
        merge: bool,
        report: &mut RunReport,
    ) -> Result<(), HarnessError> {
        let imported = self.import_solids(files)?;
        report.step("import_solids", format!("{} files", imported.files));

        if let Some(merged) = self.merge(merge)? {
            report.step("merge", format!("{} solids", merged.solids));
        }

        let destination = self.mesh_path(ws);
        let export = self.export_to_mesh(self.mesh_backend, &destination)?;
        report.step(
            "export_to_mesh",
            format!("{} via {} (merged={})", export.path.display(), export.backend, export.merged),
        );

        let exists = check_mesh_exists(&destination);
        require(&exists)?;
        let valid = self.validate(&destination)?;
        require(&valid)?;
        let quality = self.mesh_checks(ws)?;
        require_all(&quality)?;

        report.record([exists, valid]);
        report.record(quality);
        Ok(())
    }
}

/// CAD solid files (`.step` / `.stp`, any case) directly in `dir`, sorted.
pub fn discover_solid_files(dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    let entries = fs::read_dir(dir).map_err(|e| HarnessError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| HarnessError::io(dir, e))?.path();
        let is_step = path
            .extension()
            .map(|ext| {
                let ext = ext.to_string_lossy().to_ascii_lowercase();
                ext == "step" || ext == "stp"
            })
            .unwrap_or(false);
        if is_step && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
