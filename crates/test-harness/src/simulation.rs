//! SimulationHarness: build the reference model, run the engine, check the statepoint.
//!
//! Stages are individually callable in the same order a caller would drive
//! them by hand (`build_*` → `export` → `run` → `check_results` → `cleanup`);
//! [`SimulationHarness::execute`] runs the whole cycle and always cleans up.

use std::path::PathBuf;

use engine_bridge::{MockEngine, ProcessEngine, RunOutput, TransportEngine};
use model_io::ExportedModel;
use tracing::{debug, info, instrument, warn};
use transport_types::{ExpectedResults, Geometry, IdAllocator, Materials, ModelBundle, Settings};

use crate::assertions::{require, require_all};
use crate::config::HarnessConfig;
use crate::helpers::HarnessError;
use crate::model::{
    bounded_geometry, inner_universe, reference_materials, reference_settings, GeometrySource,
    MaterialState,
};
use crate::oracle::{
    check_expected_results, check_statepoint_count, check_statepoint_extension, OracleVerdict,
};
use crate::report::{HarnessKind, RunReport};
use crate::workspace::{patterns, FilePattern, Workspace, STANDARD_PATTERNS, STATEPOINT};

pub struct SimulationHarness<E: TransportEngine> {
    engine: E,
    source: GeometrySource,
    expected: ExpectedResults,
    ids: IdAllocator,
    settings: Option<Settings>,
    materials: MaterialState,
    geometry: Option<Geometry>,
}

impl SimulationHarness<MockEngine> {
    /// A harness over the deterministic mock engine.
    pub fn mock(source: GeometrySource) -> Self {
        Self::new(source, MockEngine::new())
    }
}

impl SimulationHarness<ProcessEngine> {
    /// A harness over the engine executable named in `config`.
    pub fn from_config(source: GeometrySource, config: &HarnessConfig) -> Self {
        Self::new(source, config.engine())
    }
}

impl<E: TransportEngine> SimulationHarness<E> {
    pub fn new(source: GeometrySource, engine: E) -> Self {
        Self {
            engine,
            source,
            expected: ExpectedResults::new(),
            ids: IdAllocator::new(),
            settings: None,
            materials: MaterialState::Unbuilt,
            geometry: None,
        }
    }

    /// Expected scalar results; an empty set skips numeric validation.
    pub fn with_expected(mut self, expected: ExpectedResults) -> Self {
        self.expected = expected;
        self
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn source(&self) -> &GeometrySource {
        &self.source
    }

    pub fn expected(&self) -> &ExpectedResults {
        &self.expected
    }

    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    pub fn materials(&self) -> Option<&Materials> {
        self.materials.get()
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    /// Install the reference run settings, replacing any previous ones.
    pub fn build_settings(&mut self) -> &Settings {
        self.settings.insert(reference_settings())
    }

    /// Build the reference materials unless already built.
    pub fn build_materials(&mut self) -> Result<&Materials, HarnessError> {
        let ids = &mut self.ids;
        if self.materials.build_with(|| reference_materials(ids))? {
            debug!("reference materials built");
        }
        self.materials.get().ok_or(HarnessError::NoMaterials)
    }

    /// Build the inner universe from the geometry source and bound it by the vacuum sphere.
    ///
    /// The synthetic fallback builds materials first if needed.
    pub fn build_geometry(&mut self) -> Result<&Geometry, HarnessError> {
        if self.source == GeometrySource::SyntheticFallback {
            self.build_materials()?;
        }
        let inner = inner_universe(&self.source, self.materials.get(), &mut self.ids)?;
        let geometry: &Geometry = self.geometry.insert(bounded_geometry(inner, &mut self.ids));
        Ok(geometry)
    }

    /// The complete bundle, building whatever is still missing.
    pub fn bundle(&mut self) -> Result<ModelBundle, HarnessError> {
        if self.settings.is_none() {
            self.build_settings();
        }
        let materials = self.build_materials()?.clone();
        if self.geometry.is_none() {
            self.build_geometry()?;
        }
        match (&self.settings, &self.geometry) {
            (Some(settings), Some(geometry)) => Ok(ModelBundle {
                materials,
                geometry: geometry.clone(),
                settings: settings.clone(),
            }),
            _ => Err(HarnessError::OutOfOrder {
                operation: "bundle".to_string(),
                detail: "model is incomplete".to_string(),
            }),
        }
    }

    /// Write materials, settings and geometry XML into the workspace.
    pub fn export(&mut self, ws: &Workspace) -> Result<ExportedModel, HarnessError> {
        let bundle = self.bundle()?;
        let exported = self.engine.export_model(&bundle, ws.path())?;
        debug!(dir = %ws.path().display(), "model exported");
        Ok(exported)
    }

    /// Export, then run the engine to completion. Engine failures propagate.
    #[instrument(skip(self, ws), fields(dir = %ws.path().display()))]
    pub fn run(&mut self, ws: &Workspace) -> Result<RunOutput, HarnessError> {
        self.export(ws)?;
        let output = self.engine.run(ws.path())?;
        info!(exit_code = ?output.exit_code, "engine run complete");
        Ok(output)
    }

    /// Check the statepoint left by a run.
    ///
    /// Exactly one `statepoint*` file ending `.h5` must exist. With expected
    /// results and an eigenvalue run, each quantity must lie within its
    /// tolerance widened by the reported uncertainty. Halts at the first
    /// failure; on success returns every verdict checked.
    pub fn check_results(&self, ws: &Workspace) -> Result<Vec<OracleVerdict>, HarnessError> {
        let found = ws.find(&FilePattern::new(STATEPOINT))?;
        let count = check_statepoint_count(&found);
        require(&count)?;
        let statepoint = &found[0];
        let extension = check_statepoint_extension(statepoint);
        require(&extension)?;

        let mut verdicts = vec![count, extension];
        if self.expected.is_empty() {
            debug!("no expected results, numeric checks skipped");
            return Ok(verdicts);
        }

        let summary = self.engine.read_statepoint(statepoint)?;
        let numeric = check_expected_results(&summary, &self.expected);
        if numeric.is_empty() {
            debug!(run_mode = %summary.run_mode, "not an eigenvalue run, numeric checks skipped");
        }
        require_all(&numeric)?;
        verdicts.extend(numeric);
        Ok(verdicts)
    }

    /// Remove generated `*.xml`, `*.h5` and `*.vtk` files.
    pub fn cleanup(&self, ws: &Workspace) -> Result<Vec<PathBuf>, HarnessError> {
        let removed = ws.remove_matching(&patterns(&STANDARD_PATTERNS))?;
        debug!(count = removed.len(), "cleanup done");
        Ok(removed)
    }

    /// Run, check and clean up.
    ///
    /// Cleanup is attempted even when the run or a check fails; the first
    /// failure is returned and a cleanup error behind it is only logged.
    #[instrument(skip(self, ws), fields(dir = %ws.path().display()))]
    pub fn execute(&mut self, ws: &Workspace) -> Result<RunReport, HarnessError> {
        let mut report = RunReport::new(HarnessKind::Simulation, ws.path());
        let outcome = self.run_and_check(ws, &mut report);
        let cleaned = self.cleanup(ws);
        match (outcome, cleaned) {
            (Ok(()), Ok(removed)) => {
                report.step("cleanup", format!("{} files removed", removed.len()));
                report.removed = removed;
                info!(run_id = %report.run_id, "simulation harness passed");
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

    fn run_and_check(
        &mut self,
        ws: &Workspace,
        report: &mut RunReport,
    ) -> Result<(), HarnessError> {
        let output = self.run(ws)?;
        report.step(
            "run",
            format!("exit code {:?} in {:.2}s", output.exit_code, output.elapsed.as_secs_f64()),
        );
        let verdicts = self.check_results(ws)?;
        report.step("check_results", format!("{} checks passed", verdicts.len()));
        report.record(verdicts);
        Ok(())
    }
}
