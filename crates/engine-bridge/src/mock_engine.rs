//! MockEngine: deterministic test double implementing TransportEngine.
//!
//! Writes the same artifacts a real run leaves behind (statepoint, summary)
//! with a scripted result, so harness logic can be exercised without the
//! transport engine installed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use model_io::{ExportedModel, GEOMETRY_XML, MATERIALS_XML, SETTINGS_XML};
use tracing::debug;
use transport_types::{Measurement, ModelBundle, RunMode, Settings, StatepointSummary, KEFF};

use crate::hdf5::{read_stamped, write_stamped};
use crate::traits::TransportEngine;
use crate::types::{EngineError, RunOutput};

/// Scripted behavior of a mock run.
#[derive(Debug, Clone)]
struct Script {
    run_mode: Option<RunMode>,
    quantities: BTreeMap<String, Measurement>,
    statepoints: usize,
    extension: String,
    write_vtk: bool,
    failure: Option<String>,
}

pub struct MockEngine {
    script: Script,
    exported: Option<Settings>,
    runs: usize,
}

impl MockEngine {
    /// An engine that reports keff = 1.0 ± 0.001 in the exported run mode.
    pub fn new() -> Self {
        let mut quantities = BTreeMap::new();
        quantities.insert(
            KEFF.to_string(),
            Measurement {
                mean: 1.0,
                std_dev: 0.001,
            },
        );
        Self {
            script: Script {
                run_mode: None,
                quantities,
                statepoints: 1,
                extension: "h5".to_string(),
                write_vtk: false,
                failure: None,
            },
            exported: None,
            runs: 0,
        }
    }

    pub fn with_keff(self, mean: f64, std_dev: f64) -> Self {
        self.with_quantity(KEFF, mean, std_dev)
    }

    pub fn with_quantity(mut self, name: &str, mean: f64, std_dev: f64) -> Self {
        self.script
            .quantities
            .insert(name.to_string(), Measurement { mean, std_dev });
        self
    }

    /// Report this run mode regardless of what the settings asked for.
    pub fn with_run_mode(mut self, mode: RunMode) -> Self {
        self.script.run_mode = Some(mode);
        self
    }

    /// Number of `statepoint*` files a run writes.
    pub fn with_statepoints(mut self, count: usize) -> Self {
        self.script.statepoints = count;
        self
    }

    pub fn with_statepoint_extension(mut self, ext: &str) -> Self {
        self.script.extension = ext.to_string();
        self
    }

    pub fn with_vtk_output(mut self) -> Self {
        self.script.write_vtk = true;
        self
    }

    /// Make every run fail with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.script.failure = Some(message.to_string());
        self
    }

    pub fn run_count(&self) -> usize {
        self.runs
    }

    fn write(&self, path: PathBuf, payload: &[u8]) -> Result<PathBuf, EngineError> {
        write_stamped(&path, payload).map_err(|source| EngineError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransportEngine for MockEngine {
    fn export_model(
        &mut self,
        model: &ModelBundle,
        dir: &Path,
    ) -> Result<ExportedModel, EngineError> {
        let exported = model_io::export_model(model, dir)?;
        self.exported = Some(model.settings.clone());
        Ok(exported)
    }

    fn run(&mut self, dir: &Path) -> Result<RunOutput, EngineError> {
        self.runs += 1;
        if let Some(message) = &self.script.failure {
            return Err(EngineError::RunFailed {
                status: "exit status: 1".to_string(),
                detail: message.clone(),
            });
        }
        for name in [MATERIALS_XML, SETTINGS_XML, GEOMETRY_XML] {
            let path = dir.join(name);
            if !path.exists() {
                return Err(EngineError::MissingInput { path });
            }
        }

        let settings = self.exported.as_ref();
        let batches = settings.map(|s| s.batches).unwrap_or(1);
        let run_mode = self
            .script
            .run_mode
            .or(settings.map(|s| s.run_mode))
            .unwrap_or(RunMode::Eigenvalue);
        let summary = StatepointSummary {
            run_mode,
            batches,
            quantities: self.script.quantities.clone(),
        };
        let payload = serde_json::to_vec(&summary).map_err(|e| EngineError::Statepoint {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

        for i in 0..self.script.statepoints {
            let batch = batches as usize + i;
            let name = format!("statepoint.{}.{}", batch, self.script.extension);
            let path = self.write(dir.join(name), &payload)?;
            debug!(path = %path.display(), "mock statepoint written");
        }
        self.write(dir.join("summary.h5"), b"{}")?;
        if self.script.write_vtk {
            self.write(dir.join("plot.vtk"), b"")?;
        }

        let mut stdout = String::new();
        stdout.push_str(match run_mode {
            RunMode::Eigenvalue => " ====>     K EIGENVALUE SIMULATION     <====\n",
            RunMode::FixedSource => " ====>     FIXED SOURCE TRANSPORT SIMULATION     <====\n",
        });
        if let Some(k) = summary.keff() {
            stdout.push_str(&format!(
                " Combined k-effective        = {:.5} +/- {:.5}\n",
                k.mean, k.std_dev
            ));
        }

        Ok(RunOutput {
            stdout,
            exit_code: Some(0),
            elapsed: Duration::ZERO,
        })
    }

    fn read_statepoint(&self, path: &Path) -> Result<StatepointSummary, EngineError> {
        let payload = read_stamped(path).map_err(|e| EngineError::Statepoint {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_slice(&payload).map_err(|e| EngineError::Statepoint {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}
