//! Harness configuration loaded from JSON.
//!
//! Every section is optional; missing fields fall back to defaults that
//! reproduce the fixed behavior of the harness.

use std::fs;
use std::path::{Path, PathBuf};

use engine_bridge::{MeshBackend, ProcessEngine, ScriptedConverter};
use serde::{Deserialize, Serialize};

use crate::helpers::HarnessError;

/// Destination the conversion harness exports to.
pub const DEFAULT_MESH_FILENAME: &str = "out_cqstl.h5m";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub engine: EngineConfig,
    pub converter: ConverterConfig,
    pub workspace: WorkspaceConfig,
    pub mesh: MeshConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub threads: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("openmc"),
            args: Vec::new(),
            threads: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    pub python: PathBuf,
    pub backend: MeshBackend,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            python: PathBuf::from("python3"),
            backend: MeshBackend::Stl,
        }
    }
}

/// Where harness runs happen.
///
/// With `scoped` set, each run gets a fresh directory under `root` (or the
/// system temp dir). Otherwise `root` itself is used and must exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    pub scoped: bool,
    pub root: Option<PathBuf>,
    pub prefix: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            scoped: true,
            root: None,
            prefix: "mc-harness-".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub filename: String,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            filename: DEFAULT_MESH_FILENAME.to_string(),
        }
    }
}

impl HarnessConfig {
    pub fn from_json_str(json: &str) -> Result<Self, HarnessError> {
        serde_json::from_str(json).map_err(|e| HarnessError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let text = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| HarnessError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn to_json(&self) -> Result<String, HarnessError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// A process-backed engine built from the `engine` section.
    pub fn engine(&self) -> ProcessEngine {
        let engine = ProcessEngine::new(&self.engine.program).with_args(self.engine.args.clone());
        match self.engine.threads {
            Some(n) => engine.with_threads(n),
            None => engine,
        }
    }

    pub fn converter(&self) -> ScriptedConverter {
        ScriptedConverter::new(&self.converter.python)
    }
}
