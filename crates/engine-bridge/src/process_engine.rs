//! ProcessEngine: runs the transport engine executable in a directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Instant, SystemTime};

use tracing::{debug, info, instrument};
use transport_types::{Measurement, RunMode, StatepointSummary, KEFF};

use crate::hdf5::has_hdf5_signature;
use crate::traits::TransportEngine;
use crate::types::{EngineError, RunOutput};

/// Launches the engine binary and reads results from its console output.
///
/// The statepoint itself is only checked for the HDF5 signature; run mode and
/// scalar estimates come from the RESULTS block the engine prints. Only
/// statepoints written by this engine's most recent run can be read, so the
/// numbers always belong to the artifact being checked.
pub struct ProcessEngine {
    program: PathBuf,
    args: Vec<String>,
    threads: Option<u32>,
    last_run: Option<LastRun>,
}

/// Console output of a successful run and the statepoints it wrote.
struct LastRun {
    stdout: String,
    statepoints: Vec<PathBuf>,
}

/// Canonical statepoint paths in a directory with their modification times.
type StatepointStamps = BTreeMap<PathBuf, Option<SystemTime>>;

impl ProcessEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            threads: None,
            last_run: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl TransportEngine for ProcessEngine {
    #[instrument(skip(self), fields(program = %self.program.display(), dir = %dir.display()))]
    fn run(&mut self, dir: &Path) -> Result<RunOutput, EngineError> {
        self.last_run = None;
        let before = statepoint_stamps(dir)?;
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(dir);
        if let Some(threads) = self.threads {
            cmd.arg("-s").arg(threads.to_string());
        }

        let started = Instant::now();
        let output = cmd.output().map_err(|source| EngineError::Spawn {
            program: self.program.clone(),
            source,
        })?;
        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        for line in stdout.lines() {
            debug!(target: "engine", "{}", line);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::RunFailed {
                status: output.status.to_string(),
                detail: tail(&stderr, 20),
            });
        }

        info!(elapsed_ms = started.elapsed().as_millis() as u64, "engine run finished");
        let statepoints: Vec<PathBuf> = statepoint_stamps(dir)?
            .into_iter()
            .filter(|(path, modified)| before.get(path) != Some(modified))
            .map(|(path, _)| path)
            .collect();
        debug!(count = statepoints.len(), "statepoints written");
        self.last_run = Some(LastRun {
            stdout: stdout.clone(),
            statepoints,
        });
        Ok(RunOutput {
            stdout,
            exit_code: output.status.code(),
            elapsed: started.elapsed(),
        })
    }

    fn read_statepoint(&self, path: &Path) -> Result<StatepointSummary, EngineError> {
        let is_hdf5 = has_hdf5_signature(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !is_hdf5 {
            return Err(EngineError::Statepoint {
                path: path.to_path_buf(),
                reason: "not an HDF5 file".to_string(),
            });
        }
        let last_run = self.last_run.as_ref().ok_or_else(|| EngineError::Statepoint {
            path: path.to_path_buf(),
            reason: "no engine output captured for this statepoint".to_string(),
        })?;
        let canonical = fs::canonicalize(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if !last_run.statepoints.contains(&canonical) {
            return Err(EngineError::Statepoint {
                path: path.to_path_buf(),
                reason: "statepoint was not written by the last run of this engine".to_string(),
            });
        }
        let mut summary =
            parse_console_summary(&last_run.stdout).map_err(|reason| EngineError::Statepoint {
                path: path.to_path_buf(),
                reason,
            })?;
        summary.batches = batch_from_filename(path).unwrap_or(0);
        Ok(summary)
    }
}

/// Extract run mode and the RESULTS block estimates from engine console output.
///
/// Recognized lines map to quantities: `Combined k-effective` → `keff`,
/// `k-effective (Collision)` → `keff_collision`, `k-effective (Track-length)`
/// → `keff_tracklength`, `k-effective (Absorption)` → `keff_absorption`,
/// `Leakage Fraction` → `leakage`.
pub fn parse_console_summary(stdout: &str) -> Result<StatepointSummary, String> {
    let mut run_mode = None;
    let mut quantities = BTreeMap::new();

    for line in stdout.lines() {
        let trimmed = line.trim();
        if trimmed.contains("K EIGENVALUE SIMULATION") {
            run_mode = Some(RunMode::Eigenvalue);
            continue;
        }
        if trimmed.contains("FIXED SOURCE TRANSPORT SIMULATION") {
            run_mode = Some(RunMode::FixedSource);
            continue;
        }
        let Some((label, value)) = trimmed.split_once('=') else {
            continue;
        };
        let key = match label.trim() {
            "Combined k-effective" => KEFF,
            "k-effective (Collision)" => "keff_collision",
            "k-effective (Track-length)" => "keff_tracklength",
            "k-effective (Absorption)" => "keff_absorption",
            "Leakage Fraction" => "leakage",
            _ => continue,
        };
        quantities.insert(key.to_string(), parse_measurement(value)?);
    }

    let run_mode = run_mode.ok_or_else(|| "run mode banner not found".to_string())?;
    Ok(StatepointSummary {
        run_mode,
        batches: 0,
        quantities,
    })
}

fn parse_measurement(text: &str) -> Result<Measurement, String> {
    let (mean, std_dev) = text
        .split_once("+/-")
        .ok_or_else(|| format!("expected `mean +/- std`, got `{}`", text.trim()))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<f64>()
            .map_err(|e| format!("bad number `{}`: {}", s.trim(), e))
    };
    Ok(Measurement {
        mean: parse(mean)?,
        std_dev: parse(std_dev)?,
    })
}

fn statepoint_stamps(dir: &Path) -> Result<StatepointStamps, EngineError> {
    let io = |source: std::io::Error| EngineError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut stamps = BTreeMap::new();
    for entry in fs::read_dir(dir).map_err(io)? {
        let entry = entry.map_err(io)?;
        if !entry.file_name().to_string_lossy().starts_with("statepoint") {
            continue;
        }
        let meta = entry.metadata().map_err(io)?;
        if meta.is_file() {
            let path = fs::canonicalize(entry.path()).map_err(io)?;
            stamps.insert(path, meta.modified().ok());
        }
    }
    Ok(stamps)
}

/// `statepoint.20.h5` → 20.
fn batch_from_filename(path: &Path) -> Option<u32> {
    let name = path.file_name()?.to_str()?;
    name.split('.').nth(1)?.parse().ok()
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
