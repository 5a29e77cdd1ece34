//! Structured text reports of harness runs.
//!
//! Text is the primary rendering because people scanning CI logs read it
//! faster than raw data; JSON is available for tooling.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::helpers::HarnessError;
use crate::oracle::OracleVerdict;

/// Which flow produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HarnessKind {
    Simulation,
    Conversion,
}

impl fmt::Display for HarnessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simulation => write!(f, "Simulation"),
            Self::Conversion => write!(f, "Conversion"),
        }
    }
}

/// One completed harness stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    pub name: String,
    pub detail: String,
}

/// A complete record of one harness run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub harness: HarnessKind,
    pub started_at: DateTime<Utc>,
    pub workspace: PathBuf,
    pub steps: Vec<StepRecord>,
    pub verdicts: Vec<OracleVerdict>,
    pub removed: Vec<PathBuf>,
}

impl RunReport {
    pub fn new(harness: HarnessKind, workspace: &Path) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            harness,
            started_at: Utc::now(),
            workspace: workspace.to_path_buf(),
            steps: Vec::new(),
            verdicts: Vec::new(),
            removed: Vec::new(),
        }
    }

    pub fn step(&mut self, name: &str, detail: impl Into<String>) {
        self.steps.push(StepRecord {
            name: name.to_string(),
            detail: detail.into(),
        });
    }

    pub fn record(&mut self, verdicts: impl IntoIterator<Item = OracleVerdict>) {
        self.verdicts.extend(verdicts);
    }

    pub fn passed(&self) -> bool {
        self.verdicts.iter().all(|v| v.passed)
    }

    /// Format the report as text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("=== {} Harness Report ===\n\n", self.harness));
        out.push_str(&format!("Run: {}\n", self.run_id));
        out.push_str(&format!("Started: {}\n", self.started_at.to_rfc3339()));
        out.push_str(&format!("Workspace: {}\n", self.workspace.display()));

        out.push_str(&format!("\nSteps ({}):\n", self.steps.len()));
        for (i, s) in self.steps.iter().enumerate() {
            if s.detail.is_empty() {
                out.push_str(&format!("  [{}] {}\n", i, s.name));
            } else {
                out.push_str(&format!("  [{}] {}: {}\n", i, s.name, s.detail));
            }
        }

        if !self.verdicts.is_empty() {
            let failed = self.verdicts.iter().filter(|v| !v.passed).count();
            out.push_str(&format!(
                "\nOracle Results ({} checks, {} failed):\n",
                self.verdicts.len(),
                failed
            ));
            for v in &self.verdicts {
                let status = if v.passed { "PASS" } else { "FAIL" };
                out.push_str(&format!("  [{}] {}: {}\n", status, v.oracle_name, v.detail));
            }
        }

        if self.removed.is_empty() {
            out.push_str("\nCleanup: nothing to remove\n");
        } else {
            out.push_str(&format!("\nCleanup ({} files removed):\n", self.removed.len()));
            for p in &self.removed {
                let name = p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
                out.push_str(&format!("  {}\n", name));
            }
        }

        out
    }

    pub fn to_json(&self) -> Result<String, HarnessError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}
