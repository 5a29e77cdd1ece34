//! ScriptedConverter: drives the CAD_to_OpenMC python package.
//!
//! The python assembly object only lives for one interpreter session, so
//! import and merge are recorded and replayed in a single generated script at
//! export time.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, instrument};

use crate::traits::ConversionBackend;
use crate::types::*;

pub struct ScriptedConverter {
    python: PathBuf,
    files: Vec<PathBuf>,
    merge: bool,
}

impl ScriptedConverter {
    pub fn new(python: impl Into<PathBuf>) -> Self {
        Self {
            python: python.into(),
            files: Vec::new(),
            merge: false,
        }
    }

    /// The script run for an export to `destination`.
    ///
    /// The script runs inside the destination's directory, so the container is
    /// named by file name alone.
    pub fn script(&self, backend: MeshBackend, destination: &Path) -> String {
        let files: Vec<String> = self
            .files
            .iter()
            .map(|p| py_str(&p.display().to_string()))
            .collect();
        let mut out = String::new();
        out.push_str("import CAD_to_OpenMC.assembly as ab\n");
        out.push_str(&format!("a = ab.Assembly([{}])\n", files.join(", ")));
        out.push_str("a.import_stp_files()\n");
        if self.merge {
            out.push_str("a.merge_all()\n");
        }
        out.push_str(&format!(
            "a.solids_to_h5m(backend={}, h5m_filename={})\n",
            py_str(backend.as_str()),
            py_str(&container_name(destination)),
        ));
        out
    }
}

fn container_name(destination: &Path) -> String {
    destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| destination.display().to_string())
}

/// A double-quoted string literal valid in both JSON and python.
fn py_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

impl ConversionBackend for ScriptedConverter {
    fn import_solids(&mut self, files: &[PathBuf]) -> Result<ImportSummary, ConversionError> {
        if files.is_empty() {
            return Err(ConversionError::NothingImported);
        }
        for file in files {
            if !file.exists() {
                return Err(ConversionError::MissingSource { path: file.clone() });
            }
        }
        // The script runs elsewhere, so relative sources are pinned now.
        for file in files {
            let absolute = std::path::absolute(file).map_err(|source| ConversionError::Io {
                path: file.clone(),
                source,
            })?;
            self.files.push(absolute);
        }
        Ok(ImportSummary {
            files: files.len(),
            solids: None,
        })
    }

    fn merge(&mut self) -> Result<MergeSummary, ConversionError> {
        if self.files.is_empty() {
            return Err(ConversionError::NothingImported);
        }
        self.merge = true;
        Ok(MergeSummary {
            solids: self.files.len(),
            shared_faces: None,
        })
    }

    #[instrument(skip(self), fields(python = %self.python.display()))]
    fn export_h5m(
        &mut self,
        backend: MeshBackend,
        destination: &Path,
    ) -> Result<MeshExport, ConversionError> {
        if self.files.is_empty() {
            return Err(ConversionError::NothingImported);
        }
        let script = self.script(backend, destination);
        debug!(%script, "conversion script");

        let dir = destination_dir(destination);
        let output = Command::new(&self.python)
            .arg("-c")
            .arg(&script)
            .current_dir(dir)
            .output()
            .map_err(|source| ConversionError::Io {
                path: self.python.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(ConversionError::BackendFailed {
                detail: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(MeshExport {
            path: destination.to_path_buf(),
            backend,
            merged: self.merge,
            volumes: None,
            surfaces: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_replays_import_and_merge() {
        let dir = tempfile::tempdir().unwrap();
        let step = dir.path().join("a.step");
        std::fs::write(&step, "").unwrap();

        let mut conv = ScriptedConverter::new("python3");
        conv.import_solids(&[step.clone()]).unwrap();
        let plain = conv.script(MeshBackend::Stl, Path::new("out_cqstl.h5m"));
        assert!(!plain.contains("merge_all"));
        assert!(plain.contains("backend=\"stl\""));
        assert!(plain.contains("h5m_filename=\"out_cqstl.h5m\""));
        assert!(plain.contains(&format!("\"{}\"", step.display())));

        conv.merge().unwrap();
        let merged = conv.script(MeshBackend::Stl, Path::new("out_cqstl.h5m"));
        let import_at = merged.find("import_stp_files").unwrap();
        let merge_at = merged.find("merge_all").unwrap();
        let export_at = merged.find("solids_to_h5m").unwrap();
        assert!(import_at < merge_at && merge_at < export_at);
    }

    #[test]
    fn quotes_and_backslashes_are_escaped() {
        assert_eq!(py_str(r#"a"b\c"#), r#""a\"b\\c""#);
    }

    #[test]
    fn nested_destination_is_named_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let step = dir.path().join("a.step");
        std::fs::write(&step, "").unwrap();
        let mut conv = ScriptedConverter::new("python3");
        conv.import_solids(&[step]).unwrap();
        let script = conv.script(MeshBackend::Stl, &dir.path().join("out_cqstl.h5m"));
        assert!(script.contains("h5m_filename=\"out_cqstl.h5m\""), "{script}");
    }

    #[test]
    fn bare_destination_exports_from_current_dir() {
        let dir = tempfile::tempdir().unwrap();
        let step = dir.path().join("a.step");
        std::fs::write(&step, "").unwrap();
        // `true` ignores the script and exits 0, standing in for the interpreter.
        let mut conv = ScriptedConverter::new("true");
        conv.import_solids(&[step]).unwrap();
        let export = conv
            .export_h5m(MeshBackend::Stl, Path::new("out_cqstl.h5m"))
            .unwrap();
        assert_eq!(export.path, Path::new("out_cqstl.h5m"));
    }

    #[test]
    fn export_without_import_fails() {
        let mut conv = ScriptedConverter::new("python3");
        let err = conv
            .export_h5m(MeshBackend::Stl, Path::new("out.h5m"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::NothingImported));
    }
}
