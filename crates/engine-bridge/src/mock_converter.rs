//! MockConverter: deterministic test double implementing ConversionBackend.
//!
//! Each imported file becomes a unit box placed next to the previous one
//! along +X, so neighbours share a face that a merge collapses. The `stl`
//! backend leaves `vol{v}_face{f}.stl` intermediates beside the container, as
//! the real per-face tessellation pipeline does.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use tracing::{debug, info};

use crate::hdf5::write_stamped;
use crate::stl::write_ascii_stl;
use crate::tessellation::{box_mesh, FACE_X_MIN};
use crate::traits::ConversionBackend;
use crate::types::*;

/// Shared record of backend calls, for asserting call order in tests.
pub type CallLog = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Clone)]
struct MockSolid {
    source: PathBuf,
    mesh: SurfaceMesh,
}

#[derive(Serialize)]
struct ContainerVolume {
    id: usize,
    source: String,
    surfaces: usize,
    triangles: usize,
}

#[derive(Serialize)]
struct Container<'a> {
    backend: &'a str,
    merged: bool,
    volumes: Vec<ContainerVolume>,
}

pub struct MockConverter {
    solids: Vec<MockSolid>,
    merged: bool,
    export_failure: Option<String>,
    calls: CallLog,
}

impl MockConverter {
    pub fn new() -> Self {
        Self {
            solids: Vec::new(),
            merged: false,
            export_failure: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make every export fail with `message`.
    pub fn failing_export(mut self, message: &str) -> Self {
        self.export_failure = Some(message.to_string());
        self
    }

    pub fn call_log(&self) -> CallLog {
        Arc::clone(&self.calls)
    }

    fn record(&self, call: &str) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.to_string());
        }
    }

    /// Whether face `face` of volume `volume` (0-based) is written, given merge state.
    fn emits_face(&self, volume: usize, face: usize) -> bool {
        !(self.merged && volume > 0 && face == FACE_X_MIN)
    }
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionBackend for MockConverter {
    fn import_solids(&mut self, files: &[PathBuf]) -> Result<ImportSummary, ConversionError> {
        self.record("import");
        if files.is_empty() {
            return Err(ConversionError::NothingImported);
        }
        for (i, file) in files.iter().enumerate() {
            if !file.exists() {
                return Err(ConversionError::MissingSource { path: file.clone() });
            }
            let x = i as f32;
            self.solids.push(MockSolid {
                source: file.clone(),
                mesh: box_mesh([x, 0.0, 0.0], [x + 1.0, 1.0, 1.0]),
            });
        }
        info!(solids = self.solids.len(), "mock import");
        Ok(ImportSummary {
            files: files.len(),
            solids: Some(self.solids.len()),
        })
    }

    fn merge(&mut self) -> Result<MergeSummary, ConversionError> {
        self.record("merge");
        if self.solids.is_empty() {
            return Err(ConversionError::NothingImported);
        }
        self.merged = true;
        Ok(MergeSummary {
            solids: self.solids.len(),
            shared_faces: Some(self.solids.len() - 1),
        })
    }

    fn export_h5m(
        &mut self,
        backend: MeshBackend,
        destination: &Path,
    ) -> Result<MeshExport, ConversionError> {
        self.record(&format!("export:{}", backend));
        if self.solids.is_empty() {
            return Err(ConversionError::NothingImported);
        }
        if backend != MeshBackend::Stl {
            return Err(ConversionError::UnsupportedBackend { backend });
        }
        if let Some(message) = &self.export_failure {
            return Err(ConversionError::BackendFailed {
                detail: message.clone(),
            });
        }

        let dir = destination_dir(destination);
        let mut volumes = Vec::with_capacity(self.solids.len());
        let mut surfaces = 0;

        for (v, solid) in self.solids.iter().enumerate() {
            let mut written = 0;
            let mut triangles = 0;
            for (f, range) in solid.mesh.face_ranges.iter().enumerate() {
                if !self.emits_face(v, f) {
                    continue;
                }
                let face = solid.mesh.face_submesh(range);
                let path = dir.join(format!("vol{}_face{}.stl", v + 1, range.face));
                write_ascii_stl(&path, &face)?;
                written += 1;
                triangles += face.triangle_count();
            }
            debug!(volume = v + 1, faces = written, "volume tessellated");
            surfaces += written;
            volumes.push(ContainerVolume {
                id: v + 1,
                source: solid.source.display().to_string(),
                surfaces: written,
                triangles,
            });
        }

        let container = Container {
            backend: backend.as_str(),
            merged: self.merged,
            volumes,
        };
        let payload =
            serde_json::to_vec_pretty(&container).map_err(|e| ConversionError::BackendFailed {
                detail: e.to_string(),
            })?;
        write_stamped(destination, &payload).map_err(|source| ConversionError::Io {
            path: destination.to_path_buf(),
            source,
        })?;

        Ok(MeshExport {
            path: destination.to_path_buf(),
            backend,
            merged: self.merged,
            volumes: Some(self.solids.len()),
            surfaces: Some(surfaces),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources(dir: &Path, n: usize) -> Vec<PathBuf> {
        (0..n)
            .map(|i| {
                let p = dir.join(format!("part{i}.step"));
                std::fs::write(&p, "ISO-10303-21;").unwrap();
                p
            })
            .collect()
    }

    #[test]
    fn merge_before_import_is_rejected() {
        let mut conv = MockConverter::new();
        assert!(matches!(conv.merge(), Err(ConversionError::NothingImported)));
    }

    #[test]
    fn missing_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut conv = MockConverter::new();
        let err = conv
            .import_solids(&[dir.path().join("absent.step")])
            .unwrap_err();
        assert!(matches!(err, ConversionError::MissingSource { .. }));
    }

    #[test]
    fn merge_collapses_shared_faces() {
        let dir = tempfile::tempdir().unwrap();
        let files = sources(dir.path(), 3);

        let mut plain = MockConverter::new();
        plain.import_solids(&files).unwrap();
        let a = plain
            .export_h5m(MeshBackend::Stl, &dir.path().join("a.h5m"))
            .unwrap();

        let mut merged = MockConverter::new();
        merged.import_solids(&files).unwrap();
        let summary = merged.merge().unwrap();
        let b = merged
            .export_h5m(MeshBackend::Stl, &dir.path().join("b.h5m"))
            .unwrap();

        assert_eq!(summary.shared_faces, Some(2));
        assert_eq!(a.surfaces, Some(18));
        assert_eq!(b.surfaces, Some(16));
        assert!(b.merged && !a.merged);
    }

    #[test]
    fn non_stl_backend_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let mut conv = MockConverter::new();
        conv.import_solids(&sources(dir.path(), 1)).unwrap();
        let err = conv
            .export_h5m(MeshBackend::Gmsh, &dir.path().join("out.h5m"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::UnsupportedBackend { .. }));
    }

    #[test]
    fn call_log_records_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut conv = MockConverter::new();
        let log = conv.call_log();
        conv.import_solids(&sources(dir.path(), 2)).unwrap();
        conv.merge().unwrap();
        conv.export_h5m(MeshBackend::Stl, &dir.path().join("out.h5m"))
            .unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["import", "merge", "export:stl"]);
    }
}
