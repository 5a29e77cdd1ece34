use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors from the transport engine seam.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("model export failed: {0}")]
    Export(#[from] model_io::ExportError),

    #[error("failed to launch {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("engine run failed ({status}): {detail}")]
    RunFailed { status: String, detail: String },

    #[error("missing engine input: {}", path.display())]
    MissingInput { path: PathBuf },

    #[error("unreadable statepoint {}: {reason}", path.display())]
    Statepoint { path: PathBuf, reason: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from the CAD conversion seam.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("source solid not found: {}", path.display())]
    MissingSource { path: PathBuf },

    #[error("no solids imported")]
    NothingImported,

    #[error("backend `{backend}` is not supported")]
    UnsupportedBackend { backend: MeshBackend },

    #[error("conversion backend failed: {detail}")]
    BackendFailed { detail: String },

    #[error("STL error: {reason}")]
    Stl { reason: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What an engine run reports back besides its files.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stdout: String,
    pub exit_code: Option<i32>,
    pub elapsed: Duration,
}

/// Strategy used to turn CAD solids into the mesh container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshBackend {
    /// Per-face surface tessellation through STL intermediates.
    Stl,
    Stl2,
    Gmsh,
    Db,
}

impl MeshBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::Stl2 => "stl2",
            Self::Gmsh => "gmsh",
            Self::Db => "db",
        }
    }
}

impl fmt::Display for MeshBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeshBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stl" => Ok(Self::Stl),
            "stl2" => Ok(Self::Stl2),
            "gmsh" => Ok(Self::Gmsh),
            "db" => Ok(Self::Db),
            other => Err(format!("unknown mesh backend `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub files: usize,
    /// Number of solids found, when the backend can tell before export.
    pub solids: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergeSummary {
    pub solids: usize,
    /// Coincident faces collapsed by the merge, when known.
    pub shared_faces: Option<usize>,
}

/// Result of writing a mesh container.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshExport {
    pub path: PathBuf,
    pub backend: MeshBackend,
    pub merged: bool,
    pub volumes: Option<usize>,
    pub surfaces: Option<usize>,
}

/// Directory an export to `destination` writes into; `.` for a bare file name.
pub fn destination_dir(destination: &Path) -> &Path {
    destination
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Triangle surface mesh with per-face index ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceMesh {
    /// Flat array of vertex positions [x0, y0, z0, x1, y1, z1, ...].
    pub vertices: Vec<f32>,
    /// Flat array of vertex normals, same layout as `vertices`.
    pub normals: Vec<f32>,
    /// Triangle indices into the vertex array.
    pub indices: Vec<u32>,
    pub face_ranges: Vec<FaceRange>,
}

/// A contiguous range of `indices` belonging to one logical face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceRange {
    pub face: u32,
    /// Start index in the indices array (inclusive).
    pub start_index: u32,
    /// End index in the indices array (exclusive).
    pub end_index: u32,
}

impl SurfaceMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    /// The triangles of one face range, sharing this mesh's vertex arrays.
    pub fn face_submesh(&self, range: &FaceRange) -> SurfaceMesh {
        let start = range.start_index as usize;
        let end = (range.end_index as usize).min(self.indices.len());
        SurfaceMesh {
            vertices: self.vertices.clone(),
            normals: self.normals.clone(),
            indices: self.indices[start.min(end)..end].to_vec(),
            face_ranges: vec![FaceRange {
                face: range.face,
                start_index: 0,
                end_index: (end - start.min(end)) as u32,
            }],
        }
    }
}
