use std::path::PathBuf;

use transport_types::{MaterialId, ModelError};

/// Errors while writing model input files.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("invalid model: {0}")]
    Model(#[from] ModelError),

    #[error("geometry fills unknown material id {}", id.0)]
    UnknownMaterial { id: MaterialId },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
