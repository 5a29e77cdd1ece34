//! Error type shared by every harness flow.

use std::path::PathBuf;

use engine_bridge::{ConversionError, EngineError};
use transport_types::ModelError;

/// Unified error type for the harness.
///
/// `AssertionFailed` is the intended test signal; the collaborator variants
/// carry external failures through unchanged.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("assertion failed: {detail}")]
    AssertionFailed { detail: String },

    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("model error: {0}")]
    Model(#[from] ModelError),

    #[error("{operation} called out of order: {detail}")]
    OutOfOrder { operation: String, detail: String },

    #[error("no materials available for the synthetic geometry")]
    NoMaterials,

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
