//! Seams between the harness and its heavy external collaborators.
//!
//! The transport engine, the CAD-to-mesh converter and the mesh validator are
//! reached only through the traits in [`traits`]. Each has a deterministic
//! mock for tests and a process-backed implementation for real runs.

pub mod hdf5;
pub mod mock_converter;
pub mod mock_engine;
pub mod process_engine;
pub mod scripted_converter;
pub mod stl;
pub mod tessellation;
pub mod traits;
pub mod types;

pub use hdf5::Hdf5SignatureValidator;
pub use mock_converter::{CallLog, MockConverter};
pub use mock_engine::MockEngine;
pub use process_engine::ProcessEngine;
pub use scripted_converter::ScriptedConverter;
pub use traits::*;
pub use types::*;
