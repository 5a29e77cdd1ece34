//! Validation harness for the CAD/DAGMC → transport pipeline.
//!
//! Two flows share only the filesystem, and both run inside an explicit
//! [`Workspace`]:
//!
//! - [`SimulationHarness`]: materials → geometry → settings → engine run →
//!   statepoint checks → cleanup
//! - [`ConversionHarness`]: import CAD solids → optional merge → h5m export →
//!   structural validation → cleanup
//!
//! # Key Components
//!
//! - [`oracle`]: Verification functions returning pass/fail verdicts
//! - [`assertions`]: Turn failing verdicts into harness errors
//! - [`report`]: Structured text/JSON run reports
//! - [`workspace`]: Scoped working directories and cleanup globs
//! - [`config`]: JSON-loadable harness configuration

pub mod assertions;
pub mod config;
pub mod conversion;
pub mod helpers;
pub mod model;
pub mod oracle;
pub mod report;
pub mod simulation;
pub mod workspace;

pub use config::HarnessConfig;
pub use conversion::{discover_solid_files, ConversionHarness, Stage};
pub use helpers::HarnessError;
pub use model::{GeometrySource, MaterialState};
pub use oracle::OracleVerdict;
pub use report::{HarnessKind, RunReport};
pub use simulation::SimulationHarness;
pub use workspace::{FilePattern, Workspace};
