//! Serialization of a model bundle into the engine's XML input files.
//!
//! Files are written in dependency order: materials first (the geometry refers
//! to their ids), then settings, then geometry.

pub mod errors;
pub mod export;
pub mod geometry;
pub mod materials;
pub mod settings;
pub mod xml;

pub use errors::ExportError;
pub use export::{export_model, ExportedModel, GEOMETRY_XML, MATERIALS_XML, SETTINGS_XML};
pub use materials::MaterialIndex;
pub use xml::XmlElement;
