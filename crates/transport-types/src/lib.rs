pub mod geometry;
pub mod ids;
pub mod material;
pub mod results;
pub mod settings;

pub use geometry::*;
pub use ids::*;
pub use material::*;
pub use results::*;
pub use settings::*;

/// The model bundle handed to a transport engine for one run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ModelBundle {
    pub materials: Materials,
    pub geometry: Geometry,
    pub settings: Settings,
}

/// Errors raised while assembling model data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("duplicate material name: {name}")]
    DuplicateMaterial { name: String },

    #[error("material {name} has no constituents")]
    EmptyMaterial { name: String },

    #[error("no natural abundance data for element {symbol}")]
    UnknownElement { symbol: String },

    #[error("invalid density {value} {units} for material {name}")]
    InvalidDensity {
        name: String,
        value: f64,
        units: String,
    },
}
