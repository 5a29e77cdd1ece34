use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kind of transport calculation a run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunMode {
    Eigenvalue,
    FixedSource,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eigenvalue => "eigenvalue",
            Self::FixedSource => "fixed source",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eigenvalue" | "k-eigenvalue" => Ok(Self::Eigenvalue),
            "fixed source" | "fixed-source" | "fixed_source" => Ok(Self::FixedSource),
            other => Err(format!("unknown run mode `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Particle {
    Neutron,
    Photon,
}

impl Particle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutron => "neutron",
            Self::Photon => "photon",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpatialDistribution {
    Point([f64; 3]),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnergyDistribution {
    /// Discrete energies (eV) with matching probabilities.
    Discrete {
        energies: Vec<f64>,
        probabilities: Vec<f64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AngularDistribution {
    Isotropic,
}

/// An independent particle source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub particle: Particle,
    pub strength: f64,
    pub space: SpatialDistribution,
    pub energy: EnergyDistribution,
    pub angle: AngularDistribution,
}

impl Source {
    /// A single-energy isotropic neutron point source at the origin.
    pub fn monoenergetic_point(energy_ev: f64) -> Self {
        Self {
            particle: Particle::Neutron,
            strength: 1.0,
            space: SpatialDistribution::Point([0.0; 3]),
            energy: EnergyDistribution::Discrete {
                energies: vec![energy_ev],
                probabilities: vec![1.0],
            },
            angle: AngularDistribution::Isotropic,
        }
    }
}

/// Run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub run_mode: RunMode,
    pub batches: u32,
    pub inactive: u32,
    pub particles: u64,
    pub source: Source,
}
