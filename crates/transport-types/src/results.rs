use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::settings::RunMode;

/// Name under which the combined k-effective estimate is reported.
pub const KEFF: &str = "keff";

/// An expected value with an absolute tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Expectation {
    pub value: f64,
    pub tolerance: f64,
}

/// Expected scalar results keyed by quantity name.
///
/// An empty mapping means numeric validation is skipped.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExpectedResults {
    entries: BTreeMap<String, Expectation>,
}

impl ExpectedResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: f64, tolerance: f64) -> Self {
        self.insert(name, value, tolerance);
        self
    }

    pub fn insert(&mut self, name: &str, value: f64, tolerance: f64) {
        self.entries
            .insert(name.to_string(), Expectation { value, tolerance });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expectation)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// A statistical estimate: mean and one-sigma uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub mean: f64,
    pub std_dev: f64,
}

/// What the harness reads back from a run's output artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatepointSummary {
    pub run_mode: RunMode,
    pub batches: u32,
    pub quantities: BTreeMap<String, Measurement>,
}

impl StatepointSummary {
    pub fn get(&self, name: &str) -> Option<Measurement> {
        self.quantities.get(name).copied()
    }

    pub fn keff(&self) -> Option<Measurement> {
        self.get(KEFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expected_results_builder() {
        let exp = ExpectedResults::new().with(KEFF, 1.0, 0.05);
        assert_eq!(exp.len(), 1);
        let (name, e) = exp.iter().next().unwrap();
        assert_eq!(name, "keff");
        assert_eq!(e.value, 1.0);
        assert_eq!(e.tolerance, 0.05);
    }

    #[test]
    fn summary_serializes_to_json() {
        let mut quantities = BTreeMap::new();
        quantities.insert(
            KEFF.to_string(),
            Measurement {
                mean: 1.1,
                std_dev: 0.002,
            },
        );
        let summary = StatepointSummary {
            run_mode: RunMode::Eigenvalue,
            batches: 20,
            quantities,
        };
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"eigenvalue\""));
        let back: StatepointSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back.keff(), summary.keff());
    }
}
