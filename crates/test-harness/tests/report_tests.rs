//! Tests for the report module.

use std::fs;

use engine_bridge::MockEngine;
use test_harness::workspace::Workspace;
use test_harness::{ConversionHarness, GeometrySource, HarnessKind, RunReport, SimulationHarness};
use transport_types::{ExpectedResults, KEFF};

#[test]
fn empty_report_text() {
    let report = RunReport::new(HarnessKind::Simulation, std::path::Path::new("/tmp/run"));
    let text = report.to_text();
    assert!(text.starts_with("=== Simulation Harness Report ==="));
    assert!(text.contains("Steps (0):"));
    assert!(text.contains("Cleanup: nothing to remove"));
    assert!(report.passed());
}

#[test]
fn simulation_report_lists_steps_and_verdicts() {
    let ws = Workspace::scoped().unwrap();
    let mut h = SimulationHarness::new(GeometrySource::SyntheticFallback, MockEngine::new())
        .with_expected(ExpectedResults::new().with(KEFF, 1.0, 0.01));
    let report = h.execute(&ws).unwrap();
    let text = report.to_string();

    assert!(text.contains("] run: exit code Some(0)"), "{text}");
    assert!(text.contains("Oracle Results (3 checks, 0 failed):"), "{text}");
    assert!(text.contains("[PASS] quantity:keff"), "{text}");
    assert!(text.contains("statepoint.20.h5"), "{text}");
}

#[test]
fn conversion_report_serializes_to_json() {
    let ws = Workspace::scoped().unwrap();
    let step = ws.join("part.step");
    fs::write(&step, "ISO-10303-21;").unwrap();
    let report = ConversionHarness::mock().run(&ws, &[step], true).unwrap();

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["harness"], "conversion");
    assert_eq!(json["run_id"].as_str().unwrap().len(), 36);
    assert!(json["verdicts"].as_array().unwrap().len() >= 2);
    let steps: Vec<&str> = json["steps"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name"].as_str().unwrap())
        .collect();
    assert_eq!(steps, vec!["import_solids", "merge", "export_to_mesh", "cleanup"]);
}
