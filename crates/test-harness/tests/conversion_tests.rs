//! Conversion harness scenarios against MockConverter.

use std::fs;
use std::path::{Path, PathBuf};

use engine_bridge::{
    ConversionBackend, ConversionError, Hdf5SignatureValidator, MeshBackend, MeshValidator,
    MockConverter,
};
use test_harness::workspace::{FilePattern, Workspace};
use test_harness::{discover_solid_files, ConversionHarness, HarnessError, Stage};

fn step_files(dir: &Path, n: usize) -> Vec<PathBuf> {
    (0..n)
        .map(|i| {
            let p = dir.join(format!("part{i}.step"));
            fs::write(&p, "ISO-10303-21;").unwrap();
            p
        })
        .collect()
}

fn count(ws: &Workspace, glob: &str) -> usize {
    ws.find(&FilePattern::new(glob)).unwrap().len()
}

fn face_files_checked(report: &test_harness::RunReport) -> Option<f64> {
    report
        .verdicts
        .iter()
        .find(|v| v.oracle_name == "face_intermediates")
        .and_then(|v| v.value)
}

/// A validator that rejects everything.
struct RejectAll;

impl MeshValidator for RejectAll {
    fn validate(&self, _path: &Path) -> Result<bool, ConversionError> {
        Ok(false)
    }
}

/// A backend that claims success but ignores merge requests.
struct ForgetfulMerge(MockConverter);

impl ConversionBackend for ForgetfulMerge {
    fn import_solids(
        &mut self,
        files: &[PathBuf],
    ) -> Result<engine_bridge::ImportSummary, ConversionError> {
        self.0.import_solids(files)
    }

    fn merge(&mut self) -> Result<engine_bridge::MergeSummary, ConversionError> {
        Ok(engine_bridge::MergeSummary {
            solids: 0,
            shared_faces: None,
        })
    }

    fn export_h5m(
        &mut self,
        backend: MeshBackend,
        destination: &Path,
    ) -> Result<engine_bridge::MeshExport, ConversionError> {
        self.0.export_h5m(backend, destination)
    }
}

// ── Scenario A: export without merge ────────────────────────────────────

#[test]
fn scenario_a_export_without_merge() {
    let ws = Workspace::scoped().unwrap();
    let files = step_files(ws.path(), 2);
    let mut h = ConversionHarness::mock();
    let log = h.backend().call_log();

    let report = h.run(&ws, &files, false).unwrap();

    assert!(report.passed(), "{report}");
    assert_eq!(*log.lock().unwrap(), vec!["import", "export:stl"]);
    let export = h.last_export().unwrap();
    assert!(!export.merged);
    assert_eq!(export.path, ws.join("out_cqstl.h5m"));
    assert_eq!(export.surfaces, Some(12));
    assert_eq!(face_files_checked(&report), Some(12.0));
    assert_eq!(report.verdicts.len(), 2 + 1 + 12 * 3);
}

// ── Scenario B: export with merge ───────────────────────────────────────

#[test]
fn scenario_b_export_with_merge() {
    let ws = Workspace::scoped().unwrap();
    let files = step_files(ws.path(), 2);
    let mut h = ConversionHarness::mock();
    let log = h.backend().call_log();

    let report = h.run(&ws, &files, true).unwrap();

    assert!(report.passed(), "{report}");
    assert_eq!(*log.lock().unwrap(), vec!["import", "merge", "export:stl"]);
    let export = h.last_export().unwrap();
    assert!(export.merged);
    assert_eq!(export.surfaces, Some(11));
    assert_eq!(face_files_checked(&report), Some(11.0));
    assert!(report.steps.iter().any(|s| s.name == "merge"));
}

#[test]
fn second_run_on_one_harness_is_rejected() {
    let ws = Workspace::scoped().unwrap();
    let files = step_files(ws.path(), 2);
    let mut h = ConversionHarness::mock();
    h.run(&ws, &files, false).unwrap();

    let mesh = ws.join("out_cqstl.h5m");
    fs::write(&mesh, "left by someone else").unwrap();
    let err = h.run(&ws, &files, false).unwrap_err();
    match err {
        HarnessError::OutOfOrder { operation, .. } => assert_eq!(operation, "run"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(mesh.exists(), "a rejected run does not clean up");
}

#[test]
fn both_scenarios_share_one_directory() {
    let ws = Workspace::scoped().unwrap();
    let files = step_files(ws.path(), 3);

    ConversionHarness::mock().run(&ws, &files, false).unwrap();
    ConversionHarness::mock().run(&ws, &files, true).unwrap();

    assert_eq!(count(&ws, "*.h5m"), 0);
    assert_eq!(count(&ws, "vol*_face*"), 0);
    assert_eq!(count(&ws, "*.step"), 3, "sources are never cleaned");
}

// ── Stage by stage ──────────────────────────────────────────────────────

#[test]
fn stages_leave_intermediates_until_cleanup() {
    let ws = Workspace::scoped().unwrap();
    let files = step_files(ws.path(), 1);
    let mut h = ConversionHarness::mock();

    h.import_solids(&files).unwrap();
    assert_eq!(h.merge(false).unwrap(), None);
    assert_eq!(h.stage(), Stage::Imported);
    let dest = h.mesh_path(&ws);
    h.export_to_mesh(MeshBackend::Stl, &dest).unwrap();
    assert_eq!(h.stage(), Stage::Exported);

    assert!(dest.is_file());
    assert!(h.validate(&dest).unwrap().passed);
    assert_eq!(count(&ws, "vol1_face*"), 6);

    let removed = h.cleanup(&ws).unwrap();
    assert_eq!(removed.len(), 7);
    assert!(!dest.exists());
}

#[test]
fn degenerate_face_file_fails_mesh_checks() {
    let ws = Workspace::scoped().unwrap();
    let files = step_files(ws.path(), 1);
    let mut h = ConversionHarness::mock();
    h.import_solids(&files).unwrap();
    let dest = h.mesh_path(&ws);
    h.export_to_mesh(MeshBackend::Stl, &dest).unwrap();
    assert!(h.mesh_checks(&ws).unwrap().iter().all(|v| v.passed));

    let collinear = concat!(
        "solid vol1_face1\n",
        "  facet normal 0 0 1\n",
        "    outer loop\n",
        "      vertex 0 0 0\n",
        "      vertex 1 0 0\n",
        "      vertex 2 0 0\n",
        "    endloop\n",
        "  endfacet\n",
        "endsolid vol1_face1\n",
    );
    fs::write(ws.join("vol1_face1.stl"), collinear).unwrap();
    let failed: Vec<_> = h
        .mesh_checks(&ws)
        .unwrap()
        .into_iter()
        .filter(|v| !v.passed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].oracle_name, "no_degenerate_triangles");
    assert!(failed[0].detail.starts_with("vol1_face1.stl: "), "{}", failed[0].detail);
}

#[test]
fn missing_face_file_fails_mesh_checks() {
    let ws = Workspace::scoped().unwrap();
    let files = step_files(ws.path(), 2);
    let mut h = ConversionHarness::mock();
    h.import_solids(&files).unwrap();
    h.merge(true).unwrap();
    let dest = h.mesh_path(&ws);
    h.export_to_mesh(MeshBackend::Stl, &dest).unwrap();
    fs::remove_file(ws.join("vol2_face2.stl")).unwrap();

    let verdicts = h.mesh_checks(&ws).unwrap();
    let count_check = &verdicts[0];
    assert_eq!(count_check.oracle_name, "face_intermediates");
    assert!(!count_check.passed);
    assert!(count_check.detail.contains("11 surfaces but 10"), "{}", count_check.detail);
}

#[test]
fn merge_before_import_is_out_of_order() {
    let mut h = ConversionHarness::mock();
    let err = h.merge(true).unwrap_err();
    assert!(matches!(err, HarnessError::OutOfOrder { .. }), "{err}");
}

#[test]
fn export_before_import_is_out_of_order() {
    let ws = Workspace::scoped().unwrap();
    let mut h = ConversionHarness::mock();
    let dest = h.mesh_path(&ws);
    let err = h.export_to_mesh(MeshBackend::Stl, &dest).unwrap_err();
    assert!(matches!(err, HarnessError::OutOfOrder { .. }), "{err}");
    assert!(!dest.exists());
}

#[test]
fn merge_after_export_is_out_of_order() {
    let ws = Workspace::scoped().unwrap();
    let files = step_files(ws.path(), 2);
    let mut h = ConversionHarness::mock();
    h.import_solids(&files).unwrap();
    let dest = h.mesh_path(&ws);
    h.export_to_mesh(MeshBackend::Stl, &dest).unwrap();
    assert!(matches!(h.merge(true), Err(HarnessError::OutOfOrder { .. })));
}

#[test]
fn ignored_merge_request_is_caught() {
    let ws = Workspace::scoped().unwrap();
    let files = step_files(ws.path(), 2);
    let backend = ForgetfulMerge(MockConverter::new());
    let mut h = ConversionHarness::new(backend, Hdf5SignatureValidator);
    let err = h.run(&ws, &files, true).unwrap_err();
    assert!(err.to_string().contains("merge_honored"), "{err}");
    assert_eq!(count(&ws, "*.h5m"), 0, "cleanup still ran");
}

// ── Failures ────────────────────────────────────────────────────────────

#[test]
fn invalid_mesh_fails_and_cleans_up() {
    let ws = Workspace::scoped().unwrap();
    let files = step_files(ws.path(), 1);
    let mut h = ConversionHarness::new(MockConverter::new(), RejectAll);
    let err = h.run(&ws, &files, false).unwrap_err();
    match err {
        HarnessError::AssertionFailed { detail } => {
            assert!(detail.contains("is not valid"), "{detail}")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(count(&ws, "vol*_face*"), 0);
}

#[test]
fn backend_failure_propagates() {
    let ws = Workspace::scoped().unwrap();
    let files = step_files(ws.path(), 1);
    let backend = MockConverter::new().failing_export("tessellation failed");
    let mut h = ConversionHarness::new(backend, Hdf5SignatureValidator);
    let err = h.run(&ws, &files, false).unwrap_err();
    assert!(
        matches!(err, HarnessError::Conversion(ConversionError::BackendFailed { .. })),
        "{err}"
    );
}

#[test]
fn missing_source_propagates() {
    let ws = Workspace::scoped().unwrap();
    let mut h = ConversionHarness::mock();
    let err = h.run(&ws, &[ws.join("absent.step")], false).unwrap_err();
    assert!(
        matches!(err, HarnessError::Conversion(ConversionError::MissingSource { .. })),
        "{err}"
    );
}

#[test]
fn plain_file_is_not_a_valid_mesh() {
    let ws = Workspace::scoped().unwrap();
    let path = ws.join("out_cqstl.h5m");
    fs::write(&path, "not hdf5").unwrap();
    let h = ConversionHarness::mock();
    assert!(!h.validate(&path).unwrap().passed);
}

#[test]
fn cleanup_on_empty_directory_succeeds_twice() {
    let ws = Workspace::scoped().unwrap();
    let h = ConversionHarness::mock();
    assert!(h.cleanup(&ws).unwrap().is_empty());
    assert!(h.cleanup(&ws).unwrap().is_empty());
}

// ── Source discovery ────────────────────────────────────────────────────

#[test]
fn discovers_step_files_sorted() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.stp", "a.step", "c.STEP", "notes.txt", "mesh.h5m"] {
        fs::write(dir.path().join(name), "").unwrap();
    }
    fs::create_dir(dir.path().join("sub.step")).unwrap();
    let found: Vec<String> = discover_solid_files(dir.path())
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(found, vec!["a.step", "b.stp", "c.STEP"]);
}
