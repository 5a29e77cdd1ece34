//! Verification oracles: pure functions returning pass/fail verdicts.
//!
//! Each oracle returns an `OracleVerdict` with diagnostic detail, not panics.
//! The harnesses turn failing verdicts into errors through [`crate::assertions`].

use std::path::{Path, PathBuf};

use engine_bridge::{MeshExport, SurfaceMesh};
use serde::Serialize;
use transport_types::{Expectation, ExpectedResults, Measurement, RunMode, StatepointSummary};

/// Extension the engine's binary statepoint must carry.
pub const STATEPOINT_EXTENSION: &str = ".h5";

/// The result of a single oracle check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OracleVerdict {
    pub oracle_name: String,
    pub passed: bool,
    pub detail: String,
    pub value: Option<f64>,
}

impl OracleVerdict {
    fn pass(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: None,
        }
    }

    fn pass_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: true,
            detail,
            value: Some(value),
        }
    }

    fn fail(name: &str, detail: String) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: None,
        }
    }

    fn fail_val(name: &str, detail: String, value: f64) -> Self {
        Self {
            oracle_name: name.to_string(),
            passed: false,
            detail,
            value: Some(value),
        }
    }
}

// ── Statepoint Oracles ──────────────────────────────────────────────────────

/// Exactly one statepoint must exist after a run.
pub fn check_statepoint_count(found: &[PathBuf]) -> OracleVerdict {
    let n = found.len();
    if n == 1 {
        OracleVerdict::pass_val(
            "statepoint_count",
            format!("one statepoint: {}", found[0].display()),
            1.0,
        )
    } else {
        OracleVerdict::fail_val(
            "statepoint_count",
            format!("0 or multiple statepoints (found {})", n),
            n as f64,
        )
    }
}

pub fn check_statepoint_extension(path: &Path) -> OracleVerdict {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    if name.ends_with(STATEPOINT_EXTENSION) {
        OracleVerdict::pass("statepoint_extension", format!("{} is h5", name))
    } else {
        OracleVerdict::fail(
            "statepoint_extension",
            format!("statepoint file is not h5: {}", name),
        )
    }
}

// ── Numeric Oracles ─────────────────────────────────────────────────────────

/// Accept iff `|mean - value| <= tolerance + std_dev`.
///
/// The run's own one-sigma uncertainty widens the caller's absolute band.
pub fn within_tolerance(actual: Measurement, expected: Expectation) -> bool {
    (actual.mean - expected.value).abs() <= expected.tolerance + actual.std_dev
}

/// Compare one reported quantity against its expectation.
///
/// A quantity the statepoint does not report fails.
pub fn check_quantity(
    name: &str,
    actual: Option<Measurement>,
    expected: Expectation,
) -> OracleVerdict {
    let oracle = format!("quantity:{}", name);
    let Some(actual) = actual else {
        return OracleVerdict::fail(&oracle, format!("{} not reported by the statepoint", name));
    };
    let deviation = (actual.mean - expected.value).abs();
    let band = expected.tolerance + actual.std_dev;
    let detail = format!(
        "{} = {:.5} +/- {:.5}, expected {:.5} (|diff| {:.5}, allowed {:.5})",
        name, actual.mean, actual.std_dev, expected.value, deviation, band,
    );
    if within_tolerance(actual, expected) {
        OracleVerdict::pass_val(&oracle, detail, actual.mean)
    } else {
        OracleVerdict::fail_val(&oracle, detail, actual.mean)
    }
}

/// Check every expected quantity, in name order.
///
/// A name the statepoint reports is compared against that estimate; any other
/// name is compared against combined keff. Returns no verdicts when nothing
/// is expected or the run was not an eigenvalue calculation.
pub fn check_expected_results(
    summary: &StatepointSummary,
    expected: &ExpectedResults,
) -> Vec<OracleVerdict> {
    if expected.is_empty() || summary.run_mode != RunMode::Eigenvalue {
        return Vec::new();
    }
    expected
        .iter()
        .map(|(name, exp)| {
            let actual = summary.get(name).or_else(|| summary.keff());
            check_quantity(name, actual, *exp)
        })
        .collect()
}

// ── Mesh Container Oracles ──────────────────────────────────────────────────

pub fn check_mesh_exists(path: &Path) -> OracleVerdict {
    if path.is_file() {
        OracleVerdict::pass("mesh_exists", format!("{} exists", path.display()))
    } else {
        OracleVerdict::fail("mesh_exists", format!("mesh file {} does not exist", path.display()))
    }
}

/// Record the validator's answer for `path`.
pub fn check_mesh_valid(path: &Path, valid: bool) -> OracleVerdict {
    if valid {
        OracleVerdict::pass("mesh_valid", format!("{} is a valid mesh container", path.display()))
    } else {
        OracleVerdict::fail("mesh_valid", format!("mesh file {} is not valid", path.display()))
    }
}

/// A requested merge must be reflected in the export.
pub fn check_merge_honored(requested: bool, export: &MeshExport) -> OracleVerdict {
    if !requested || export.merged {
        OracleVerdict::pass(
            "merge_honored",
            format!("merge requested={}, exported merged={}", requested, export.merged),
        )
    } else {
        OracleVerdict::fail(
            "merge_honored",
            format!("merge was requested but {} was exported unmerged", export.path.display()),
        )
    }
}

// ── Face Mesh Oracles ───────────────────────────────────────────────────────

fn triangle_corners(mesh: &SurfaceMesh, tri: &[u32]) -> Option<[[f32; 3]; 3]> {
    let mut out = [[0.0f32; 3]; 3];
    for (k, &idx) in tri.iter().take(3).enumerate() {
        let i = idx as usize * 3;
        let p = mesh.vertices.get(i..i + 3)?;
        out[k] = [p[0], p[1], p[2]];
    }
    Some(out)
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn check_no_degenerate_triangles(mesh: &SurfaceMesh) -> OracleVerdict {
    let total = mesh.triangle_count();
    let degenerate = mesh
        .indices
        .chunks_exact(3)
        .filter_map(|tri| triangle_corners(mesh, tri))
        .filter(|[a, b, c]| {
            let n = cross(sub(*b, *a), sub(*c, *a));
            ((n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt() / 2.0) < 1e-12
        })
        .count();

    if degenerate == 0 {
        OracleVerdict::pass(
            "no_degenerate_triangles",
            format!("all {} triangles have non-zero area", total),
        )
    } else {
        OracleVerdict::fail(
            "no_degenerate_triangles",
            format!("{} of {} triangles are degenerate", degenerate, total),
        )
    }
}

/// Winding must agree with the stored vertex normals.
pub fn check_consistent_normals(mesh: &SurfaceMesh) -> OracleVerdict {
    let total = mesh.triangle_count();
    let mut inconsistent = 0usize;

    for tri in mesh.indices.chunks_exact(3) {
        let Some([a, b, c]) = triangle_corners(mesh, tri) else {
            continue;
        };
        let g = cross(sub(b, a), sub(c, a));

        let mut s = [0.0f32; 3];
        let mut complete = true;
        for &idx in tri {
            let i = idx as usize * 3;
            match mesh.normals.get(i..i + 3) {
                Some(n) => {
                    s[0] += n[0];
                    s[1] += n[1];
                    s[2] += n[2];
                }
                None => complete = false,
            }
        }
        if complete && g[0] * s[0] + g[1] * s[1] + g[2] * s[2] < 0.0 {
            inconsistent += 1;
        }
    }

    if inconsistent == 0 {
        OracleVerdict::pass(
            "consistent_normals",
            format!("all {} triangles have consistent winding", total),
        )
    } else {
        OracleVerdict::fail(
            "consistent_normals",
            format!("{} of {} triangles have reversed normals", inconsistent, total),
        )
    }
}

pub fn check_valid_indices(mesh: &SurfaceMesh) -> OracleVerdict {
    let vertex_count = mesh.vertex_count();
    let bad: Vec<(usize, u32)> = mesh
        .indices
        .iter()
        .enumerate()
        .filter(|(_, &idx)| idx as usize >= vertex_count)
        .map(|(i, &idx)| (i, idx))
        .collect();

    if bad.is_empty() {
        OracleVerdict::pass("valid_indices", format!("all indices < {}", vertex_count))
    } else {
        OracleVerdict::fail(
            "valid_indices",
            format!(
                "{} out-of-bounds indices (vertex_count={}): {:?}",
                bad.len(),
                vertex_count,
                &bad[..bad.len().min(5)]
            ),
        )
    }
}

// ── Composite ───────────────────────────────────────────────────────────────

/// The exported surface count, when reported, must match the `vol*_face*`
/// intermediates found beside the container.
pub fn check_face_intermediates(found: usize, export: &MeshExport) -> OracleVerdict {
    match export.surfaces {
        Some(expected) if expected != found => OracleVerdict::fail_val(
            "face_intermediates",
            format!(
                "export reported {} surfaces but {} face files were written",
                expected, found
            ),
            found as f64,
        ),
        Some(_) => OracleVerdict::pass_val(
            "face_intermediates",
            format!("{} face files written", found),
            found as f64,
        ),
        None => OracleVerdict::pass_val(
            "face_intermediates",
            format!("{} face files written; backend reported no surface count", found),
            found as f64,
        ),
    }
}

/// Run the per-face oracles on one tessellated face.
pub fn run_face_checks(mesh: &SurfaceMesh) -> Vec<OracleVerdict> {
    vec![
        check_consistent_normals(mesh),
        check_no_degenerate_triangles(mesh),
        check_valid_indices(mesh),
    ]
}
