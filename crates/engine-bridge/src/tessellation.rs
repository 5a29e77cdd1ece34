//! Synthetic tessellation of axis-aligned boxes for the mock converter.

use crate::types::{FaceRange, SurfaceMesh};

/// Face order of [`box_mesh`]: -X, +X, -Y, +Y, -Z, +Z.
pub const BOX_FACES: usize = 6;
pub const FACE_X_MIN: usize = 0;
pub const FACE_X_MAX: usize = 1;

/// Quads per face as corner indices, counter-clockwise seen from outside.
const QUADS: [[u32; 4]; BOX_FACES] = [
    [0, 4, 7, 3], // -X
    [1, 2, 6, 5], // +X
    [0, 1, 5, 4], // -Y
    [3, 7, 6, 2], // +Y
    [0, 3, 2, 1], // -Z
    [4, 5, 6, 7], // +Z
];

/// Tessellate an axis-aligned box into 12 outward-wound triangles.
///
/// The 8 corners are shared between faces; each face gets one range of two
/// triangles, with face ids 1..=6.
pub fn box_mesh(min: [f32; 3], max: [f32; 3]) -> SurfaceMesh {
    let corners: [[f32; 3]; 8] = [
        [min[0], min[1], min[2]],
        [max[0], min[1], min[2]],
        [max[0], max[1], min[2]],
        [min[0], max[1], min[2]],
        [min[0], min[1], max[2]],
        [max[0], min[1], max[2]],
        [max[0], max[1], max[2]],
        [min[0], max[1], max[2]],
    ];
    let center = [
        (min[0] + max[0]) / 2.0,
        (min[1] + max[1]) / 2.0,
        (min[2] + max[2]) / 2.0,
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut normals = Vec::with_capacity(24);
    for c in corners {
        vertices.extend_from_slice(&c);
        let d = [c[0] - center[0], c[1] - center[1], c[2] - center[2]];
        let len = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
        if len > 1e-12 {
            normals.extend_from_slice(&[d[0] / len, d[1] / len, d[2] / len]);
        } else {
            normals.extend_from_slice(&[0.0, 0.0, 1.0]);
        }
    }

    let mut indices = Vec::with_capacity(36);
    let mut face_ranges = Vec::with_capacity(BOX_FACES);
    for (i, q) in QUADS.iter().enumerate() {
        let start = indices.len() as u32;
        indices.extend_from_slice(&[q[0], q[1], q[2], q[0], q[2], q[3]]);
        face_ranges.push(FaceRange {
            face: i as u32 + 1,
            start_index: start,
            end_index: indices.len() as u32,
        });
    }

    SurfaceMesh {
        vertices,
        normals,
        indices,
        face_ranges,
    }
}
