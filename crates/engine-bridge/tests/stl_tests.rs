//! Tests for STL writing and reading.

use engine_bridge::stl::{export_ascii_stl, read_stl, write_ascii_stl};
use engine_bridge::tessellation::box_mesh;
use engine_bridge::{FaceRange, SurfaceMesh};

fn make_triangle_mesh() -> SurfaceMesh {
    SurfaceMesh {
        vertices: vec![
            0.0, 0.0, 0.0, // v0
            1.0, 0.0, 0.0, // v1
            0.0, 1.0, 0.0, // v2
        ],
        normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
        indices: vec![0, 1, 2],
        face_ranges: vec![FaceRange {
            face: 1,
            start_index: 0,
            end_index: 3,
        }],
    }
}

#[test]
fn ascii_stl_has_correct_keywords() {
    let stl = export_ascii_stl(&make_triangle_mesh(), "test_solid").unwrap();
    assert!(stl.starts_with("solid test_solid\n"));
    assert!(stl.ends_with("endsolid test_solid\n"));
    for keyword in ["facet normal", "outer loop", "vertex", "endloop", "endfacet"] {
        assert!(stl.contains(keyword), "missing {keyword}");
    }
}

#[test]
fn empty_mesh_returns_error() {
    let mesh = SurfaceMesh {
        vertices: vec![],
        normals: vec![],
        indices: vec![],
        face_ranges: vec![],
    };
    assert!(export_ascii_stl(&mesh, "empty").is_err());
}

#[test]
fn invalid_index_returns_error() {
    let mesh = SurfaceMesh {
        vertices: vec![0.0, 0.0, 0.0],
        normals: vec![0.0, 0.0, 1.0],
        indices: vec![0, 1, 2],
        face_ranges: vec![],
    };
    assert!(export_ascii_stl(&mesh, "bad").is_err());
}

#[test]
fn written_file_is_named_after_stem() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vol1_face3.stl");
    write_ascii_stl(&path, &make_triangle_mesh()).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("solid vol1_face3\n"));
}

/// One binary STL record per triangle, all with a +Z normal.
fn binary_stl(triangles: &[[[f32; 3]; 3]]) -> Vec<u8> {
    let mut buf = b"solid but actually binary".to_vec();
    buf.resize(80, 0);
    buf.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
    for tri in triangles {
        for c in [0.0f32, 0.0, 1.0] {
            buf.extend_from_slice(&c.to_le_bytes());
        }
        for p in tri {
            for c in p {
                buf.extend_from_slice(&c.to_le_bytes());
            }
        }
        buf.extend_from_slice(&0u16.to_le_bytes());
    }
    buf
}

#[test]
fn written_box_face_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let mesh = box_mesh([0.0; 3], [1.0; 3]);
    let face = mesh.face_submesh(&mesh.face_ranges[3]);
    let path = dir.path().join("vol2_face3.stl");
    write_ascii_stl(&path, &face).unwrap();

    let read = read_stl(&path).unwrap();
    assert_eq!(read.triangle_count(), 2);
    assert_eq!(read.vertex_count(), 6);
    assert_eq!(read.face_ranges[0].face, 3);
    assert_eq!(read.face_ranges[0].end_index, 6);
    assert_eq!(read.normals.len(), read.vertices.len());
}

#[test]
fn binary_file_starting_with_solid_is_read_as_binary() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vol1_face0.stl");
    let tri = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
    std::fs::write(&path, binary_stl(&[tri, tri])).unwrap();

    let read = read_stl(&path).unwrap();
    assert_eq!(read.triangle_count(), 2);
    assert_eq!(&read.vertices[3..6], &[1.0f32, 0.0, 0.0]);
    assert_eq!(&read.normals[..3], &[0.0f32, 0.0, 1.0]);
}

#[test]
fn truncated_binary_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vol1_face0.stl");
    let mut bytes = binary_stl(&[[[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]]);
    bytes[0] = b'x';
    bytes.truncate(100);
    std::fs::write(&path, bytes).unwrap();
    let err = read_stl(&path).unwrap_err();
    assert!(err.to_string().contains("declares 1 triangles"), "{err}");
}

#[test]
fn facet_with_two_vertices_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vol1_face1.stl");
    let text = concat!(
        "solid vol1_face1\n",
        "  facet normal 0 0 1\n",
        "    outer loop\n",
        "      vertex 0 0 0\n",
        "      vertex 1 0 0\n",
        "    endloop\n",
        "  endfacet\n",
        "endsolid vol1_face1\n",
    );
    std::fs::write(&path, text).unwrap();
    let err = read_stl(&path).unwrap_err();
    assert!(err.to_string().contains("facet has 2 vertices"), "{err}");
}

#[test]
fn solid_without_facets_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vol1_face1.stl");
    std::fs::write(&path, "solid empty\nendsolid empty\n").unwrap();
    assert!(read_stl(&path).unwrap_err().to_string().contains("no facets"));
}
