//! STL files for per-face surface meshes.
//!
//! The mock backend writes ASCII STL; intermediates from the real pipeline
//! may be binary, so reading accepts both.

use std::fs;
use std::path::Path;

use crate::types::{ConversionError, FaceRange, SurfaceMesh};

/// Binary STL: 80-byte header plus a little-endian u32 triangle count.
const BINARY_HEADER_LEN: usize = 84;
/// Normal, three vertices and a u16 attribute.
const BINARY_RECORD_LEN: usize = 50;

fn check_mesh(mesh: &SurfaceMesh) -> Result<(), ConversionError> {
    if mesh.triangle_count() == 0 {
        return Err(ConversionError::Stl {
            reason: "mesh has no triangles".to_string(),
        });
    }
    let vertex_count = mesh.vertex_count();
    if let Some(&idx) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(ConversionError::Stl {
            reason: format!(
                "index {} out of range (vertex count = {})",
                idx, vertex_count
            ),
        });
    }
    Ok(())
}

fn vertex(mesh: &SurfaceMesh, idx: u32) -> [f32; 3] {
    let i = idx as usize * 3;
    [mesh.vertices[i], mesh.vertices[i + 1], mesh.vertices[i + 2]]
}

/// Unit facet normal from the triangle winding; +Z for degenerate triangles.
fn facet_normal(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> [f32; 3] {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 1e-12 {
        [n[0] / len, n[1] / len, n[2] / len]
    } else {
        [0.0, 0.0, 1.0]
    }
}

/// Export a mesh as an ASCII STL string.
pub fn export_ascii_stl(mesh: &SurfaceMesh, name: &str) -> Result<String, ConversionError> {
    check_mesh(mesh)?;
    let mut out = String::with_capacity(mesh.triangle_count() * 300);
    out.push_str(&format!("solid {}\n", name));

    for tri in mesh.indices.chunks_exact(3) {
        let corners = [vertex(mesh, tri[0]), vertex(mesh, tri[1]), vertex(mesh, tri[2])];
        let n = facet_normal(corners[0], corners[1], corners[2]);
        out.push_str(&format!("  facet normal {} {} {}\n", n[0], n[1], n[2]));
        out.push_str("    outer loop\n");
        for p in corners {
            out.push_str(&format!("      vertex {} {} {}\n", p[0], p[1], p[2]));
        }
        out.push_str("    endloop\n");
        out.push_str("  endfacet\n");
    }

    out.push_str(&format!("endsolid {}\n", name));
    Ok(out)
}

/// Write an ASCII STL file named after its file stem.
pub fn write_ascii_stl(path: &Path, mesh: &SurfaceMesh) -> Result<(), ConversionError> {
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let text = export_ascii_stl(mesh, &name)?;
    fs::write(path, text).map_err(|source| ConversionError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Facet normal and its three corners.
type Facet = ([f32; 3], [[f32; 3]; 3]);

/// Read an ASCII or binary STL file as a single-face mesh.
///
/// The face index comes from a `_face{n}` suffix on the file stem, 0 when
/// absent. Every facet gets its own three vertices carrying the facet normal.
pub fn read_stl(path: &Path) -> Result<SurfaceMesh, ConversionError> {
    let bytes = fs::read(path).map_err(|source| ConversionError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = if is_binary_stl(&bytes) {
        parse_binary(&bytes)
    } else {
        parse_ascii(&bytes)
    };
    let facets = parsed.map_err(|reason| ConversionError::Stl {
        reason: format!("{}: {}", path.display(), reason),
    })?;
    if facets.is_empty() {
        return Err(ConversionError::Stl {
            reason: format!("{}: no facets", path.display()),
        });
    }
    Ok(mesh_from_facets(&facets, face_from_stem(path)))
}

fn is_binary_stl(bytes: &[u8]) -> bool {
    if bytes.len() < BINARY_HEADER_LEN {
        return false;
    }
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    let sized = count
        .checked_mul(BINARY_RECORD_LEN)
        .and_then(|n| n.checked_add(BINARY_HEADER_LEN))
        == Some(bytes.len());
    // Binary exporters often start the header with "solid" too.
    sized || !bytes.starts_with(b"solid")
}

fn parse_binary(bytes: &[u8]) -> Result<Vec<Facet>, String> {
    let body = bytes
        .get(BINARY_HEADER_LEN..)
        .ok_or_else(|| "truncated header".to_string())?;
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    if body.len() != count * BINARY_RECORD_LEN {
        return Err(format!(
            "header declares {} triangles but {} bytes follow it",
            count,
            body.len()
        ));
    }
    let facets = body
        .chunks_exact(BINARY_RECORD_LEN)
        .map(|rec| {
            let f = |k: usize| {
                let i = k * 4;
                f32::from_le_bytes([rec[i], rec[i + 1], rec[i + 2], rec[i + 3]])
            };
            (
                [f(0), f(1), f(2)],
                [[f(3), f(4), f(5)], [f(6), f(7), f(8)], [f(9), f(10), f(11)]],
            )
        })
        .collect();
    Ok(facets)
}

fn parse_ascii(bytes: &[u8]) -> Result<Vec<Facet>, String> {
    let text = std::str::from_utf8(bytes).map_err(|e| format!("not UTF-8: {}", e))?;
    if !text.trim_start().starts_with("solid") {
        return Err("missing `solid` header".to_string());
    }

    let mut facets = Vec::new();
    let mut normal = None;
    let mut corners: Vec<[f32; 3]> = Vec::with_capacity(3);
    for (i, line) in text.lines().enumerate() {
        let line_no = i + 1;
        let mut words = line.split_whitespace();
        match words.next() {
            Some("facet") => {
                if words.next() != Some("normal") {
                    return Err(format!("line {}: expected `facet normal`", line_no));
                }
                normal = Some(parse_triple(words, line_no)?);
                corners.clear();
            }
            Some("vertex") => corners.push(parse_triple(words, line_no)?),
            Some("endfacet") => {
                let n = normal
                    .take()
                    .ok_or_else(|| format!("line {}: endfacet without facet", line_no))?;
                let tri: [[f32; 3]; 3] = corners.as_slice().try_into().map_err(|_| {
                    format!("line {}: facet has {} vertices", line_no, corners.len())
                })?;
                facets.push((n, tri));
                corners.clear();
            }
            _ => {}
        }
    }
    Ok(facets)
}

fn parse_triple<'a>(
    mut words: impl Iterator<Item = &'a str>,
    line_no: usize,
) -> Result<[f32; 3], String> {
    let mut out = [0.0f32; 3];
    for slot in out.iter_mut() {
        let word = words
            .next()
            .ok_or_else(|| format!("line {}: expected three numbers", line_no))?;
        *slot = word
            .parse()
            .map_err(|e| format!("line {}: bad number `{}`: {}", line_no, word, e))?;
    }
    Ok(out)
}

fn mesh_from_facets(facets: &[Facet], face: u32) -> SurfaceMesh {
    let mut vertices = Vec::with_capacity(facets.len() * 9);
    let mut normals = Vec::with_capacity(facets.len() * 9);
    for (normal, corners) in facets {
        for p in corners {
            vertices.extend_from_slice(p);
            normals.extend_from_slice(normal);
        }
    }
    let end = (facets.len() * 3) as u32;
    SurfaceMesh {
        vertices,
        normals,
        indices: (0..end).collect(),
        face_ranges: vec![FaceRange {
            face,
            start_index: 0,
            end_index: end,
        }],
    }
}

/// `vol2_face5` → 5.
fn face_from_stem(path: &Path) -> u32 {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.rsplit_once("_face"))
        .and_then(|(_, n)| n.parse().ok())
        .unwrap_or(0)
}
