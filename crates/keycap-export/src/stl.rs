//! Binary STL from a RenderMesh.

use geom_kernel::RenderMesh;

use crate::error::ExportError;

const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

/// Binary STL:
/// - 80-byte header (arbitrary text)
/// - u32 triangle count (little-endian)
/// - per triangle: 3×f32 normal + 3×(3×f32 vertex) + u16 attribute = 50 bytes
pub fn binary_stl(mesh: &RenderMesh, name: &str) -> Result<Vec<u8>, ExportError> {
    check_mesh(mesh)?;
    let tri_count = mesh.triangle_count();

    let mut buf = Vec::with_capacity(HEADER_LEN + 4 + tri_count * TRIANGLE_LEN);
    let header = format!("binary STL: {name}");
    let header_bytes = header.as_bytes();
    buf.extend_from_slice(&header_bytes[..header_bytes.len().min(HEADER_LEN)]);
    buf.resize(HEADER_LEN, 0u8);
    buf.extend_from_slice(&(tri_count as u32).to_le_bytes());

    for [a, b, c] in mesh.triangles() {
        let normal = facet_normal(a, b, c);
        for v in normal {
            buf.extend_from_slice(&v.to_le_bytes());
        }
        for p in [a, b, c] {
            for v in p {
                buf.extend_from_slice(&(v as f32).to_le_bytes());
            }
        }
        buf.extend_from_slice(&0u16.to_le_bytes());
    }
    Ok(buf)
}

/// Reject meshes with no triangles or with indices past the vertex list.
pub(crate) fn check_mesh(mesh: &RenderMesh) -> Result<(), ExportError> {
    if mesh.triangle_count() == 0 {
        return Err(ExportError::EmptyMesh {
            reason: "mesh has no triangles".to_string(),
        });
    }
    let vertex_count = mesh.vertex_count();
    if let Some(&idx) = mesh.indices.iter().find(|&&i| i as usize >= vertex_count) {
        return Err(ExportError::EmptyMesh {
            reason: format!("index {idx} out of range (vertex count = {vertex_count})"),
        });
    }
    Ok(())
}

fn facet_normal(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> [f32; 3] {
    let u = [b[0] - a[0], b[1] - a[1], b[2] - a[2]];
    let v = [c[0] - a[0], c[1] - a[1], c[2] - a[2]];
    let n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len > 1e-12 {
        [(n[0] / len) as f32, (n[1] / len) as f32, (n[2] / len) as f32]
    } else {
        [0.0, 0.0, 1.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> RenderMesh {
        RenderMesh {
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            indices: vec![0, 1, 2],
            face_ranges: Vec::new(),
        }
    }

    #[test]
    fn test_binary_layout() {
        let bytes = binary_stl(&triangle(), "tri").unwrap();
        assert_eq!(bytes.len(), 80 + 4 + 50);
        assert!(bytes.starts_with(b"binary STL: tri"));
        assert_eq!(u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]), 1);
        let nz = f32::from_le_bytes([bytes[92], bytes[93], bytes[94], bytes[95]]);
        assert_eq!(nz, 1.0);
    }

    #[test]
    fn test_long_name_is_truncated() {
        let bytes = binary_stl(&triangle(), &"k".repeat(200)).unwrap();
        assert_eq!(bytes.len(), 80 + 4 + 50);
    }

    #[test]
    fn test_empty_mesh_rejected() {
        let err = binary_stl(&RenderMesh::default(), "empty").unwrap_err();
        assert!(matches!(err, ExportError::EmptyMesh { .. }));
    }

    #[test]
    fn test_bad_index_rejected() {
        let mut mesh = triangle();
        mesh.indices[2] = 7;
        assert!(matches!(
            binary_stl(&mesh, "bad"),
            Err(ExportError::EmptyMesh { .. })
        ));
    }
}
