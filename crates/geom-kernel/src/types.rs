use serde::{Deserialize, Serialize};

pub use keycap_types::{TopoKind, TopoSignature};

/// Opaque handle to a solid in the geometry kernel.
/// Valid only for the kernel instance that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KernelSolidHandle(pub(crate) u64);

impl KernelSolidHandle {
    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Transient kernel-internal entity identifier for faces, edges,
/// vertices and standalone sketch faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KernelId(pub u64);

/// Errors from kernel operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum KernelError {
    #[error("boolean operation failed: {reason}")]
    BooleanFailed { reason: String },

    #[error("loft failed: {reason}")]
    LoftFailed { reason: String },

    #[error("face construction failed: {reason}")]
    FaceFailed { reason: String },

    #[error("fillet failed: {reason}")]
    FilletFailed { reason: String },

    #[error("tessellation failed: {reason}")]
    TessellationFailed { reason: String },

    #[error("export failed: {reason}")]
    ExportFailed { reason: String },

    #[error("entity not found: {id:?}")]
    EntityNotFound { id: KernelId },

    #[error("operation not supported: {operation}")]
    NotSupported { operation: String },

    #[error("kernel error: {message}")]
    Other { message: String },
}

impl KernelError {
    pub(crate) fn missing_solid(handle: &KernelSolidHandle) -> Self {
        KernelError::EntityNotFound {
            id: KernelId(handle.id()),
        }
    }
}

/// Tessellated triangle mesh.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderMesh {
    /// Flat array of vertex positions [x0, y0, z0, x1, y1, z1, ...].
    pub vertices: Vec<f32>,
    /// Flat array of vertex normals, same layout as `vertices`.
    pub normals: Vec<f32>,
    /// Triangle indices into the vertex array.
    pub indices: Vec<u32>,
    /// Mapping from triangle ranges to logical faces.
    pub face_ranges: Vec<FaceRange>,
}

/// Maps a contiguous range of triangles to a logical face.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceRange {
    /// The KernelId of the face this range belongs to.
    pub face_id: KernelId,
    /// Start index in the indices array (inclusive).
    pub start_index: u32,
    /// End index in the indices array (exclusive).
    pub end_index: u32,
}

impl RenderMesh {
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / 3
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn position(&self, index: u32) -> [f64; 3] {
        let i = index as usize * 3;
        [
            self.vertices[i] as f64,
            self.vertices[i + 1] as f64,
            self.vertices[i + 2] as f64,
        ]
    }

    /// Triangles as position triples, in index order.
    pub fn triangles(&self) -> impl Iterator<Item = [[f64; 3]; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [self.position(t[0]), self.position(t[1]), self.position(t[2])])
    }

    /// Axis-aligned bounds `[min_x, min_y, min_z, max_x, max_y, max_z]`,
    /// or `None` for an empty mesh.
    pub fn bounds(&self) -> Option<[f64; 6]> {
        if self.vertices.is_empty() {
            return None;
        }
        let mut b = [
            f64::INFINITY,
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        ];
        for p in self.vertices.chunks_exact(3) {
            for k in 0..3 {
                b[k] = b[k].min(p[k] as f64);
                b[k + 3] = b[k + 3].max(p[k] as f64);
            }
        }
        Some(b)
    }

    /// Signed enclosed volume (divergence theorem over the triangles).
    /// Positive when triangles wind counter-clockwise seen from outside.
    pub fn signed_volume(&self) -> f64 {
        self.triangles()
            .map(|[a, b, c]| {
                let cross = [
                    b[1] * c[2] - b[2] * c[1],
                    b[2] * c[0] - b[0] * c[2],
                    b[0] * c[1] - b[1] * c[0],
                ];
                (a[0] * cross[0] + a[1] * cross[1] + a[2] * cross[2]) / 6.0
            })
            .sum()
    }

    /// Replace `normals` with area-weighted per-vertex normals.
    pub fn recompute_normals(&mut self) {
        let mut acc = vec![0.0f64; self.vertices.len()];
        for t in self.indices.chunks_exact(3) {
            let [a, b, c] = [self.position(t[0]), self.position(t[1]), self.position(t[2])];
            let n = keycap_types::cross(keycap_types::sub(b, a), keycap_types::sub(c, a));
            for &i in t {
                let i = i as usize * 3;
                acc[i] += n[0];
                acc[i + 1] += n[1];
                acc[i + 2] += n[2];
            }
        }
        self.normals = acc
            .chunks_exact(3)
            .flat_map(|n| {
                let n = keycap_types::normalize([n[0], n[1], n[2]]).unwrap_or([0.0, 0.0, 1.0]);
                [n[0] as f32, n[1] as f32, n[2] as f32]
            })
            .collect();
    }
}

impl Serialize for KernelId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for KernelId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        u64::deserialize(deserializer).map(KernelId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_tetrahedron() -> RenderMesh {
        RenderMesh {
            vertices: vec![
                0.0, 0.0, 0.0, //
                1.0, 0.0, 0.0, //
                0.0, 1.0, 0.0, //
                0.0, 0.0, 1.0,
            ],
            normals: Vec::new(),
            indices: vec![0, 2, 1, 0, 1, 3, 0, 3, 2, 1, 2, 3],
            face_ranges: Vec::new(),
        }
    }

    #[test]
    fn test_signed_volume_of_tetrahedron() {
        let mesh = unit_tetrahedron();
        assert_relative_eq!(mesh.signed_volume(), 1.0 / 6.0, epsilon = 1e-9);
    }

    #[test]
    fn test_bounds_and_counts() {
        let mesh = unit_tetrahedron();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(mesh.bounds(), Some([0.0, 0.0, 0.0, 1.0, 1.0, 1.0]));
        assert_eq!(RenderMesh::default().bounds(), None);
    }

    #[test]
    fn test_recompute_normals_fills_every_vertex() {
        let mut mesh = unit_tetrahedron();
        mesh.recompute_normals();
        assert_eq!(mesh.normals.len(), mesh.vertices.len());
        for n in mesh.normals.chunks_exact(3) {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert_relative_eq!(len, 1.0, epsilon = 1e-5);
        }
    }
}
