//! Tessellation wrapper with face-range metadata.
//!
//! Wraps truck-meshalgo to produce a RenderMesh whose FaceRange entries
//! carry the same face ids as the introspection API.

use crate::truck_introspect::{encode, FACE_BASE};
use crate::types::*;
use truck_meshalgo::prelude::*;
use truck_meshalgo::tessellation::MeshableShape;

type TruckSolid = truck_modeling::Solid;

/// Tessellate a truck Solid into a RenderMesh with per-face tracking.
///
/// Faces are visited in shell order, so the n-th face range belongs to the
/// n-th face reported by `list_faces` for `handle`.
pub fn tessellate_solid(
    solid: &TruckSolid,
    handle: u64,
    tolerance: f64,
) -> std::result::Result<RenderMesh, KernelError> {
    if tolerance <= 0.0 {
        return Err(KernelError::TessellationFailed {
            reason: format!("tolerance must be positive, got {tolerance}"),
        });
    }
    let meshed_solid = solid.triangulation(tolerance);

    let mut mesh = RenderMesh::default();
    let mut face_count = 0usize;

    for shell in meshed_solid.boundaries().iter() {
        for face in shell.face_iter() {
            let face_id = encode(handle, FACE_BASE, face_count);
            face_count += 1;

            // Each meshed face's surface is Option<PolygonMesh>
            let maybe_mesh: Option<PolygonMesh> = face.surface();
            let Some(face_mesh) = maybe_mesh else {
                continue;
            };

            // If face is inverted, the mesh needs inversion too
            let face_mesh = if !face.orientation() {
                let mut m = face_mesh;
                m.invert();
                m
            } else {
                face_mesh
            };

            let start_index = mesh.indices.len() as u32;
            let base_vertex = mesh.vertex_count() as u32;

            for pos in face_mesh.positions() {
                mesh.vertices
                    .extend_from_slice(&[pos[0] as f32, pos[1] as f32, pos[2] as f32]);
            }
            for tri in face_mesh.tri_faces() {
                for v in tri.iter() {
                    mesh.indices.push(v.pos as u32 + base_vertex);
                }
            }
            for quad in face_mesh.quad_faces() {
                for k in [0, 1, 2, 0, 2, 3] {
                    mesh.indices.push(quad[k].pos as u32 + base_vertex);
                }
            }

            let end_index = mesh.indices.len() as u32;
            if end_index > start_index {
                mesh.face_ranges.push(FaceRange {
                    face_id,
                    start_index,
                    end_index,
                });
            }
        }
    }

    if mesh.is_empty() && face_count > 0 {
        return Err(KernelError::TessellationFailed {
            reason: format!("{face_count} faces produced no triangles"),
        });
    }

    mesh.recompute_normals();
    Ok(mesh)
}
