//! KernelIntrospect for TruckKernel.
//!
//! Entity ids are positional: `handle * 10000 + index` for faces, with
//! `+ 1000` for edges and `+ 2000` for vertices. Edges and vertices are
//! deduplicated in shell iteration order.

use std::collections::HashSet;

use crate::traits::KernelIntrospect;
use crate::truck_kernel::TruckKernel;
use crate::types::*;

use truck_modeling::geometry::{Curve, Surface};
use truck_modeling::topology::{Edge, Face, Shell, Solid, Vertex};
use truck_modeling::{BoundedCurve, ParametricCurve};

pub(crate) const FACE_BASE: u64 = 0;
const EDGE_BASE: u64 = 1000;
const VERTEX_BASE: u64 = 2000;
const STRIDE: u64 = 10000;

impl KernelIntrospect for TruckKernel {
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        let Some(truck_solid) = self.get_solid(solid) else {
            return Vec::new();
        };
        let count: usize = truck_solid
            .boundaries()
            .iter()
            .map(|shell| shell.face_iter().count())
            .sum();
        (0..count)
            .map(|i| encode(solid.id(), FACE_BASE, i))
            .collect()
    }

    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.get_solid(solid)
            .map(|s| {
                (0..unique_edges(s).len())
                    .map(|i| encode(solid.id(), EDGE_BASE, i))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.get_solid(solid)
            .map(|s| {
                (0..unique_vertices(s).len())
                    .map(|i| encode(solid.id(), VERTEX_BASE, i))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn face_edges(&self, face: KernelId) -> Vec<KernelId> {
        let (handle, offset) = decode(face, FACE_BASE);
        let Some(truck_solid) = self.get_solid(&handle) else {
            return Vec::new();
        };
        let Some(target) = all_faces(truck_solid).into_iter().nth(offset) else {
            return Vec::new();
        };
        let edges = unique_edges(truck_solid);
        let boundaries = target.boundaries();
        boundaries
            .iter()
            .flat_map(|w| w.edge_iter())
            .filter_map(|e| edges.iter().position(|u| u.id() == e.id()))
            .map(|i| encode(handle.id(), EDGE_BASE, i))
            .collect()
    }

    fn edge_faces(&self, edge: KernelId) -> Vec<KernelId> {
        let (handle, offset) = decode(edge, EDGE_BASE);
        let Some(truck_solid) = self.get_solid(&handle) else {
            return Vec::new();
        };
        let Some(target) = unique_edges(truck_solid).into_iter().nth(offset) else {
            return Vec::new();
        };
        let faces = all_faces(truck_solid);
        faces
            .iter()
            .enumerate()
            .filter(|(_, face)| {
                face.boundaries()
                    .iter()
                    .flat_map(|w| w.edge_iter())
                    .any(|e| e.id() == target.id())
            })
            .map(|(i, _)| encode(handle.id(), FACE_BASE, i))
            .collect()
    }

    fn compute_signature(&self, entity: KernelId, kind: TopoKind) -> TopoSignature {
        let base = match kind {
            TopoKind::Face => FACE_BASE,
            TopoKind::Edge => EDGE_BASE,
            TopoKind::Vertex => VERTEX_BASE,
        };
        let (handle, offset) = decode(entity, base);
        let Some(truck_solid) = self.get_solid(&handle) else {
            return TopoSignature::empty();
        };

        let sig = match kind {
            TopoKind::Face => all_faces(truck_solid)
                .get(offset)
                .map(compute_face_signature),
            TopoKind::Edge => unique_edges(truck_solid)
                .get(offset)
                .map(compute_edge_signature),
            TopoKind::Vertex => unique_vertices(truck_solid)
                .get(offset)
                .map(compute_vertex_signature),
        };
        sig.unwrap_or_else(TopoSignature::empty)
    }

    fn compute_all_signatures(
        &self,
        solid: &KernelSolidHandle,
        kind: TopoKind,
    ) -> Vec<(KernelId, TopoSignature)> {
        let ids = match kind {
            TopoKind::Face => self.list_faces(solid),
            TopoKind::Edge => self.list_edges(solid),
            TopoKind::Vertex => self.list_vertices(solid),
        };
        ids.into_iter()
            .map(|id| (id, self.compute_signature(id, kind)))
            .collect()
    }
}

// ── Id encoding ─────────────────────────────────────────────────────────

pub(crate) fn encode(handle: u64, base: u64, index: usize) -> KernelId {
    KernelId(handle * STRIDE + base + index as u64)
}

fn decode(id: KernelId, base: u64) -> (KernelSolidHandle, usize) {
    let handle = KernelSolidHandle(id.0 / STRIDE);
    let offset = (id.0 % STRIDE).saturating_sub(base) as usize;
    (handle, offset)
}

// ── Topology walks ──────────────────────────────────────────────────────

pub(crate) fn all_faces(solid: &Solid) -> Vec<Face> {
    solid
        .boundaries()
        .iter()
        .flat_map(|shell: &Shell| shell.face_iter().cloned())
        .collect()
}

fn unique_edges(solid: &Solid) -> Vec<Edge> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for shell in solid.boundaries().iter() {
        for edge in shell.edge_iter() {
            if seen.insert(edge.id()) {
                out.push(edge);
            }
        }
    }
    out
}

fn unique_vertices(solid: &Solid) -> Vec<Vertex> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for shell in solid.boundaries().iter() {
        for v in shell.vertex_iter() {
            if seen.insert(v.id()) {
                out.push(v);
            }
        }
    }
    out
}

// ── Signatures ──────────────────────────────────────────────────────────

fn compute_face_signature(face: &Face) -> TopoSignature {
    let surface = face.oriented_surface();
    let points: Vec<[f64; 3]> = face
        .boundaries()
        .iter()
        .flat_map(|w| w.vertex_iter())
        .map(|v| {
            let p = v.point();
            [p[0], p[1], p[2]]
        })
        .collect();

    let centroid = if points.is_empty() {
        None
    } else {
        let sum = points.iter().fold([0.0; 3], |acc, p| {
            [acc[0] + p[0], acc[1] + p[1], acc[2] + p[2]]
        });
        let n = points.len() as f64;
        Some([sum[0] / n, sum[1] / n, sum[2] / n])
    };

    let (surface_type, normal) = match &surface {
        Surface::Plane(plane) => {
            let n = plane.normal();
            ("planar", Some([n[0], n[1], n[2]]))
        }
        Surface::RevolutedCurve(_) => ("revolved", None),
        _ => ("nurbs", None),
    };

    TopoSignature {
        surface_type: Some(surface_type.to_string()),
        centroid,
        normal,
        bbox: bbox_of(&points),
        ..TopoSignature::empty()
    }
}

fn compute_edge_signature(edge: &Edge) -> TopoSignature {
    let front = edge.front().point();
    let back = edge.back().point();

    let curve = edge.oriented_curve();
    let (t0, t1) = curve.range_tuple();
    let mid = curve.subs((t0 + t1) / 2.0);

    let chord = [back[0] - front[0], back[1] - front[1], back[2] - front[2]];
    let chord_len = (chord[0] * chord[0] + chord[1] * chord[1] + chord[2] * chord[2]).sqrt();
    let direction = (chord_len > 1e-12).then(|| {
        [
            chord[0] / chord_len,
            chord[1] / chord_len,
            chord[2] / chord_len,
        ]
    });

    let is_line = matches!(curve, Curve::Line(_));
    let length = if is_line {
        chord_len
    } else {
        // Two-chord estimate through the parametric midpoint.
        let d = |a: [f64; 3], b: [f64; 3]| {
            ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
        };
        let (f, m, b) = (
            [front[0], front[1], front[2]],
            [mid[0], mid[1], mid[2]],
            [back[0], back[1], back[2]],
        );
        d(f, m) + d(m, b)
    };

    TopoSignature {
        surface_type: Some(if is_line { "line" } else { "curve" }.to_string()),
        centroid: Some([mid[0], mid[1], mid[2]]),
        direction,
        bbox: bbox_of(&[
            [front[0], front[1], front[2]],
            [mid[0], mid[1], mid[2]],
            [back[0], back[1], back[2]],
        ]),
        length: Some(length),
        ..TopoSignature::empty()
    }
}

fn compute_vertex_signature(vertex: &Vertex) -> TopoSignature {
    let p = vertex.point();
    TopoSignature {
        surface_type: Some("point".to_string()),
        centroid: Some([p[0], p[1], p[2]]),
        ..TopoSignature::empty()
    }
}

fn bbox_of(points: &[[f64; 3]]) -> Option<[f64; 6]> {
    let first = points.first()?;
    let mut b = [first[0], first[1], first[2], first[0], first[1], first[2]];
    for p in &points[1..] {
        for k in 0..3 {
            b[k] = b[k].min(p[k]);
            b[k + 3] = b[k + 3].max(p[k]);
        }
    }
    Some(b)
}
