//! MockKernel — deterministic test double implementing Kernel + KernelIntrospect.
//!
//! Solids carry real polygonal topology (vertex positions, ring and lateral
//! edges, faces with outward normals) so selection predicates can be tested,
//! plus a bookkeeping volume that booleans combine arithmetically.

use crate::traits::{Kernel, KernelExport, KernelIntrospect};
use crate::types::*;
use keycap_types::{add, cross, distance, dot, normalize, scale, sub, Curve2d, Plane, Wire2d};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Serialize)]
struct MockVertex {
    id: KernelId,
    position: [f64; 3],
}

#[derive(Debug, Clone, Serialize)]
struct MockEdge {
    id: KernelId,
    start: KernelId,
    end: KernelId,
    /// Parametric midpoint; the arc midpoint for curved edges.
    midpoint: [f64; 3],
    direction: [f64; 3],
    length: f64,
    curve_type: String,
}

#[derive(Debug, Clone, Serialize)]
struct MockFace {
    id: KernelId,
    edges: Vec<KernelId>,
    normal: [f64; 3],
    centroid: [f64; 3],
    area: f64,
    surface_type: String,
    /// Boundary polygon used for tessellation and bounding boxes.
    outline: Vec<[f64; 3]>,
}

#[derive(Debug, Clone, Default, Serialize)]
struct MockSolid {
    vertices: Vec<MockVertex>,
    edges: Vec<MockEdge>,
    faces: Vec<MockFace>,
    volume: f64,
}

impl MockSolid {
    fn vertex(&self, id: KernelId) -> Option<&MockVertex> {
        self.vertices.iter().find(|v| v.id == id)
    }

    fn edge(&self, id: KernelId) -> Option<&MockEdge> {
        self.edges.iter().find(|e| e.id == id)
    }
}

/// A planar face made by `make_face`, waiting to be lofted or extruded.
#[derive(Debug, Clone)]
struct MockSection {
    /// Start point of every boundary curve.
    points: Vec<[f64; 3]>,
    /// Arc midpoint for curves that are arcs.
    arc_mids: Vec<Option<[f64; 3]>>,
    outline: Vec<[f64; 3]>,
    normal: [f64; 3],
    centroid: [f64; 3],
    area: f64,
}

impl MockSection {
    fn translated(&self, offset: [f64; 3]) -> Self {
        Self {
            points: self.points.iter().map(|&p| add(p, offset)).collect(),
            arc_mids: self
                .arc_mids
                .iter()
                .map(|m| m.map(|p| add(p, offset)))
                .collect(),
            outline: self.outline.iter().map(|&p| add(p, offset)).collect(),
            normal: self.normal,
            centroid: add(self.centroid, offset),
            area: self.area,
        }
    }
}

/// Deterministic test double for the geometry kernel.
/// Implements Kernel, KernelIntrospect and KernelExport.
pub struct MockKernel {
    next_id: u64,
    next_handle: u64,
    solids: HashMap<u64, MockSolid>,
    /// Faces created by make_face, awaiting loft or extrude.
    standalone_faces: HashMap<u64, MockSection>,
}

impl MockKernel {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            next_handle: 1,
            solids: HashMap::new(),
            standalone_faces: HashMap::new(),
        }
    }

    fn alloc_id(&mut self) -> KernelId {
        let id = KernelId(self.next_id);
        self.next_id += 1;
        id
    }

    fn alloc_handle(&mut self) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn store(&mut self, solid: MockSolid) -> KernelSolidHandle {
        let handle = self.alloc_handle();
        self.solids.insert(handle.id(), solid);
        handle
    }

    fn solid(&self, handle: &KernelSolidHandle) -> Result<&MockSolid, KernelError> {
        self.solids
            .get(&handle.id())
            .ok_or_else(|| KernelError::missing_solid(handle))
    }

    fn take_section(&mut self, face: KernelId) -> Result<MockSection, KernelError> {
        self.standalone_faces
            .remove(&face.0)
            .ok_or(KernelError::EntityNotFound { id: face })
    }

    /// Build the solid swept through `rings`: one vertex per curve start,
    /// ring edges per section, lateral edges between consecutive sections,
    /// two caps and one side face per curve per span.
    fn build_swept_solid(&mut self, rings: &[MockSection], volume: f64) -> MockSolid {
        let n = rings[0].points.len();
        let first = &rings[0];
        let last = &rings[rings.len() - 1];
        let sweep_dir = normalize(sub(last.centroid, first.centroid)).unwrap_or(first.normal);
        let axis_mid = scale(add(first.centroid, last.centroid), 0.5);

        let mut vertices = Vec::new();
        let mut ring_vertices: Vec<Vec<KernelId>> = Vec::new();
        for ring in rings {
            let ids = ring
                .points
                .iter()
                .map(|&position| {
                    let id = self.alloc_id();
                    vertices.push(MockVertex { id, position });
                    id
                })
                .collect();
            ring_vertices.push(ids);
        }

        let mut edges = Vec::new();
        let mut ring_edges: Vec<Vec<KernelId>> = Vec::new();
        for (r, ring) in rings.iter().enumerate() {
            let mut ids = Vec::with_capacity(n);
            for i in 0..n {
                let j = (i + 1) % n;
                let (a, b) = (ring.points[i], ring.points[j]);
                let edge = self.make_edge(
                    (ring_vertices[r][i], a),
                    (ring_vertices[r][j], b),
                    ring.arc_mids[i],
                );
                ids.push(edge.id);
                edges.push(edge);
            }
            ring_edges.push(ids);
        }

        let mut laterals: Vec<Vec<KernelId>> = Vec::new();
        for r in 0..rings.len() - 1 {
            let mut ids = Vec::with_capacity(n);
            for i in 0..n {
                let edge = self.make_edge(
                    (ring_vertices[r][i], rings[r].points[i]),
                    (ring_vertices[r + 1][i], rings[r + 1].points[i]),
                    None,
                );
                ids.push(edge.id);
                edges.push(edge);
            }
            laterals.push(ids);
        }

        let mut faces = vec![
            MockFace {
                id: self.alloc_id(),
                edges: ring_edges[0].clone(),
                normal: scale(sweep_dir, -1.0),
                centroid: first.centroid,
                area: first.area,
                surface_type: "planar".to_string(),
                outline: first.outline.clone(),
            },
            MockFace {
                id: self.alloc_id(),
                edges: ring_edges[rings.len() - 1].clone(),
                normal: sweep_dir,
                centroid: last.centroid,
                area: last.area,
                surface_type: "planar".to_string(),
                outline: last.outline.clone(),
            },
        ];

        for r in 0..rings.len() - 1 {
            let (lo, hi) = (&rings[r], &rings[r + 1]);
            for i in 0..n {
                let j = (i + 1) % n;
                let quad = [lo.points[i], lo.points[j], hi.points[j], hi.points[i]];
                let centroid = scale(
                    add(add(quad[0], quad[1]), add(quad[2], quad[3])),
                    0.25,
                );
                let n1 = cross(sub(quad[1], quad[0]), sub(quad[2], quad[0]));
                let n2 = cross(sub(quad[2], quad[0]), sub(quad[3], quad[0]));
                let mut area = 0.5 * (keycap_types::length(n1) + keycap_types::length(n2));
                // Curved sides are as long as their arc, not its chord.
                if let Some(m) = lo.arc_mids[i] {
                    let chord = distance(quad[0], quad[1]);
                    if chord > 1e-12 {
                        area *= (distance(quad[0], m) + distance(m, quad[1])) / chord;
                    }
                }
                let mut normal = normalize(add(n1, n2)).unwrap_or(sweep_dir);
                if dot(normal, sub(centroid, axis_mid)) < 0.0 {
                    normal = scale(normal, -1.0);
                }
                let curved = lo.arc_mids[i].is_some() || hi.arc_mids[i].is_some();
                let coplanar = dot(normal, sub(quad[3], quad[0])).abs() < 1e-9
                    && dot(normal, sub(quad[2], quad[0])).abs() < 1e-9;
                let surface_type = if !curved && coplanar { "planar" } else { "nurbs" };
                faces.push(MockFace {
                    id: self.alloc_id(),
                    edges: vec![
                        ring_edges[r][i],
                        laterals[r][j],
                        ring_edges[r + 1][i],
                        laterals[r][i],
                    ],
                    normal,
                    centroid,
                    area,
                    surface_type: surface_type.to_string(),
                    outline: quad.to_vec(),
                });
            }
        }

        MockSolid {
            vertices,
            edges,
            faces,
            volume,
        }
    }

    fn make_edge(
        &mut self,
        (start, a): (KernelId, [f64; 3]),
        (end, b): (KernelId, [f64; 3]),
        arc_mid: Option<[f64; 3]>,
    ) -> MockEdge {
        let (midpoint, length, curve_type) = match arc_mid {
            Some(m) => (m, distance(a, m) + distance(m, b), "arc"),
            None => (scale(add(a, b), 0.5), distance(a, b), "line"),
        };
        MockEdge {
            id: self.alloc_id(),
            start,
            end,
            midpoint,
            direction: normalize(sub(b, a)).unwrap_or([0.0, 0.0, 0.0]),
            length,
            curve_type: curve_type.to_string(),
        }
    }

    /// Merge two solids for boolean union: combine all topology with new IDs.
    fn merge_solids(&mut self, a: &MockSolid, b: &MockSolid) -> MockSolid {
        let mut vertices = Vec::new();
        let mut edges = Vec::new();
        let mut faces = Vec::new();

        // Re-ID everything from both solids
        let mut id_map: HashMap<KernelId, KernelId> = HashMap::new();

        for source in [a, b] {
            for v in &source.vertices {
                let new_id = self.alloc_id();
                id_map.insert(v.id, new_id);
                vertices.push(MockVertex {
                    id: new_id,
                    position: v.position,
                });
            }
            for e in &source.edges {
                let new_id = self.alloc_id();
                id_map.insert(e.id, new_id);
                edges.push(MockEdge {
                    id: new_id,
                    start: id_map[&e.start],
                    end: id_map[&e.end],
                    ..e.clone()
                });
            }
            for f in &source.faces {
                let new_id = self.alloc_id();
                faces.push(MockFace {
                    id: new_id,
                    edges: f.edges.iter().map(|eid| id_map[eid]).collect(),
                    ..f.clone()
                });
            }
        }

        MockSolid {
            vertices,
            edges,
            faces,
            volume: a.volume + b.volume,
        }
    }

    /// Re-ID a solid to simulate new kernel output, with a new volume.
    fn copy_with_volume(&mut self, source: &MockSolid, volume: f64) -> MockSolid {
        let mut copy = self.merge_solids(source, &MockSolid::default());
        copy.volume = volume;
        copy
    }

    /// Faces of `tool` whose centroid lies strictly inside the bounding box
    /// of `host`, turned inside out. These are the walls a subtraction leaves
    /// behind; tool faces on or beyond the host boundary cut nothing visible.
    fn cavity_walls(host: &MockSolid, tool: &MockSolid) -> MockSolid {
        let Some(bounds) = bbox_of(host.vertices.iter().map(|v| v.position)) else {
            return MockSolid::default();
        };
        let inside = |p: [f64; 3]| {
            (0..3).all(|k| p[k] > bounds[k] + 1e-6 && p[k] < bounds[k + 3] - 1e-6)
        };

        let faces: Vec<MockFace> = tool
            .faces
            .iter()
            .filter(|f| inside(f.centroid))
            .map(|f| MockFace {
                normal: scale(f.normal, -1.0),
                ..f.clone()
            })
            .collect();
        let edge_ids: HashSet<KernelId> = faces.iter().flat_map(|f| f.edges.clone()).collect();
        let edges: Vec<MockEdge> = tool
            .edges
            .iter()
            .filter(|e| edge_ids.contains(&e.id))
            .cloned()
            .collect();
        let vertex_ids: HashSet<KernelId> = edges.iter().flat_map(|e| [e.start, e.end]).collect();
        let vertices = tool
            .vertices
            .iter()
            .filter(|v| vertex_ids.contains(&v.id))
            .cloned()
            .collect();

        MockSolid {
            vertices,
            edges,
            faces,
            volume: 0.0,
        }
    }

    /// Largest radius the material around an edge can take: for every face
    /// using the edge, its area spread along the edge's length.
    fn material_bound(solid: &MockSolid, edge: &MockEdge) -> f64 {
        solid
            .faces
            .iter()
            .filter(|f| f.edges.contains(&edge.id))
            .map(|f| f.area / edge.length.max(1e-12))
            .fold(f64::INFINITY, f64::min)
    }

    /// Fan-triangulate every face outline around its centroid, winding each
    /// triangle to agree with the face normal.
    fn tessellate_faces(solid: &MockSolid) -> RenderMesh {
        let mut vertices = Vec::new();
        let mut normals = Vec::new();
        let mut indices = Vec::new();
        let mut face_ranges = Vec::new();

        for face in &solid.faces {
            if face.outline.len() < 3 {
                continue;
            }
            let start_index = indices.len() as u32;
            let base_vertex = (vertices.len() / 3) as u32;
            let n = face.normal;

            for p in std::iter::once(&face.centroid).chain(face.outline.iter()) {
                vertices.extend_from_slice(&[p[0] as f32, p[1] as f32, p[2] as f32]);
                normals.extend_from_slice(&[n[0] as f32, n[1] as f32, n[2] as f32]);
            }

            let m = face.outline.len();
            for i in 0..m {
                let j = (i + 1) % m;
                let winding = cross(
                    sub(face.outline[i], face.centroid),
                    sub(face.outline[j], face.centroid),
                );
                let (a, b) = (base_vertex + 1 + i as u32, base_vertex + 1 + j as u32);
                if dot(winding, n) >= 0.0 {
                    indices.extend_from_slice(&[base_vertex, a, b]);
                } else {
                    indices.extend_from_slice(&[base_vertex, b, a]);
                }
            }

            face_ranges.push(FaceRange {
                face_id: face.id,
                start_index,
                end_index: indices.len() as u32,
            });
        }

        RenderMesh {
            vertices,
            normals,
            indices,
            face_ranges,
        }
    }

    fn binary_operands(
        &self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<(MockSolid, MockSolid), KernelError> {
        Ok((self.solid(a)?.clone(), self.solid(b)?.clone()))
    }
}

impl Default for MockKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn bbox_of(points: impl IntoIterator<Item = [f64; 3]>) -> Option<[f64; 6]> {
    let mut iter = points.into_iter().peekable();
    iter.peek()?;
    let mut b = [
        f64::INFINITY,
        f64::INFINITY,
        f64::INFINITY,
        f64::NEG_INFINITY,
        f64::NEG_INFINITY,
        f64::NEG_INFINITY,
    ];
    for p in iter {
        for k in 0..3 {
            b[k] = b[k].min(p[k]);
            b[k + 3] = b[k + 3].max(p[k]);
        }
    }
    Some(b)
}

impl Kernel for MockKernel {
    fn make_face(&mut self, outline: &Wire2d, plane: &Plane) -> Result<KernelId, KernelError> {
        if outline.len() < 2 {
            return Err(KernelError::FaceFailed {
                reason: format!("outline has {} curves", outline.len()),
            });
        }
        let area = outline.signed_area().abs();
        if area < 1e-12 {
            return Err(KernelError::FaceFailed {
                reason: "outline encloses no area".to_string(),
            });
        }
        let normal = normalize(plane.normal).ok_or_else(|| KernelError::FaceFailed {
            reason: "plane normal has zero length".to_string(),
        })?;

        let mut points = Vec::with_capacity(outline.len());
        let mut arc_mids = Vec::with_capacity(outline.len());
        for curve in outline.curves() {
            points.push(plane.to_world(curve.start()));
            arc_mids.push(match *curve {
                Curve2d::Arc { mid, .. } => Some(plane.to_world(mid)),
                Curve2d::Segment { .. } => None,
            });
        }
        let outline_3d: Vec<[f64; 3]> = outline
            .sample_points()
            .into_iter()
            .map(|p| plane.to_world(p))
            .collect();
        let centroid = scale(
            outline_3d.iter().fold([0.0; 3], |acc, &p| add(acc, p)),
            1.0 / outline_3d.len() as f64,
        );

        let face_id = self.alloc_id();
        self.standalone_faces.insert(
            face_id.0,
            MockSection {
                points,
                arc_mids,
                outline: outline_3d,
                normal,
                centroid,
                area,
            },
        );
        Ok(face_id)
    }

    fn loft(&mut self, sections: &[KernelId]) -> Result<KernelSolidHandle, KernelError> {
        if sections.len() < 2 {
            return Err(KernelError::LoftFailed {
                reason: format!("loft needs at least 2 sections, got {}", sections.len()),
            });
        }
        let rings = sections
            .iter()
            .map(|&id| self.take_section(id))
            .collect::<Result<Vec<_>, _>>()?;

        let expected = rings[0].points.len();
        if let Some((i, ring)) = rings
            .iter()
            .enumerate()
            .find(|(_, r)| r.points.len() != expected)
        {
            return Err(KernelError::LoftFailed {
                reason: format!(
                    "section {} has {} curves, expected {}",
                    i,
                    ring.points.len(),
                    expected
                ),
            });
        }

        let mut volume = 0.0;
        for pair in rings.windows(2) {
            let span = dot(sub(pair[1].centroid, pair[0].centroid), pair[0].normal).abs();
            if span < 1e-12 {
                return Err(KernelError::LoftFailed {
                    reason: "consecutive sections are coplanar".to_string(),
                });
            }
            volume += 0.5 * (pair[0].area + pair[1].area) * span;
        }

        let solid = self.build_swept_solid(&rings, volume);
        Ok(self.store(solid))
    }

    fn extrude_face(
        &mut self,
        face: KernelId,
        direction: [f64; 3],
        depth: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let section = self.take_section(face)?;
        let dir = normalize(direction).ok_or_else(|| KernelError::Other {
            message: "extrude direction has zero length".to_string(),
        })?;
        if depth.abs() < 1e-12 {
            return Err(KernelError::Other {
                message: "extrude depth is zero".to_string(),
            });
        }

        let top = section.translated(scale(dir, depth));
        let volume = section.area * depth.abs() * dot(dir, section.normal).abs();
        let solid = self.build_swept_solid(&[section, top], volume);
        Ok(self.store(solid))
    }

    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let (solid_a, solid_b) = self.binary_operands(a, b)?;
        let merged = self.merge_solids(&solid_a, &solid_b);
        Ok(self.store(merged))
    }

    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let (solid_a, solid_b) = self.binary_operands(a, b)?;
        let remaining = solid_a.volume - solid_b.volume;
        // Removing at least as much as is there leaves nothing.
        let result = if remaining <= 1e-9 {
            MockSolid::default()
        } else {
            let cavity = Self::cavity_walls(&solid_a, &solid_b);
            let mut merged = self.merge_solids(&solid_a, &cavity);
            merged.volume = remaining;
            merged
        };
        Ok(self.store(result))
    }

    fn boolean_intersect(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        // The smaller operand stands in for the common part.
        let (solid_a, solid_b) = self.binary_operands(a, b)?;
        let smaller = if solid_b.volume < solid_a.volume {
            solid_b
        } else {
            solid_a
        };
        let volume = smaller.volume;
        let result = self.copy_with_volume(&smaller, volume);
        Ok(self.store(result))
    }

    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        if radius <= 0.0 {
            return Err(KernelError::FilletFailed {
                reason: "radius must be positive".to_string(),
            });
        }
        let source = self.solid(solid)?.clone();

        let mut targets = Vec::with_capacity(edges.len());
        for eid in edges {
            let edge = source.edge(*eid).ok_or_else(|| KernelError::FilletFailed {
                reason: format!("edge {:?} not found in solid", eid),
            })?;
            let bound = Self::material_bound(&source, edge);
            if radius > bound {
                return Err(KernelError::FilletFailed {
                    reason: format!(
                        "radius {radius} exceeds the {bound:.4} of material around edge {:?}",
                        eid
                    ),
                });
            }
            targets.push(edge.clone());
        }

        // For each filleted edge: replace edge with a cylindrical face,
        // add 2 new edges (fillet boundaries) and 2 new vertices.
        // Topology: V+2n, E-n+2n=E+n, F+n where n = edges.len()
        let filleted_set: HashSet<KernelId> = edges.iter().copied().collect();
        let mut id_map: HashMap<KernelId, KernelId> = HashMap::new();

        let mut new_vertices = Vec::new();
        for v in &source.vertices {
            let new_id = self.alloc_id();
            id_map.insert(v.id, new_id);
            new_vertices.push(MockVertex {
                id: new_id,
                position: v.position,
            });
        }

        let mut new_edges = Vec::new();
        for e in &source.edges {
            let new_id = self.alloc_id();
            id_map.insert(e.id, new_id);
            if !filleted_set.contains(&e.id) {
                new_edges.push(MockEdge {
                    id: new_id,
                    start: id_map[&e.start],
                    end: id_map[&e.end],
                    ..e.clone()
                });
            }
        }

        let mut new_faces = Vec::new();
        for f in &source.faces {
            new_faces.push(MockFace {
                id: self.alloc_id(),
                edges: f
                    .edges
                    .iter()
                    .filter(|eid| !filleted_set.contains(eid))
                    .map(|eid| id_map[eid])
                    .collect(),
                ..f.clone()
            });
        }

        let mut removed = 0.0;
        for edge in &targets {
            let (Some(sv), Some(ev)) = (source.vertex(edge.start), source.vertex(edge.end)) else {
                continue;
            };
            // The rounded surface faces the average of the two faces it joins
            // and sits (1 - 1/sqrt 2) r inside the sharp corner.
            let bisector = source
                .faces
                .iter()
                .filter(|f| f.edges.contains(&edge.id))
                .fold([0.0; 3], |acc, f| add(acc, f.normal));
            let normal = normalize(bisector).unwrap_or([0.0, 0.0, 1.0]);
            let inset = scale(normal, -radius * (1.0 - std::f64::consts::FRAC_1_SQRT_2));

            let v1 = MockVertex {
                id: self.alloc_id(),
                position: add(sv.position, inset),
            };
            let v2 = MockVertex {
                id: self.alloc_id(),
                position: add(ev.position, inset),
            };
            let e1 = self.make_edge(
                (id_map[&edge.start], sv.position),
                (v1.id, v1.position),
                None,
            );
            let e2 = self.make_edge((id_map[&edge.end], ev.position), (v2.id, v2.position), None);

            new_faces.push(MockFace {
                id: self.alloc_id(),
                edges: vec![e1.id, e2.id],
                normal,
                centroid: add(edge.midpoint, inset),
                area: edge.length * radius * std::f64::consts::FRAC_PI_2,
                surface_type: "cylindrical".to_string(),
                outline: vec![sv.position, ev.position, v2.position, v1.position],
            });
            new_vertices.push(v1);
            new_vertices.push(v2);
            new_edges.push(e1);
            new_edges.push(e2);
            removed += (1.0 - std::f64::consts::FRAC_PI_4) * radius * radius * edge.length;
        }

        Ok(self.store(MockSolid {
            vertices: new_vertices,
            edges: new_edges,
            faces: new_faces,
            volume: (source.volume - removed).max(0.0),
        }))
    }

    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        _tolerance: f64,
    ) -> Result<RenderMesh, KernelError> {
        Ok(Self::tessellate_faces(self.solid(solid)?))
    }

    fn volume(&mut self, solid: &KernelSolidHandle) -> Result<f64, KernelError> {
        Ok(self.solid(solid)?.volume)
    }
}

impl KernelIntrospect for MockKernel {
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| s.faces.iter().map(|f| f.id).collect())
            .unwrap_or_default()
    }

    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| s.edges.iter().map(|e| e.id).collect())
            .unwrap_or_default()
    }

    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId> {
        self.solids
            .get(&solid.id())
            .map(|s| s.vertices.iter().map(|v| v.id).collect())
            .unwrap_or_default()
    }

    fn face_edges(&self, face: KernelId) -> Vec<KernelId> {
        self.solids
            .values()
            .flat_map(|s| s.faces.iter())
            .find(|f| f.id == face)
            .map(|f| f.edges.clone())
            .unwrap_or_default()
    }

    fn edge_faces(&self, edge: KernelId) -> Vec<KernelId> {
        self.solids
            .values()
            .flat_map(|s| s.faces.iter())
            .filter(|f| f.edges.contains(&edge))
            .map(|f| f.id)
            .collect()
    }

    fn compute_signature(&self, entity: KernelId, kind: TopoKind) -> TopoSignature {
        for solid in self.solids.values() {
            match kind {
                TopoKind::Face => {
                    if let Some(f) = solid.faces.iter().find(|f| f.id == entity) {
                        return TopoSignature {
                            surface_type: Some(f.surface_type.clone()),
                            area: Some(f.area),
                            centroid: Some(f.centroid),
                            normal: Some(f.normal),
                            bbox: bbox_of(f.outline.iter().copied()),
                            ..TopoSignature::empty()
                        };
                    }
                }
                TopoKind::Edge => {
                    if let Some(e) = solid.edge(entity) {
                        let ends = [e.start, e.end]
                            .into_iter()
                            .filter_map(|id| solid.vertex(id).map(|v| v.position));
                        return TopoSignature {
                            surface_type: Some(e.curve_type.clone()),
                            centroid: Some(e.midpoint),
                            direction: Some(e.direction),
                            bbox: bbox_of(ends.chain(std::iter::once(e.midpoint))),
                            length: Some(e.length),
                            ..TopoSignature::empty()
                        };
                    }
                }
                TopoKind::Vertex => {
                    if let Some(v) = solid.vertex(entity) {
                        return TopoSignature {
                            surface_type: Some("point".to_string()),
                            centroid: Some(v.position),
                            ..TopoSignature::empty()
                        };
                    }
                }
            }
        }
        TopoSignature::empty()
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

impl KernelExport for MockKernel {
    fn export_step(&self, solid: &KernelSolidHandle, name: &str) -> Result<String, KernelError> {
        let s = self.solid(solid)?;
        let mut out = String::from("ISO-10303-21;\nHEADER;\n");
        out.push_str("FILE_DESCRIPTION(('mock solid'),'2;1');\n");
        out.push_str(&format!(
            "FILE_NAME('{}','',(''),(''),'','keycap-forge','');\n",
            name
        ));
        out.push_str("FILE_SCHEMA(('CONFIG_CONTROL_DESIGN'));\nENDSEC;\nDATA;\n");
        for (i, v) in s.vertices.iter().enumerate() {
            let p = v.position;
            out.push_str(&format!(
                "#{} = CARTESIAN_POINT('', ({:.6}, {:.6}, {:.6}));\n",
                i + 1,
                p[0],
                p[1],
                p[2]
            ));
        }
        out.push_str("ENDSEC;\nEND-ISO-10303-21;\n");
        Ok(out)
    }

    fn export_brep(&self, solid: &KernelSolidHandle) -> Result<Vec<u8>, KernelError> {
        serde_json::to_vec_pretty(self.solid(solid)?).map_err(|e| KernelError::ExportFailed {
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Extruded w x h rectangle on the XY plane, centred on the origin.
    fn make_box(kernel: &mut MockKernel, w: f64, h: f64, d: f64) -> KernelSolidHandle {
        let wire = Wire2d::rectangle([0.0, 0.0], w, h).unwrap();
        let face = kernel.make_face(&wire, &Plane::xy()).unwrap();
        kernel.extrude_face(face, [0.0, 0.0, 1.0], d).unwrap()
    }

    #[test]
    fn test_make_face_and_extrude_produces_box_topology() {
        let mut kernel = MockKernel::new();
        let handle = make_box(&mut kernel, 2.0, 3.0, 5.0);

        // Verify box topology: 8V, 12E, 6F
        assert_eq!(kernel.list_vertices(&handle).len(), 8, "Box should have 8 vertices");
        assert_eq!(kernel.list_edges(&handle).len(), 12, "Box should have 12 edges");
        assert_eq!(kernel.list_faces(&handle).len(), 6, "Box should have 6 faces");
        assert_relative_eq!(kernel.volume(&handle).unwrap(), 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_euler_formula_loft() {
        let mut kernel = MockKernel::new();
        let wire = Wire2d::rectangle([0.0, 1.0], 4.0, 2.0).unwrap();
        let a = kernel.make_face(&wire, &Plane::yz().offset(-3.0)).unwrap();
        let b = kernel.make_face(&wire, &Plane::yz().offset(3.0)).unwrap();
        let handle = kernel.loft(&[a, b]).unwrap();

        let v = kernel.list_vertices(&handle).len() as i64;
        let e = kernel.list_edges(&handle).len() as i64;
        let f = kernel.list_faces(&handle).len() as i64;

        // Euler's formula for genus-0: V - E + F = 2
        assert_eq!(v - e + f, 2, "Euler formula V-E+F=2 must hold for a loft");
        assert_relative_eq!(kernel.volume(&handle).unwrap(), 48.0, epsilon = 1e-9);
    }

    #[test]
    fn test_loft_consumes_sections() {
        let mut kernel = MockKernel::new();
        let wire = Wire2d::rectangle([0.0, 0.0], 1.0, 1.0).unwrap();
        let a = kernel.make_face(&wire, &Plane::xy()).unwrap();
        let b = kernel.make_face(&wire, &Plane::xy().offset(1.0)).unwrap();
        kernel.loft(&[a, b]).unwrap();
        let err = kernel.loft(&[a, b]).unwrap_err();
        assert!(matches!(err, KernelError::EntityNotFound { .. }));
    }

    #[test]
    fn test_loft_rejects_mismatched_sections() {
        let mut kernel = MockKernel::new();
        let square = Wire2d::rectangle([0.0, 0.0], 1.0, 1.0).unwrap();
        let tri = Wire2d::polygon(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
        let a = kernel.make_face(&square, &Plane::xy()).unwrap();
        let b = kernel.make_face(&tri, &Plane::xy().offset(1.0)).unwrap();
        let err = kernel.loft(&[a, b]).unwrap_err();
        assert!(matches!(err, KernelError::LoftFailed { .. }));
    }

    #[test]
    fn test_deterministic_ids() {
        // Two kernels with same operations should produce same ID sequences
        let mut k1 = MockKernel::new();
        let mut k2 = MockKernel::new();
        let h1 = make_box(&mut k1, 1.0, 2.0, 3.0);
        let h2 = make_box(&mut k2, 1.0, 2.0, 3.0);
        assert_eq!(
            k1.list_faces(&h1),
            k2.list_faces(&h2),
            "IDs should be deterministically assigned"
        );
    }

    #[test]
    fn test_face_normals_point_outward() {
        let mut kernel = MockKernel::new();
        let handle = make_box(&mut kernel, 2.0, 2.0, 2.0);
        for (_, sig) in kernel.compute_all_signatures(&handle, TopoKind::Face) {
            let c = sig.centroid.unwrap();
            let n = sig.normal.unwrap();
            // Box spans z in [0, 2]; its center is (0, 0, 1).
            let outward = dot(n, sub(c, [0.0, 0.0, 1.0]));
            assert!(outward > 0.0, "normal {n:?} at {c:?} points inward");
            assert!(sig.is_planar());
        }
    }

    #[test]
    fn test_edge_signatures_report_direction() {
        let mut kernel = MockKernel::new();
        let handle = make_box(&mut kernel, 2.0, 3.0, 4.0);
        let vertical: Vec<_> = kernel
            .compute_all_signatures(&handle, TopoKind::Edge)
            .into_iter()
            .filter(|(_, s)| s.direction.map(|d| d[2].abs() > 0.99).unwrap_or(false))
            .collect();
        assert_eq!(vertical.len(), 4, "a box has four vertical edges");
        for (_, sig) in vertical {
            assert!(sig.is_line());
            assert_relative_eq!(sig.length.unwrap(), 4.0);
            assert_relative_eq!(sig.centroid.unwrap()[2], 2.0);
        }
    }

    #[test]
    fn test_arc_edges_are_tagged() {
        let mut kernel = MockKernel::new();
        let wire = Wire2d::circle([0.0, 0.0], 2.0).unwrap();
        let face = kernel.make_face(&wire, &Plane::xy()).unwrap();
        let handle = kernel.extrude_face(face, [0.0, 0.0, 1.0], 3.0).unwrap();
        let arcs = kernel
            .compute_all_signatures(&handle, TopoKind::Edge)
            .into_iter()
            .filter(|(_, s)| s.surface_type.as_deref() == Some("arc"))
            .count();
        assert_eq!(arcs, 4, "two arcs on each cap");
        assert_relative_eq!(
            kernel.volume(&handle).unwrap(),
            std::f64::consts::PI * 4.0 * 3.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_subtract_everything_leaves_empty_solid() {
        let mut kernel = MockKernel::new();
        let a = make_box(&mut kernel, 2.0, 2.0, 2.0);
        let b = make_box(&mut kernel, 2.0, 2.0, 2.0);
        let diff = kernel.boolean_subtract(&a, &b).unwrap();
        assert_eq!(kernel.volume(&diff).unwrap(), 0.0);
        assert!(kernel.list_faces(&diff).is_empty());
        assert!(kernel.tessellate(&diff, 0.1).unwrap().is_empty());
    }

    #[test]
    fn test_boolean_volumes() {
        let mut kernel = MockKernel::new();
        let big = make_box(&mut kernel, 4.0, 4.0, 4.0);
        let small = make_box(&mut kernel, 1.0, 1.0, 1.0);

        let union = kernel.boolean_union(&big, &small).unwrap();
        assert_relative_eq!(kernel.volume(&union).unwrap(), 65.0);
        assert_eq!(kernel.list_faces(&union).len(), 12);

        let diff = kernel.boolean_subtract(&big, &small).unwrap();
        assert_relative_eq!(kernel.volume(&diff).unwrap(), 63.0);
        // The pocket's floor sits on the host's bottom face and is not kept.
        assert_eq!(kernel.list_faces(&diff).len(), 11);

        let common = kernel.boolean_intersect(&big, &small).unwrap();
        assert_relative_eq!(kernel.volume(&common).unwrap(), 1.0);
    }

    #[test]
    fn test_fillet_changes_topology() {
        let mut kernel = MockKernel::new();
        let handle = make_box(&mut kernel, 4.0, 4.0, 4.0);
        let edges = kernel.list_edges(&handle);
        let before = kernel.volume(&handle).unwrap();

        let filleted = kernel.fillet_edges(&handle, &edges[..2], 0.5).unwrap();
        assert_eq!(kernel.list_vertices(&filleted).len(), 12);
        assert_eq!(kernel.list_edges(&filleted).len(), 14);
        assert_eq!(kernel.list_faces(&filleted).len(), 8);
        assert!(kernel.volume(&filleted).unwrap() < before);
    }

    #[test]
    fn test_fillet_exceeding_material_fails() {
        let mut kernel = MockKernel::new();
        // 0.5 thick slab: the vertical edges only have 0.5 of material.
        let handle = make_box(&mut kernel, 10.0, 0.5, 3.0);
        let vertical: Vec<KernelId> = kernel
            .compute_all_signatures(&handle, TopoKind::Edge)
            .into_iter()
            .filter(|(_, s)| s.direction.map(|d| d[2].abs() > 0.99).unwrap_or(false))
            .map(|(id, _)| id)
            .collect();

        assert!(kernel.fillet_edges(&handle, &vertical, 0.4).is_ok());
        let err = kernel.fillet_edges(&handle, &vertical, 0.6).unwrap_err();
        assert!(matches!(err, KernelError::FilletFailed { .. }));
    }

    #[test]
    fn test_fillet_unknown_edge_fails() {
        let mut kernel = MockKernel::new();
        let handle = make_box(&mut kernel, 1.0, 1.0, 1.0);
        let err = kernel
            .fillet_edges(&handle, &[KernelId(9999)], 0.1)
            .unwrap_err();
        assert!(matches!(err, KernelError::FilletFailed { .. }));
    }

    #[test]
    fn test_tessellate_matches_volume() {
        let mut kernel = MockKernel::new();
        let handle = make_box(&mut kernel, 2.0, 3.0, 4.0);
        let mesh = kernel.tessellate(&handle, 0.1).unwrap();

        assert_eq!(mesh.face_ranges.len(), 6);
        // Each face is a 4-point fan: 4 triangles.
        assert_eq!(mesh.triangle_count(), 24);
        assert_relative_eq!(mesh.signed_volume(), 24.0, epsilon = 1e-4);
    }

    #[test]
    fn test_export_step_and_brep() {
        let mut kernel = MockKernel::new();
        let handle = make_box(&mut kernel, 1.0, 1.0, 1.0);
        let step = kernel.export_step(&handle, "k1").unwrap();
        assert!(step.starts_with("ISO-10303-21;"));
        assert_eq!(step.matches("CARTESIAN_POINT").count(), 8);

        let brep = kernel.export_brep(&handle).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&brep).unwrap();
        assert_eq!(value["faces"].as_array().unwrap().len(), 6);
    }
}
