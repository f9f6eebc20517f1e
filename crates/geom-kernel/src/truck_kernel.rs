//! TruckKernel — real geometry kernel wrapping truck's API.

use crate::tessellation;
use crate::traits::{Kernel, KernelExport};
use crate::types::*;
use keycap_types::{Curve2d, Plane, Wire2d};
use std::collections::HashMap;
use tracing::debug;

// Import truck types selectively to avoid shadowing std::result::Result
use truck_modeling::builder;
use truck_modeling::topology::{Edge, Face, Shell, Solid, Vertex, Wire};
use truck_modeling::{InnerSpace, Point3, Vector3};

/// Tolerance handed to truck-shapeops for every boolean.
const BOOLEAN_TOLERANCE: f64 = 0.05;

/// Coarse tessellation used only to decide a loft's orientation.
const ORIENTATION_TOLERANCE: f64 = 0.1;

/// Real geometry kernel backed by the truck BREP library.
pub struct TruckKernel {
    next_handle: u64,
    next_id: u64,
    solids: HashMap<u64, Solid>,
    /// Standalone faces created by make_face, awaiting loft or extrude.
    standalone_faces: HashMap<u64, Face>,
}

impl TruckKernel {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            next_id: 1,
            solids: HashMap::new(),
            standalone_faces: HashMap::new(),
        }
    }

    fn alloc_handle(&mut self) -> KernelSolidHandle {
        let h = KernelSolidHandle(self.next_handle);
        self.next_handle += 1;
        h
    }

    fn alloc_id(&mut self) -> KernelId {
        let id = KernelId(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn store_solid(&mut self, solid: Solid) -> KernelSolidHandle {
        let handle = self.alloc_handle();
        self.solids.insert(handle.id(), solid);
        handle
    }

    pub(crate) fn get_solid(&self, handle: &KernelSolidHandle) -> Option<&Solid> {
        self.solids.get(&handle.id())
    }

    fn cloned_solid(&self, handle: &KernelSolidHandle) -> Result<Solid, KernelError> {
        self.get_solid(handle)
            .cloned()
            .ok_or_else(|| KernelError::missing_solid(handle))
    }

    fn take_face(&mut self, face: KernelId) -> Result<Face, KernelError> {
        self.standalone_faces
            .remove(&face.0)
            .ok_or(KernelError::EntityNotFound { id: face })
    }
}

impl Default for TruckKernel {
    fn default() -> Self {
        Self::new()
    }
}

fn to_point(p: [f64; 3]) -> Point3 {
    Point3::new(p[0], p[1], p[2])
}

/// Flip a closed solid whose faces were stitched inside out.
fn orient_outward(mut solid: Solid) -> Result<Solid, KernelError> {
    let mesh = tessellation::tessellate_solid(&solid, 0, ORIENTATION_TOLERANCE)?;
    if mesh.signed_volume() < 0.0 {
        solid.not();
    }
    Ok(solid)
}

impl Kernel for TruckKernel {
    fn make_face(&mut self, outline: &Wire2d, plane: &Plane) -> Result<KernelId, KernelError> {
        let curves = outline.curves();
        if curves.len() < 2 {
            return Err(KernelError::FaceFailed {
                reason: format!("outline has {} curves", curves.len()),
            });
        }

        // Create all vertices first so edges share endpoints.
        let vertices: Vec<Vertex> = curves
            .iter()
            .map(|c| builder::vertex(to_point(plane.to_world(c.start()))))
            .collect();
        let n = vertices.len();
        let mut wire_edges: Vec<Edge> = Vec::with_capacity(n);
        for (i, curve) in curves.iter().enumerate() {
            let (v0, v1) = (&vertices[i], &vertices[(i + 1) % n]);
            let edge: Edge = match *curve {
                Curve2d::Segment { .. } => builder::line(v0, v1),
                Curve2d::Arc { mid, .. } => {
                    builder::circle_arc(v0, v1, to_point(plane.to_world(mid)))
                }
            };
            wire_edges.push(edge);
        }
        let wire = Wire::from_iter(wire_edges);

        let face = builder::try_attach_plane(&[wire]).map_err(|e| KernelError::FaceFailed {
            reason: format!("failed to create planar face: {}", e),
        })?;

        let face_id = self.alloc_id();
        self.standalone_faces.insert(face_id.0, face);
        Ok(face_id)
    }

    fn loft(&mut self, sections: &[KernelId]) -> Result<KernelSolidHandle, KernelError> {
        if sections.len() < 2 {
            return Err(KernelError::LoftFailed {
                reason: format!("loft needs at least 2 sections, got {}", sections.len()),
            });
        }
        let faces = sections
            .iter()
            .map(|&id| self.take_face(id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut shell_faces: Vec<Face> = Vec::new();
        for pair in faces.windows(2) {
            let (b0, b1) = (pair[0].boundaries(), pair[1].boundaries());
            let (w0, w1) = match (b0.first(), b1.first()) {
                (Some(w0), Some(w1)) => (w0, w1),
                _ => {
                    return Err(KernelError::LoftFailed {
                        reason: "section face has no boundary".to_string(),
                    })
                }
            };
            if w0.len() != w1.len() {
                return Err(KernelError::LoftFailed {
                    reason: format!("sections have {} and {} edges", w0.len(), w1.len()),
                });
            }
            let sides: Shell =
                builder::try_wire_homotopy(w0, w1).map_err(|e| KernelError::LoftFailed {
                    reason: e.to_string(),
                })?;
            shell_faces.extend(sides.face_iter().cloned());
        }
        shell_faces.push(faces[0].inverse());
        shell_faces.push(faces[faces.len() - 1].clone());

        let shell: Shell = shell_faces.into_iter().collect();
        let solid = Solid::try_new(vec![shell]).map_err(|e| KernelError::LoftFailed {
            reason: e.to_string(),
        })?;
        let solid = orient_outward(solid)?;
        debug!(sections = sections.len(), "lofted solid");
        Ok(self.store_solid(solid))
    }

    fn extrude_face(
        &mut self,
        face: KernelId,
        direction: [f64; 3],
        depth: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        let truck_face = self.take_face(face)?;

        let dir = Vector3::new(direction[0], direction[1], direction[2]);
        if dir.magnitude() < 1e-12 {
            return Err(KernelError::Other {
                message: "extrude direction has zero length".to_string(),
            });
        }
        if depth.abs() < 1e-12 {
            return Err(KernelError::Other {
                message: "extrude depth is zero".to_string(),
            });
        }
        let sweep_vec = dir.normalize() * depth;

        let solid: Solid = builder::tsweep(&truck_face, sweep_vec);
        let solid = orient_outward(solid)?;
        Ok(self.store_solid(solid))
    }

    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.cloned_solid(a)?;
        let solid_b = self.cloned_solid(b)?;

        let result = truck_shapeops::or(&solid_a, &solid_b, BOOLEAN_TOLERANCE).ok_or_else(|| {
            KernelError::BooleanFailed {
                reason: "truck or() returned None".to_string(),
            }
        })?;
        Ok(self.store_solid(result))
    }

    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.cloned_solid(a)?;
        let mut solid_b = self.cloned_solid(b)?;

        // Subtraction = A ∩ ¬B. not() mutates in place.
        solid_b.not();
        let result = truck_shapeops::and(&solid_a, &solid_b, BOOLEAN_TOLERANCE).ok_or_else(|| {
            KernelError::BooleanFailed {
                reason: "truck and() returned None for subtraction".to_string(),
            }
        })?;
        Ok(self.store_solid(result))
    }

    fn boolean_intersect(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError> {
        let solid_a = self.cloned_solid(a)?;
        let solid_b = self.cloned_solid(b)?;

        let result = truck_shapeops::and(&solid_a, &solid_b, BOOLEAN_TOLERANCE).ok_or_else(|| {
            KernelError::BooleanFailed {
                reason: "truck and() returned None".to_string(),
            }
        })?;
        Ok(self.store_solid(result))
    }

    fn fillet_edges(
        &mut self,
        _solid: &KernelSolidHandle,
        _edges: &[KernelId],
        _radius: f64,
    ) -> Result<KernelSolidHandle, KernelError> {
        Err(KernelError::NotSupported {
            operation: "fillet_edges".to_string(),
        })
    }

    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError> {
        let truck_solid = self
            .get_solid(solid)
            .ok_or_else(|| KernelError::missing_solid(solid))?;
        tessellation::tessellate_solid(truck_solid, solid.id(), tolerance)
    }

    fn volume(&mut self, solid: &KernelSolidHandle) -> Result<f64, KernelError> {
        let truck_solid = self
            .get_solid(solid)
            .ok_or_else(|| KernelError::missing_solid(solid))?;
        let mesh = tessellation::tessellate_solid(truck_solid, solid.id(), 0.01)?;
        Ok(mesh.signed_volume().max(0.0))
    }
}

impl KernelExport for TruckKernel {
    fn export_step(&self, solid: &KernelSolidHandle, name: &str) -> Result<String, KernelError> {
        use truck_stepio::out;

        let truck_solid = self
            .get_solid(solid)
            .ok_or_else(|| KernelError::missing_solid(solid))?;
        let compressed = truck_solid.compress();
        let display = out::CompleteStepDisplay::new(
            out::StepModel::from(&compressed),
            out::StepHeaderDescriptor {
                organization_system: format!("keycap-forge ({name})"),
                ..Default::default()
            },
        );
        Ok(display.to_string())
    }

    fn export_brep(&self, solid: &KernelSolidHandle) -> Result<Vec<u8>, KernelError> {
        let truck_solid = self
            .get_solid(solid)
            .ok_or_else(|| KernelError::missing_solid(solid))?;
        serde_json::to_vec(&truck_solid.compress()).map_err(|e| KernelError::ExportFailed {
            reason: e.to_string(),
        })
    }
}
