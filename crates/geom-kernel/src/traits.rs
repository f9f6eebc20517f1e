use crate::types::*;
use keycap_types::{Plane, Wire2d};

/// Core geometry kernel trait. Provides the shape construction and
/// modification operations the keycap pipeline needs.
/// Implemented by TruckKernel (wraps real truck) and MockKernel (deterministic test double).
pub trait Kernel {
    /// Build a planar face from a closed outline placed on `plane`.
    /// The face is held standalone until consumed by `loft` or `extrude_face`.
    fn make_face(&mut self, outline: &Wire2d, plane: &Plane) -> Result<KernelId, KernelError>;

    /// Loft a solid through two or more standalone faces, in order.
    /// Consecutive sections must have the same number of boundary edges.
    fn loft(&mut self, sections: &[KernelId]) -> Result<KernelSolidHandle, KernelError>;

    /// Extrude a standalone planar face along a direction vector.
    fn extrude_face(
        &mut self,
        face: KernelId,
        direction: [f64; 3],
        depth: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Boolean union of two solids.
    fn boolean_union(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Boolean subtraction: a minus b.
    fn boolean_subtract(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Boolean intersection of two solids.
    fn boolean_intersect(
        &mut self,
        a: &KernelSolidHandle,
        b: &KernelSolidHandle,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Fillet (round) the specified edges with the given radius.
    fn fillet_edges(
        &mut self,
        solid: &KernelSolidHandle,
        edges: &[KernelId],
        radius: f64,
    ) -> Result<KernelSolidHandle, KernelError>;

    /// Tessellate a solid to a triangle mesh.
    fn tessellate(
        &mut self,
        solid: &KernelSolidHandle,
        tolerance: f64,
    ) -> Result<RenderMesh, KernelError>;

    /// Enclosed volume of a solid. Zero for an empty result.
    fn volume(&mut self, solid: &KernelSolidHandle) -> Result<f64, KernelError>;
}

/// Topology introspection trait. Provides read-only queries on kernel geometry.
pub trait KernelIntrospect {
    /// List all faces of a solid.
    fn list_faces(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// List all edges of a solid.
    fn list_edges(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// List all vertices of a solid.
    fn list_vertices(&self, solid: &KernelSolidHandle) -> Vec<KernelId>;

    /// Get the edges bounding a face.
    fn face_edges(&self, face: KernelId) -> Vec<KernelId>;

    /// Get the faces adjacent to an edge.
    fn edge_faces(&self, edge: KernelId) -> Vec<KernelId>;

    /// Compute the geometric signature of a single entity.
    fn compute_signature(&self, entity: KernelId, kind: TopoKind) -> TopoSignature;

    /// Compute signatures for all entities of a given kind in a solid.
    fn compute_all_signatures(
        &self,
        solid: &KernelSolidHandle,
        kind: TopoKind,
    ) -> Vec<(KernelId, TopoSignature)>;
}

/// Serialization of finished solids into exchange formats.
pub trait KernelExport {
    /// ISO 10303-21 (STEP) text for a solid.
    fn export_step(&self, solid: &KernelSolidHandle, name: &str) -> Result<String, KernelError>;

    /// Native boundary representation dump of a solid.
    fn export_brep(&self, solid: &KernelSolidHandle) -> Result<Vec<u8>, KernelError>;
}

/// Everything the keycap pipeline needs from a kernel in one object.
pub trait KernelBundle: Kernel + KernelIntrospect + KernelExport {
    fn as_introspect(&self) -> &dyn KernelIntrospect;
}

impl<T: Kernel + KernelIntrospect + KernelExport> KernelBundle for T {
    fn as_introspect(&self) -> &dyn KernelIntrospect {
        self
    }
}
