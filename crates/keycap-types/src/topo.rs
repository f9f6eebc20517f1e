use serde::{Deserialize, Serialize};

use crate::geometry::Point3;

/// The kind of topological entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TopoKind {
    Vertex,
    Edge,
    Face,
}

/// Geometric signature of a topological entity, as reported by a kernel.
/// Selection predicates work on these rather than on kernel types.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopoSignature {
    /// Surface or curve type (planar, nurbs, line, curve, point).
    pub surface_type: Option<String>,
    /// Surface area (for faces).
    pub area: Option<f64>,
    /// Centroid position [x, y, z]. For edges, the curve's parametric midpoint.
    pub centroid: Option<Point3>,
    /// Outward-pointing normal at centroid (for planar faces).
    pub normal: Option<Point3>,
    /// Unit chord direction from start to end (for edges).
    pub direction: Option<Point3>,
    /// Axis-aligned bounding box [min_x, min_y, min_z, max_x, max_y, max_z].
    pub bbox: Option<[f64; 6]>,
    /// Edge length (for edges).
    pub length: Option<f64>,
}

impl TopoSignature {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_planar(&self) -> bool {
        self.surface_type.as_deref() == Some("planar")
    }

    pub fn is_line(&self) -> bool {
        self.surface_type.as_deref() == Some("line")
    }
}
