use geom_kernel::{KernelBundle, KernelSolidHandle};
use keycap_types::{Plane, Wire2d};

use crate::types::OpError;

/// Place `outline` on `plane` and extrude it along the plane normal.
pub fn extrude_profile(
    kb: &mut dyn KernelBundle,
    outline: &Wire2d,
    plane: &Plane,
    depth: f64,
) -> Result<KernelSolidHandle, OpError> {
    if !depth.is_finite() || depth <= 0.0 {
        return Err(OpError::InvalidParameter {
            reason: format!("extrusion depth must be positive, got {depth}"),
        });
    }
    let face = kb.make_face(outline, plane)?;
    Ok(kb.extrude_face(face, plane.normal, depth)?)
}

/// Loft a solid through `outline_a` on `plane_a` and `outline_b` on `plane_b`.
pub fn loft_profiles(
    kb: &mut dyn KernelBundle,
    (outline_a, plane_a): (&Wire2d, &Plane),
    (outline_b, plane_b): (&Wire2d, &Plane),
) -> Result<KernelSolidHandle, OpError> {
    let a = kb.make_face(outline_a, plane_a)?;
    let b = kb.make_face(outline_b, plane_b)?;
    Ok(kb.loft(&[a, b])?)
}
