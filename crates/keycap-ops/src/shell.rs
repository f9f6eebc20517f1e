use geom_kernel::{KernelBundle, KernelSolidHandle};
use keycap_types::{Plane, Wire2d};
use tracing::instrument;

use crate::boolean::{combine, BooleanKind};
use crate::extrude::extrude_profile;
use crate::geometry::KeyGeometry;
use crate::profile::{inner_profile, outer_profile};
use crate::types::OpError;

/// Hollow key body: `outer` minus the outer profile shrunk by the wall
/// thickness. Close to a uniform inward offset, but not exact on sloped or
/// curved faces.
#[instrument(skip(kb, geom, outer))]
pub fn shell(
    kb: &mut dyn KernelBundle,
    geom: &KeyGeometry,
    outer: &KernelSolidHandle,
) -> Result<KernelSolidHandle, OpError> {
    let inner = inner_profile(kb, geom)?;
    combine(kb, outer, &inner, BooleanKind::Subtract)
}

/// The outer profile shrunk by half the wall. It contains the cavity and
/// stays clear of the outer skin, so a filler cut from it merges with the
/// shell through the wall's middle.
pub fn filler_bound(
    kb: &mut dyn KernelBundle,
    geom: &KeyGeometry,
) -> Result<KernelSolidHandle, OpError> {
    outer_profile(kb, geom, -geom.config.wall / 2.0)
}

/// Solid top of the key from the filler base up, so the stem only spans the
/// switch reach. `bound` limits it sideways and from above.
#[instrument(skip(kb, geom, bound))]
pub fn top_filler(
    kb: &mut dyn KernelBundle,
    geom: &KeyGeometry,
    bound: &KernelSolidHandle,
) -> Result<KernelSolidHandle, OpError> {
    let footprint = Wire2d::rectangle([0.0, 0.0], 2.0 * geom.width, 2.0 * geom.height())?;
    let plane = Plane::xy().offset(geom.filler_base());
    let block = extrude_profile(kb, &footprint, &plane, geom.max_height)?;
    combine(kb, bound, &block, BooleanKind::Intersect)
}
