use geom_kernel::{KernelBundle, KernelSolidHandle};
use keycap_types::{Plane, Wire2d};
use tracing::instrument;

use crate::extrude::extrude_profile;
use crate::geometry::KeyGeometry;
use crate::types::OpError;

pub const BUMP_WIDTH: f64 = 6.0;
pub const BUMP_DEPTH: f64 = 2.0;
pub const BUMP_CORNER_RADIUS: f64 = 0.999;
/// Distance kept between the bump and the top of the key at the front.
pub const BUMP_TOP_CLEARANCE: f64 = 2.0;

/// Tactile homing bump: a rounded bar under the front of the key top,
/// rising from just above the filler base.
///
/// On keys too low for the clearance the rise comes out negative and the bar
/// hangs below the baseline by that amount instead.
#[instrument(skip(kb, geom))]
pub fn bump(kb: &mut dyn KernelBundle, geom: &KeyGeometry) -> Result<KernelSolidHandle, OpError> {
    let baseline = geom.filler_base() + geom.eps;
    let rise = geom.max_front_height - baseline - BUMP_TOP_CLEARANCE;
    if rise.abs() <= geom.eps {
        return Err(OpError::InvalidParameter {
            reason: format!(
                "bump would be flat: front height {} leaves {rise:.3} above the filler",
                geom.max_front_height
            ),
        });
    }
    let bottom = baseline + rise.min(0.0);
    let outline = Wire2d::rounded_rectangle(
        [0.0, -0.2 * geom.height()],
        BUMP_WIDTH,
        BUMP_DEPTH,
        BUMP_CORNER_RADIUS,
    )?;
    extrude_profile(kb, &outline, &Plane::xy().offset(bottom), rise.abs())
}
