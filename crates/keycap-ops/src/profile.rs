//! The outer body of a key: two orthogonal lofts intersected, then rounded.
//!
//! Each loft runs [`LOFT_OVERLAP`] past the faces the other one contributes,
//! so the intersection never has to resolve coincident faces.

use geom_kernel::{KernelBundle, KernelSolidHandle, TopoKind};
use keycap_types::{Axis, Plane, Point2, Wire2d, WireBuilder};
use tracing::{debug, instrument};

use crate::boolean::{combine, BooleanKind};
use crate::extrude::loft_profiles;
use crate::fillet::{round_edges_if_supported, Rounding};
use crate::geometry::{KeyGeometry, CUT_OVERSHOOT};
use crate::select::{group_by_axis, merge, without_bottom_layer, LAYER_TOLERANCE};
use crate::types::OpError;

/// Margin by which one loft extends past the bounding faces of the other.
pub const LOFT_OVERLAP: f64 = 0.5;

/// Key dimensions after growing (positive) or shrinking (negative) by an
/// offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetDims {
    pub height: f64,
    pub width: f64,
    pub front_rise: f64,
    pub back_rise: f64,
    pub corner_radius: f64,
    /// Z of the underside. The key stands on Z = 0; cutting bodies reach
    /// below it.
    pub floor: f64,
}

impl OffsetDims {
    pub fn new(geom: &KeyGeometry, offset: f64) -> Self {
        let c = &geom.config;
        Self {
            height: c.height + 2.0 * offset,
            width: geom.width + 2.0 * offset,
            front_rise: c.front_rise + offset,
            back_rise: c.back_rise + offset,
            corner_radius: (c.corner_radius + offset).max(0.0),
            floor: 0.0,
        }
    }

    pub fn with_floor(self, floor: f64) -> Self {
        Self { floor, ..self }
    }

    /// Height span the lofts have to cover, overlap included.
    fn reach(&self, geom: &KeyGeometry) -> f64 {
        geom.max_height + self.floor.abs() + LOFT_OVERLAP
    }
}

/// Side view in the YZ plane: front edge at -Y leaning back by the front
/// slope, back edge at +Y leaning forward by the back slope. The slanted
/// edges carry on below the floor by [`LOFT_OVERLAP`].
pub fn side_profile(geom: &KeyGeometry, dims: &OffsetDims) -> Result<Wire2d, OpError> {
    let c = &geom.config;
    let h = dims.height;
    let front = geom.max_front_height;
    let back = geom.max_back_height;
    let bottom = dims.floor - LOFT_OVERLAP;
    let outline: [Point2; 4] = [
        [-h / 2.0 + c.front_slope.tan() * front, front],
        [-h / 2.0 + c.front_slope.tan() * bottom, bottom],
        [h / 2.0 - c.back_slope.tan() * bottom, bottom],
        [h / 2.0 - c.back_slope.tan() * back, back],
    ];
    Ok(Wire2d::polygon(&outline)?)
}

/// Rise heights projected onto the vertical planes at the front and back
/// edges, so both cross-sections meet the same sloped top.
pub fn projected_rises(geom: &KeyGeometry, dims: &OffsetDims) -> (f64, f64) {
    let c = &geom.config;
    let back_dx = c.back_slope.tan() * dims.back_rise;
    let front_dx = c.front_slope.tan() * dims.front_rise;
    let top_slope = (dims.front_rise - dims.back_rise) / (dims.height - front_dx - back_dx);
    let front = dims.front_rise + top_slope * front_dx;
    let back = dims.back_rise - top_slope * back_dx;
    (front, back)
}

/// Front or back view in an XZ plane, topped by a straight segment or, for
/// curvature above `eps`, an arc through both top corners whose midpoint
/// sits `curve` below them.
pub fn height_profile(
    geom: &KeyGeometry,
    width: f64,
    rise: f64,
    curve: f64,
) -> Result<Wire2d, OpError> {
    height_section(geom, width, rise, curve, 0.0)
}

fn height_section(
    geom: &KeyGeometry,
    width: f64,
    rise: f64,
    curve: f64,
    floor: f64,
) -> Result<Wire2d, OpError> {
    let tan = geom.config.side_slope.tan();
    let w = width / 2.0;
    let mut builder = WireBuilder::start_at([-w + tan * rise, rise])
        .line_to([-w + tan * floor, floor])
        .line_to([w - tan * floor, floor])
        .line_to([w - tan * rise, rise]);
    if curve.abs() > geom.eps {
        builder = builder.arc_close_through([0.0, rise - curve]);
    }
    Ok(builder.close()?)
}

/// Height section at depth fraction `t`: 0 is the front edge and 1 the back
/// edge. Rise and curvature are carried on linearly outside that range.
fn height_section_at(geom: &KeyGeometry, dims: &OffsetDims, t: f64) -> Result<Wire2d, OpError> {
    let c = &geom.config;
    let (front, back) = projected_rises(geom, dims);
    let rise = front + (back - front) * t;
    let curve = c.front_curve + (c.back_curve - c.front_curve) * t;
    height_section(geom, dims.width, rise, curve, dims.floor)
}

/// Intersection of the side and height lofts, edges still sharp.
pub fn outer_body(
    kb: &mut dyn KernelBundle,
    geom: &KeyGeometry,
    dims: &OffsetDims,
) -> Result<KernelSolidHandle, OpError> {
    if dims.height <= 0.0 || dims.width <= 0.0 {
        return Err(OpError::InvalidParameter {
            reason: format!("{} x {} leaves no key body", dims.width, dims.height),
        });
    }
    let c = &geom.config;
    let reach = dims.reach(geom);

    let side = side_profile(geom, dims)?;
    let half_span = dims.width / 2.0 + LOFT_OVERLAP + c.side_slope.tan().abs() * reach;
    let left = Plane::yz().offset(-half_span);
    let right = Plane::yz().offset(half_span);
    let side_loft = loft_profiles(kb, (&side, &left), (&side, &right))?;

    let lean = c.front_slope.tan().abs().max(c.back_slope.tan().abs());
    let half_depth = dims.height / 2.0 + LOFT_OVERLAP + lean * reach;
    let past = (half_depth - dims.height / 2.0) / dims.height;
    let back = height_section_at(geom, dims, 1.0 + past)?;
    let front = height_section_at(geom, dims, -past)?;
    // The XZ plane faces -Y, so a negative offset moves it towards +Y.
    let back_plane = Plane::xz().offset(-half_depth);
    let front_plane = Plane::xz().offset(half_depth);
    let height_loft = loft_profiles(kb, (&back, &back_plane), (&front, &front_plane))?;

    combine(kb, &side_loft, &height_loft, BooleanKind::Intersect)
}

/// Round every edge of `body` above the bottom layer by the offset corner
/// radius.
fn round_outer(
    kb: &mut dyn KernelBundle,
    body: &KernelSolidHandle,
    dims: &OffsetDims,
) -> Result<Rounding, OpError> {
    if dims.corner_radius <= 0.0 {
        return Ok(Rounding::Applied(body.clone()));
    }
    let edges = kb.compute_all_signatures(body, TopoKind::Edge);
    let layers = without_bottom_layer(group_by_axis(edges, Axis::Z, LAYER_TOLERANCE));
    let selected = merge(&layers);
    debug!(edges = selected.len(), radius = dims.corner_radius, "rounding outer edges");
    round_edges_if_supported(kb, body, &selected, dims.corner_radius, "outer")
}

/// Outer solid of the key grown by `offset` (negative shrinks), reporting
/// whether the kernel could round it.
#[instrument(skip(kb, geom))]
pub fn rounded_outer(
    kb: &mut dyn KernelBundle,
    geom: &KeyGeometry,
    offset: f64,
) -> Result<Rounding, OpError> {
    let dims = OffsetDims::new(geom, offset);
    let body = outer_body(kb, geom, &dims)?;
    round_outer(kb, &body, &dims)
}

/// Outer solid of the key grown by `offset` (negative shrinks).
pub fn outer_profile(
    kb: &mut dyn KernelBundle,
    geom: &KeyGeometry,
    offset: f64,
) -> Result<KernelSolidHandle, OpError> {
    Ok(rounded_outer(kb, geom, offset)?.into_solid())
}

/// The outer profile shrunk by the wall thickness, reaching
/// [`CUT_OVERSHOOT`] below the mounting face so it cuts clean through it.
#[instrument(skip(kb, geom), fields(wall = geom.config.wall))]
pub fn inner_profile(
    kb: &mut dyn KernelBundle,
    geom: &KeyGeometry,
) -> Result<KernelSolidHandle, OpError> {
    let dims = OffsetDims::new(geom, -geom.config.wall).with_floor(-CUT_OVERSHOOT);
    let body = outer_body(kb, geom, &dims)?;
    Ok(round_outer(kb, &body, &dims)?.into_solid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::tests::flat_config;
    use approx::assert_relative_eq;
    use keycap_types::Curve2d;

    #[test]
    fn test_flat_top_is_straight() {
        let geom = KeyGeometry::new(&flat_config());
        let wire = height_profile(&geom, 18.0, 8.0, 0.0005).unwrap();
        assert_eq!(wire.len(), 4);
        assert!(!wire.curves().iter().any(Curve2d::is_arc));
    }

    #[test]
    fn test_curved_top_is_arc_through_corners() {
        let geom = KeyGeometry::new(&flat_config());
        let wire = height_profile(&geom, 18.0, 8.0, 0.5).unwrap();
        assert_eq!(wire.len(), 4);
        let Curve2d::Arc { start, mid, end } = wire.curves()[3] else {
            panic!("closing curve should be an arc");
        };
        assert_eq!(start, [9.0, 8.0]);
        assert_eq!(mid, [0.0, 7.5]);
        assert_eq!(end, [-9.0, 8.0]);
    }

    #[test]
    fn test_side_slope_narrows_top() {
        let mut config = flat_config();
        config.side_slope = 10f64.to_radians();
        let geom = KeyGeometry::new(&config);
        let wire = height_profile(&geom, 18.0, 8.0, 0.0).unwrap();
        let dx = 10f64.to_radians().tan() * 8.0;
        assert_relative_eq!(wire.vertices()[0][0], -9.0 + dx);
    }

    #[test]
    fn test_projected_rises_equal_when_unsloped() {
        let geom = KeyGeometry::new(&flat_config());
        let dims = OffsetDims::new(&geom, 0.0);
        assert_eq!(projected_rises(&geom, &dims), (8.0, 8.0));
    }

    #[test]
    fn test_offset_applies_symmetrically() {
        let geom = KeyGeometry::new(&flat_config());
        let dims = OffsetDims::new(&geom, -1.5);
        assert_eq!(dims.height, 15.0);
        assert_eq!(dims.width, 15.0);
        assert_eq!(dims.front_rise, 6.5);
        assert_eq!(dims.back_rise, 6.5);
        assert_eq!(dims.corner_radius, 0.0);
        assert_eq!(dims.floor, 0.0);
    }

    #[test]
    fn test_side_profile_reaches_below_floor() {
        let mut config = flat_config();
        config.front_slope = 0.2;
        let geom = KeyGeometry::new(&config);
        let dims = OffsetDims::new(&geom, 0.0).with_floor(-CUT_OVERSHOOT);
        let v = side_profile(&geom, &dims).unwrap().vertices();
        let bottom = -CUT_OVERSHOOT - LOFT_OVERLAP;
        assert_relative_eq!(v[1][1], bottom);
        assert_relative_eq!(v[2][1], bottom);
        // The front edge keeps its lean below the floor.
        assert_relative_eq!(v[1][0], -9.0 + 0.2f64.tan() * bottom);
        assert_relative_eq!(v[2][0], 9.0);
    }

    #[test]
    fn test_height_sections_extend_rise_linearly() {
        let mut config = flat_config();
        config.back_rise = 10.0;
        let geom = KeyGeometry::new(&config);
        let dims = OffsetDims::new(&geom, 0.0);
        let past = height_section_at(&geom, &dims, 1.25).unwrap().vertices();
        assert_relative_eq!(past[0][1], 10.5);
        let before = height_section_at(&geom, &dims, -0.25).unwrap().vertices();
        assert_relative_eq!(before[0][1], 7.5);
        assert_eq!(before[1], [-9.0, 0.0]);
    }

    #[test]
    fn test_height_section_widens_below_floor_with_side_slope() {
        let mut config = flat_config();
        config.side_slope = 10f64.to_radians();
        let geom = KeyGeometry::new(&config);
        let wire = height_section(&geom, 18.0, 8.0, 0.0, -1.0).unwrap();
        let tan = 10f64.to_radians().tan();
        assert_relative_eq!(wire.vertices()[1][0], -9.0 - tan);
        assert_relative_eq!(wire.vertices()[2][0], 9.0 + tan);
        assert_eq!(wire.vertices()[1][1], -1.0);
    }

    #[test]
    fn test_side_profile_leans_with_slopes() {
        let mut config = flat_config();
        config.front_slope = 0.2;
        config.back_slope = 0.1;
        let geom = KeyGeometry::new(&config);
        let dims = OffsetDims::new(&geom, 0.0);
        let v = side_profile(&geom, &dims).unwrap().vertices();
        assert_relative_eq!(v[0][0], -9.0 + 0.2f64.tan() * 9.0);
        assert_relative_eq!(v[3][0], 9.0 - 0.1f64.tan() * 9.0);
    }
}
