//! Switch stems.
//!
//! Every variant builds its solid from Z = 0 up and knows which edges of the
//! assembled key should take the interior fillet.

use std::fmt::Debug;

use geom_kernel::{KernelBundle, KernelId, KernelIntrospect, KernelSolidHandle, TopoKind};
use keycap_config::{FormalStem, MinimalStem, ReinforcedStem, StemSpec};
use keycap_types::{mirrored_quarter, nearest_vertices, rounded_polygon, Axis, Plane, Point2, Wire2d};
use tracing::{debug, instrument};

use crate::boolean::{combine, BooleanKind};
use crate::extrude::extrude_profile;
use crate::geometry::{KeyGeometry, CUT_OVERSHOOT};
use crate::select::{filter_parallel, group_by_axis, Selection, LAYER_TOLERANCE};
use crate::types::OpError;

/// How far every stem reaches into the top filler past its underside.
const STEM_EMBED: f64 = 0.1;

/// Index of the Z-layer of horizontal faces that carries the interior
/// fillet edges: above the mounting face and the first step.
const INNER_FILLET_LAYER: usize = 2;

/// Key values a stem needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StemContext {
    pub wall: f64,
    pub inner_radius: f64,
    /// The key's stem reach, tolerance included.
    pub stem_reach: f64,
}

impl StemContext {
    pub fn new(geom: &KeyGeometry) -> Self {
        Self {
            wall: geom.config.wall,
            inner_radius: geom.config.inner_radius,
            stem_reach: geom.stem_reach,
        }
    }
}

pub trait Stem: Debug + Send + Sync {
    /// Configuration name of the variant.
    fn kind(&self) -> &'static str;

    /// Build the stem solid, standing on Z = 0.
    fn build(
        &self,
        kb: &mut dyn KernelBundle,
        ctx: &StemContext,
    ) -> Result<KernelSolidHandle, OpError>;

    /// Edges of the assembled key that take the interior fillet.
    fn select_inner_radius_edges(
        &self,
        introspect: &dyn KernelIntrospect,
        solid: &KernelSolidHandle,
    ) -> Result<Vec<KernelId>, OpError>;
}

/// Instantiate the stem variant named by `spec`.
pub fn stem_for(spec: &StemSpec) -> Box<dyn Stem> {
    match spec {
        StemSpec::Minimal(s) => Box::new(Minimal(s.clone())),
        StemSpec::Formal(s) => Box::new(Formal(s.clone())),
        StemSpec::Reinforced(s) => Box::new(Reinforced(s.clone())),
    }
}

/// The plus-shaped switch slot, one quarter drawn from the -u axis round to
/// the +v axis and mirrored.
fn cross_outline(
    cross_length: f64,
    cross_thickness: f64,
    tolerance: f64,
) -> Result<Wire2d, OpError> {
    let a = (cross_length + tolerance) / 2.0;
    let t = (cross_thickness + tolerance) / 2.0;
    let quarter: [Point2; 5] = [[-a, 0.0], [-a, t], [-t, t], [-t, a], [0.0, a]];
    Ok(mirrored_quarter(&quarter)?)
}

/// Horizontal faces of `solid` grouped into Z layers, lowest first.
fn horizontal_face_layers(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
) -> Vec<Selection> {
    let faces = introspect.compute_all_signatures(solid, TopoKind::Face);
    group_by_axis(filter_parallel(faces, Axis::Z), Axis::Z, LAYER_TOLERANCE)
}

fn inner_fillet_layer(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
) -> Result<Selection, OpError> {
    let mut layers = horizontal_face_layers(introspect, solid);
    if layers.len() <= INNER_FILLET_LAYER {
        return Err(OpError::SelectionEmpty {
            what: format!(
                "horizontal face layer {INNER_FILLET_LAYER} (solid has {})",
                layers.len()
            ),
        });
    }
    Ok(layers.swap_remove(INNER_FILLET_LAYER))
}

fn edges_of(introspect: &dyn KernelIntrospect, faces: &Selection) -> Vec<KernelId> {
    let mut out: Vec<KernelId> = Vec::new();
    for (face, _) in faces {
        for edge in introspect.face_edges(*face) {
            if !out.contains(&edge) {
                out.push(edge);
            }
        }
    }
    out
}

/// Top of every stem: the key's stem reach plus the plinth band, sunk into
/// the filler.
fn stem_top(ctx: &StemContext) -> f64 {
    ctx.stem_reach + ctx.inner_radius + STEM_EMBED
}

/// Rounded block with the slot cut through it. The default.
///
/// Under a positive inner radius the slot stops that far below the top,
/// leaving a solid plinth band for the interior fillet to land on.
#[derive(Debug, Clone, PartialEq)]
pub struct Minimal(pub MinimalStem);

impl Minimal {
    fn block_outline(&self, ctx: &StemContext) -> Result<Wire2d, OpError> {
        let s = &self.0;
        Ok(Wire2d::rounded_rectangle(
            [0.0, 0.0],
            s.cross_length + s.tolerance + 2.0 * ctx.wall,
            s.cross_length,
            ctx.wall,
        )?)
    }

    /// The plus slot. Its Y arms run [`CUT_OVERSHOOT`] out through the
    /// block's front and back faces; every corner inside the block is rounded
    /// by `corner_radius`.
    fn slot_outline(&self) -> Result<Wire2d, OpError> {
        let s = &self.0;
        let a = (s.cross_length + s.tolerance) / 2.0;
        let t = (s.cross_thickness + s.tolerance) / 2.0;
        let exit = s.cross_length / 2.0 + CUT_OVERSHOOT;
        let quarter: [Point2; 5] = [[-a, 0.0], [-a, t], [-t, t], [-t, exit], [0.0, exit]];
        let plus = mirrored_quarter(&quarter)?;
        if s.corner_radius <= 0.0 {
            return Ok(plus);
        }
        let points = plus.vertices();
        let inside: Vec<usize> = (0..points.len())
            .filter(|&i| points[i][1].abs() < exit - 1e-9)
            .collect();
        Ok(rounded_polygon(&points, &inside, s.corner_radius)?)
    }
}

impl Stem for Minimal {
    fn kind(&self) -> &'static str {
        "minimal"
    }

    #[instrument(skip(self, kb), fields(kind = "minimal"))]
    fn build(
        &self,
        kb: &mut dyn KernelBundle,
        ctx: &StemContext,
    ) -> Result<KernelSolidHandle, OpError> {
        let top = stem_top(ctx);
        let block = extrude_profile(kb, &self.block_outline(ctx)?, &Plane::xy(), top)?;

        let ceiling = if ctx.inner_radius > 0.0 {
            top - ctx.inner_radius
        } else {
            top + CUT_OVERSHOOT
        };
        let slot_plane = Plane::xy().offset(-CUT_OVERSHOOT);
        let slot = extrude_profile(kb, &self.slot_outline()?, &slot_plane, ceiling + CUT_OVERSHOOT)?;
        combine(kb, &block, &slot, BooleanKind::Subtract)
    }

    fn select_inner_radius_edges(
        &self,
        introspect: &dyn KernelIntrospect,
        solid: &KernelSolidHandle,
    ) -> Result<Vec<KernelId>, OpError> {
        let layer = inner_fillet_layer(introspect, solid)?;
        let first: Selection = layer.into_iter().take(1).collect();
        let edges = edges_of(introspect, &first);
        debug!(edges = edges.len(), "minimal stem inner fillet edges");
        Ok(edges)
    }
}

/// The slot shared by the round stems: two crossed bars whose four inside
/// corners are rounded.
fn rounded_cross(s: &FormalStem) -> Result<Wire2d, OpError> {
    let plus = cross_outline(s.cross_length, s.cross_thickness, s.tolerance)?;
    if s.corner_radius <= 0.0 {
        return Ok(plus);
    }
    let points = plus.vertices();
    let inside = nearest_vertices(&points, [0.0, 0.0], 4);
    Ok(rounded_polygon(&points, &inside, s.corner_radius)?)
}

/// Cut the rounded cross into `body` up to the stem's own reach.
fn cut_cross(
    kb: &mut dyn KernelBundle,
    s: &FormalStem,
    body: &KernelSolidHandle,
) -> Result<KernelSolidHandle, OpError> {
    let slot_outline = rounded_cross(s)?;
    let slot_plane = Plane::xy().offset(-CUT_OVERSHOOT);
    let slot = extrude_profile(kb, &slot_outline, &slot_plane, s.stem_reach + CUT_OVERSHOOT)?;
    combine(kb, body, &slot, BooleanKind::Subtract)
}

fn round_stem_edges(
    introspect: &dyn KernelIntrospect,
    solid: &KernelSolidHandle,
) -> Result<Vec<KernelId>, OpError> {
    let layer = inner_fillet_layer(introspect, solid)?;
    let edges = edges_of(introspect, &layer);
    debug!(faces = layer.len(), edges = edges.len(), "round stem inner fillet edges");
    Ok(edges)
}

/// Round post with a rounded cross slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Formal(pub FormalStem);

impl Stem for Formal {
    fn kind(&self) -> &'static str {
        "formal"
    }

    #[instrument(skip(self, kb), fields(kind = "formal"))]
    fn build(
        &self,
        kb: &mut dyn KernelBundle,
        ctx: &StemContext,
    ) -> Result<KernelSolidHandle, OpError> {
        let circle = Wire2d::circle([0.0, 0.0], self.0.stem_radius)?;
        let post = extrude_profile(kb, &circle, &Plane::xy(), stem_top(ctx))?;
        cut_cross(kb, &self.0, &post)
    }

    fn select_inner_radius_edges(
        &self,
        introspect: &dyn KernelIntrospect,
        solid: &KernelSolidHandle,
    ) -> Result<Vec<KernelId>, OpError> {
        round_stem_edges(introspect, solid)
    }
}

/// Round post braced by a rounded rectangular collar.
#[derive(Debug, Clone, PartialEq)]
pub struct Reinforced(pub ReinforcedStem);

impl Stem for Reinforced {
    fn kind(&self) -> &'static str {
        "reinforced"
    }

    #[instrument(skip(self, kb), fields(kind = "reinforced"))]
    fn build(
        &self,
        kb: &mut dyn KernelBundle,
        ctx: &StemContext,
    ) -> Result<KernelSolidHandle, OpError> {
        let s = &self.0;
        let top = stem_top(ctx);
        let radius = s.formal.stem_radius;
        let circle = Wire2d::circle([0.0, 0.0], radius)?;
        let collar_outline = Wire2d::rounded_rectangle(
            [0.0, 0.0],
            s.collar_width,
            s.collar_height,
            s.collar_radius,
        )?;

        // Post and collar caps are staggered past both ends, then trimmed to
        // [0, top] together.
        let post_plane = Plane::xy().offset(-2.0 * CUT_OVERSHOOT);
        let post = extrude_profile(kb, &circle, &post_plane, top + 4.0 * CUT_OVERSHOOT)?;
        let collar_plane = Plane::xy().offset(-CUT_OVERSHOOT);
        let collar =
            extrude_profile(kb, &collar_outline, &collar_plane, top + 2.0 * CUT_OVERSHOOT)?;
        let braced = combine(kb, &post, &collar, BooleanKind::Union)?;

        let span = Wire2d::rectangle(
            [0.0, 0.0],
            s.collar_width.max(2.0 * radius) + 2.0 * CUT_OVERSHOOT,
            s.collar_height.max(2.0 * radius) + 2.0 * CUT_OVERSHOOT,
        )?;
        let slab = extrude_profile(kb, &span, &Plane::xy(), top)?;
        let trimmed = combine(kb, &braced, &slab, BooleanKind::Intersect)?;
        cut_cross(kb, &s.formal, &trimmed)
    }

    fn select_inner_radius_edges(
        &self,
        introspect: &dyn KernelIntrospect,
        solid: &KernelSolidHandle,
    ) -> Result<Vec<KernelId>, OpError> {
        round_stem_edges(introspect, solid)
    }
}
