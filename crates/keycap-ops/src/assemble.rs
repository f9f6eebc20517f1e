use geom_kernel::{KernelBundle, KernelSolidHandle};
use keycap_config::KeyConfig;
use tracing::{debug, info, instrument};

use crate::boolean::{combine, union_all, BooleanKind};
use crate::bump::bump;
use crate::fillet::round_edges_if_supported;
use crate::geometry::KeyGeometry;
use crate::profile::rounded_outer;
use crate::shell::{filler_bound, shell, top_filler};
use crate::stem::{stem_for, Stem, StemContext};
use crate::types::OpError;

/// A built key and the fillet passes the kernel had to leave out.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltKey {
    pub solid: KernelSolidHandle,
    /// Names of the skipped passes, `"outer"` and `"interior"`.
    pub unrounded: Vec<&'static str>,
}

/// A complete keycap, ready to be built against a kernel.
#[derive(Debug)]
pub struct Keycap {
    geometry: KeyGeometry,
    stem: Box<dyn Stem>,
}

impl Keycap {
    pub fn new(config: &KeyConfig) -> Self {
        Self {
            geometry: KeyGeometry::new(config),
            stem: stem_for(&config.stem),
        }
    }

    pub fn geometry(&self) -> &KeyGeometry {
        &self.geometry
    }

    pub fn stem(&self) -> &dyn Stem {
        self.stem.as_ref()
    }

    /// Build the key: hollow shell, solid top, stem, interior fillet and
    /// the optional bump, in that order.
    pub fn shape(&self, kb: &mut dyn KernelBundle) -> Result<KernelSolidHandle, OpError> {
        Ok(self.build(kb)?.solid)
    }

    /// [`Keycap::shape`], also reporting which fillet passes the kernel
    /// could not perform.
    #[instrument(skip_all, fields(stem = self.stem.kind(), bump = self.geometry.config.bump))]
    pub fn build(&self, kb: &mut dyn KernelBundle) -> Result<BuiltKey, OpError> {
        let geom = &self.geometry;
        let mut unrounded = Vec::new();

        let outer = rounded_outer(kb, geom, 0.0)?;
        if outer.is_skipped() {
            unrounded.push("outer");
        }
        let hollow = shell(kb, geom, outer.solid())?;
        let bound = filler_bound(kb, geom)?;
        let filler = top_filler(kb, geom, &bound)?;
        let stem = self.stem.build(kb, &StemContext::new(geom))?;
        let mut shape = union_all(kb, &[hollow, filler, stem])?;

        let inner_radius = geom.config.inner_radius;
        if inner_radius > 0.0 {
            let edges = self
                .stem
                .select_inner_radius_edges(kb.as_introspect(), &shape)?;
            debug!(edges = edges.len(), "interior fillet");
            let rounding =
                round_edges_if_supported(kb, &shape, &edges, inner_radius - geom.eps, "interior")?;
            if rounding.is_skipped() {
                unrounded.push("interior");
            }
            shape = rounding.into_solid();
        }

        if geom.config.bump {
            let bump = bump(kb, geom)?;
            shape = combine(kb, &shape, &bump, BooleanKind::Union)?;
        }

        info!(faces = kb.list_faces(&shape).len(), ?unrounded, "keycap built");
        Ok(BuiltKey {
            solid: shape,
            unrounded,
        })
    }
}
