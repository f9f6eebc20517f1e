use geom_kernel::{KernelBundle, KernelError, KernelId, KernelSolidHandle};
use tracing::{debug, warn};

use crate::types::OpError;

/// Outcome of a fillet pass that a kernel may not support.
#[derive(Debug, Clone, PartialEq)]
pub enum Rounding {
    Applied(KernelSolidHandle),
    /// The kernel cannot fillet; this is the input solid, still sharp.
    Skipped(KernelSolidHandle),
}

impl Rounding {
    pub fn solid(&self) -> &KernelSolidHandle {
        match self {
            Rounding::Applied(h) | Rounding::Skipped(h) => h,
        }
    }

    pub fn into_solid(self) -> KernelSolidHandle {
        match self {
            Rounding::Applied(h) | Rounding::Skipped(h) => h,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Rounding::Skipped(_))
    }
}

/// Round `edges` of `solid` by `radius`.
///
/// An empty edge list returns the input unchanged. Every kernel failure is
/// returned, `NotSupported` included.
pub fn round_edges(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    edges: &[KernelId],
    radius: f64,
    what: &str,
) -> Result<KernelSolidHandle, OpError> {
    if radius.is_nan() || radius <= 0.0 {
        return Err(OpError::InvalidParameter {
            reason: format!("{what} fillet radius must be positive, got {radius}"),
        });
    }
    if edges.is_empty() {
        debug!(what, "no edges to fillet");
        return Ok(solid.clone());
    }

    let handle = kb.fillet_edges(solid, edges, radius)?;
    debug!(what, edges = edges.len(), radius, "filleted");
    Ok(handle)
}

/// [`round_edges`], except that a kernel without fillet support leaves the
/// solid sharp with a warning instead of failing.
pub fn round_edges_if_supported(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    edges: &[KernelId],
    radius: f64,
    what: &str,
) -> Result<Rounding, OpError> {
    match round_edges(kb, solid, edges, radius, what) {
        Ok(handle) => Ok(Rounding::Applied(handle)),
        Err(OpError::Kernel(KernelError::NotSupported { operation })) => {
            warn!(what, edges = edges.len(), radius, %operation, "kernel cannot fillet, keeping sharp edges");
            Ok(Rounding::Skipped(solid.clone()))
        }
        Err(err) => Err(err),
    }
}
