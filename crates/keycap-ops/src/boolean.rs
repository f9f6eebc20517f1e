use geom_kernel::{KernelBundle, KernelSolidHandle};
use tracing::debug;

use crate::types::OpError;

/// Boolean operation type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanKind {
    Union,
    Subtract,
    Intersect,
}

/// Combine two solids. Neither operand is consumed.
pub fn combine(
    kb: &mut dyn KernelBundle,
    a: &KernelSolidHandle,
    b: &KernelSolidHandle,
    kind: BooleanKind,
) -> Result<KernelSolidHandle, OpError> {
    let handle = match kind {
        BooleanKind::Union => kb.boolean_union(a, b)?,
        BooleanKind::Subtract => kb.boolean_subtract(a, b)?,
        BooleanKind::Intersect => kb.boolean_intersect(a, b)?,
    };
    debug!(?kind, faces = kb.list_faces(&handle).len(), "boolean");
    Ok(handle)
}

/// Union of every solid in `parts`, left to right.
pub fn union_all(
    kb: &mut dyn KernelBundle,
    parts: &[KernelSolidHandle],
) -> Result<KernelSolidHandle, OpError> {
    let Some((first, rest)) = parts.split_first() else {
        return Err(OpError::InvalidParameter {
            reason: "nothing to unite".to_string(),
        });
    };
    let mut acc = first.clone();
    for part in rest {
        acc = combine(kb, &acc, part, BooleanKind::Union)?;
    }
    Ok(acc)
}
