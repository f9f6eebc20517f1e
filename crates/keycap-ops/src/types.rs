use geom_kernel::KernelError;
use keycap_types::SketchError;

/// Errors from keycap construction steps.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OpError {
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("profile error: {0}")]
    Sketch(#[from] SketchError),

    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("selection is empty: {what}")]
    SelectionEmpty { what: String },
}
