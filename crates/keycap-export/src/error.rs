use std::path::PathBuf;

use geom_kernel::KernelError;

/// Errors while turning a solid into file contents.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to package 3MF archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("failed to write XML: {reason}")]
    Xml { reason: String },

    #[error("mesh is empty: {reason}")]
    EmptyMesh { reason: String },

    #[error("unknown export format `{0}` (expected stl, brep, step or 3mf)")]
    UnknownFormat(String),
}
