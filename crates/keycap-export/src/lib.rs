//! Turning finished keycap solids into files.
//!
//! Mesh formats (STL, 3MF) go through the kernel's tessellator at
//! [`MESH_TOLERANCE`]. STEP and BREP are written straight from the
//! kernel's boundary representation.

mod error;
mod format;
mod stl;
mod threemf;

use std::fs;
use std::path::{Path, PathBuf};

use geom_kernel::{KernelBundle, KernelSolidHandle, RenderMesh};
use tracing::debug;

pub use error::ExportError;
pub use format::ExportFormat;
pub use stl::binary_stl;
pub use threemf::{model_xml, three_mf};

/// Chordal tolerance for exported meshes, in millimetres. The angular
/// tolerance of 0.1 rad is fixed by the tessellator.
pub const MESH_TOLERANCE: f64 = 0.001;

/// Coarser tolerance for quick preview meshes.
pub const PREVIEW_TOLERANCE: f64 = 0.05;

/// Serialize `solid` in `format`. `name` ends up in the STL header, the
/// STEP product name or the 3MF object name.
pub fn export_solid(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    format: ExportFormat,
    name: &str,
) -> Result<Vec<u8>, ExportError> {
    let bytes = if format.is_mesh() {
        let mesh = kb.tessellate(solid, MESH_TOLERANCE)?;
        debug!(triangles = mesh.triangle_count(), "tessellated");
        match format {
            ExportFormat::ThreeMf => three_mf(&mesh, name)?,
            _ => binary_stl(&mesh, name)?,
        }
    } else {
        match format {
            ExportFormat::Step => kb.export_step(solid, name)?.into_bytes(),
            _ => kb.export_brep(solid)?,
        }
    };
    debug!(%format, name, bytes = bytes.len(), "exported solid");
    Ok(bytes)
}

/// Write `solid` to `<dir>/<key_id>.<ext>`, creating `dir` if needed.
pub fn write_solid(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    format: ExportFormat,
    dir: &Path,
    key_id: &str,
) -> Result<PathBuf, ExportError> {
    let bytes = export_solid(kb, solid, format, key_id)?;
    let path = dir.join(format!("{key_id}.{}", format.extension()));
    write_bytes(dir, &path, &bytes)?;
    Ok(path)
}

/// Tessellate at [`PREVIEW_TOLERANCE`].
pub fn preview_mesh(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
) -> Result<RenderMesh, ExportError> {
    Ok(kb.tessellate(solid, PREVIEW_TOLERANCE)?)
}

/// Write a coarse STL preview to `<dir>/<key_id>.preview.stl`.
pub fn write_preview(
    kb: &mut dyn KernelBundle,
    solid: &KernelSolidHandle,
    dir: &Path,
    key_id: &str,
) -> Result<PathBuf, ExportError> {
    let mesh = preview_mesh(kb, solid)?;
    let bytes = binary_stl(&mesh, key_id)?;
    let path = dir.join(format!("{key_id}.preview.stl"));
    write_bytes(dir, &path, &bytes)?;
    Ok(path)
}

fn write_bytes(dir: &Path, path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "wrote file");
    Ok(())
}
