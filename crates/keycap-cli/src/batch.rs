//! Resolving a layout into per-key jobs and building them in parallel.
//!
//! Every key is built against its own kernel. A key that fails to resolve
//! or to build is logged with its id and parameters and counted, but never
//! stops the rest of the batch.

use std::path::{Path, PathBuf};

use anyhow::Context;
use geom_kernel::KernelBundle;
use indicatif::ProgressBar;
use keycap_config::{locate, DocKind, KeyConfig, LayoutDoc, StyleDoc};
use keycap_export::{write_preview, write_solid, ExportFormat};
use keycap_ops::Keycap;
use rayon::prelude::*;
use tracing::{debug, error, info, info_span, warn};

/// One resolved key, ready to build.
#[derive(Debug, Clone)]
pub struct Job {
    pub key_id: String,
    pub config: KeyConfig,
}

/// The result of building one key.
#[derive(Debug)]
pub enum Outcome {
    Written {
        key_id: String,
        path: PathBuf,
        /// Fillet passes the kernel left out, e.g. `"outer"`.
        unrounded: Vec<&'static str>,
    },
    Failed {
        key_id: String,
        reason: String,
    },
}

/// Totals for a batch run.
#[derive(Debug, Default)]
pub struct Summary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<String>,
    /// Written keys with sharp edges where fillets were asked for.
    pub unrounded: Vec<String>,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Written {
                key_id,
                path,
                unrounded,
            } => {
                if !unrounded.is_empty() {
                    self.unrounded.push(key_id);
                }
                self.written.push(path);
            }
            Outcome::Failed { key_id, .. } => self.failed.push(key_id),
        }
    }
}

/// Load the style and layout and resolve every key in layout order.
///
/// Missing or unparseable documents abort with an error. Keys whose
/// parameters do not resolve are logged and returned in the second list.
pub fn load_jobs(
    config_root: &Path,
    style: &str,
    layout: &str,
) -> anyhow::Result<(Vec<Job>, Vec<String>)> {
    let style_path = locate(config_root, DocKind::Style, style)
        .with_context(|| format!("style `{style}`"))?;
    let layout_path = locate(config_root, DocKind::Layout, layout)
        .with_context(|| format!("layout `{layout}`"))?;
    let style_doc = StyleDoc::load(&style_path)?;
    let layout_doc = LayoutDoc::load(&layout_path)?;
    info!(
        style = %style_path.display(),
        layout = %layout_path.display(),
        keys = layout_doc.keys.len(),
        "loaded configuration"
    );

    let mut jobs = Vec::with_capacity(layout_doc.keys.len());
    let mut failed = Vec::new();
    for (key_id, entry) in &layout_doc.keys {
        match style_doc.resolve(key_id, entry) {
            Ok(config) => jobs.push(Job {
                key_id: key_id.clone(),
                config,
            }),
            Err(err) => {
                error!(key = %key_id, entry = ?entry, error = %err, "key did not resolve");
                failed.push(key_id.clone());
            }
        }
    }
    Ok((jobs, failed))
}

/// Build and write every job, one kernel per key from `make_kernel`.
pub fn run_batch<K, F>(
    jobs: &[Job],
    make_kernel: F,
    format: ExportFormat,
    out_dir: &Path,
    preview: bool,
    progress: &ProgressBar,
) -> Summary
where
    K: KernelBundle,
    F: Fn() -> K + Sync,
{
    let outcomes: Vec<Outcome> = jobs
        .par_iter()
        .map(|job| {
            let mut kernel = make_kernel();
            let outcome = build_one(&mut kernel, job, format, out_dir, preview);
            progress.inc(1);
            outcome
        })
        .collect();

    let mut summary = Summary::default();
    for outcome in outcomes {
        summary.record(outcome);
    }
    summary
}

fn build_one(
    kb: &mut dyn KernelBundle,
    job: &Job,
    format: ExportFormat,
    out_dir: &Path,
    preview: bool,
) -> Outcome {
    let _span = info_span!("key", id = %job.key_id).entered();
    match try_build(kb, job, format, out_dir, preview) {
        Ok((path, unrounded)) => {
            if unrounded.is_empty() {
                debug!(path = %path.display(), "written");
            } else {
                warn!(path = %path.display(), ?unrounded, "written without some fillets");
            }
            Outcome::Written {
                key_id: job.key_id.clone(),
                path,
                unrounded,
            }
        }
        Err(err) => {
            let reason = format!("{err:#}");
            error!(config = ?job.config, error = %reason, "key failed");
            Outcome::Failed {
                key_id: job.key_id.clone(),
                reason,
            }
        }
    }
}

fn try_build(
    kb: &mut dyn KernelBundle,
    job: &Job,
    format: ExportFormat,
    out_dir: &Path,
    preview: bool,
) -> anyhow::Result<(PathBuf, Vec<&'static str>)> {
    let built = Keycap::new(&job.config)
        .build(kb)
        .context("building geometry")?;
    let path = write_solid(kb, &built.solid, format, out_dir, &job.key_id)
        .with_context(|| format!("exporting {format}"))?;
    if preview {
        write_preview(kb, &built.solid, out_dir, &job.key_id).context("writing preview")?;
    }
    Ok((path, built.unrounded))
}
