use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use geom_kernel::TruckKernel;
use indicatif::{ProgressBar, ProgressStyle};
use keycap_cli::{load_jobs, run_batch, Args};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("configuring worker threads")?;
    }

    let (jobs, unresolved) = load_jobs(&args.config_root, &args.style, &args.layout)?;

    let progress = ProgressBar::new(jobs.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} keys [{elapsed_precise}]")?
            .progress_chars("=> "),
    );
    let summary = run_batch(
        &jobs,
        TruckKernel::new,
        args.format,
        &args.output,
        args.preview,
        &progress,
    );
    progress.finish_and_clear();

    let failed = summary.failed.len() + unresolved.len();
    info!(
        written = summary.written.len(),
        unrounded = summary.unrounded.len(),
        failed,
        output = %args.output.display(),
        "done"
    );
    if !summary.unrounded.is_empty() {
        warn!(keys = ?summary.unrounded, "kernel cannot fillet, these keys have sharp edges");
    }
    if failed > 0 {
        for key in unresolved.iter().chain(&summary.failed) {
            warn!(key = %key, "not generated");
        }
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
