//! Batch generation for the `keycap-forge` binary.

pub mod args;
pub mod batch;

pub use args::Args;
pub use batch::{load_jobs, run_batch, Job, Outcome, Summary};
