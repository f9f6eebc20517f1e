use std::path::PathBuf;

use clap::Parser;
use keycap_export::ExportFormat;

/// Generate printable keycaps from a style and a layout.
#[derive(Debug, Parser)]
#[command(name = "keycap-forge", version, about, long_about = None)]
pub struct Args {
    /// Style name (looked up under <config-root>/styles) or a path to a style file
    pub style: String,

    /// Layout name (looked up under <config-root>/layouts) or a path to a layout file
    pub layout: String,

    /// Directory the generated files are written to
    #[arg(short, long, default_value = "output")]
    pub output: PathBuf,

    /// Output format: stl, brep, step or 3mf
    #[arg(short, long, default_value_t = ExportFormat::Stl)]
    pub format: ExportFormat,

    /// Root directory holding styles/ and layouts/
    #[arg(long, env = "KEYCAP_CONFIG_ROOT", default_value = "configs")]
    pub config_root: PathBuf,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Also write a coarse `<key>.preview.stl` next to each file
    #[arg(long)]
    pub preview: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}
