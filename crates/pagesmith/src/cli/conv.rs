//! The `pagesmith conv` command: filters, resize and packaging.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use pagesmith_core::{run_conversion, Config};

use super::progress::{print_summary, ProgressObserver};

/// Arguments for the `conv` command.
#[derive(Args, Debug)]
pub struct ConvArgs {
    /// Source directory or .zip/.cbz archive (overrides `source.path`)
    #[arg(long)]
    pub src: Option<PathBuf>,

    /// Destination directory (overrides `dest.dir`)
    #[arg(long)]
    pub dest: Option<PathBuf>,
}

/// Execute the conv command.
pub fn execute(mut config: Config, args: ConvArgs) -> anyhow::Result<()> {
    super::apply_paths(&mut config, args.src.as_deref(), args.dest.as_deref());

    tracing::info!(
        "Converting {} into {}",
        config.source_path().display(),
        config.dest_dir().display()
    );

    let observer = Arc::new(ProgressObserver::new());
    let result = run_conversion(&config, observer.clone());
    observer.finish();

    let report = result?;
    print_summary(&report.stats, Some(&report.output));
    Ok(())
}
