//! The `pagesmith ip` command: filter chain only, optionally watching.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Args;
use pagesmith_core::{run_image_processing, Config};

use super::progress::{print_summary, ProgressObserver};

/// Arguments for the `ip` command.
#[derive(Args, Debug)]
pub struct IpArgs {
    /// Source directory (overrides `source.path`)
    #[arg(long)]
    pub src: Option<PathBuf>,

    /// Destination directory (overrides `dest.dir`)
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Keep polling the source for new images until interrupted
    #[arg(long)]
    pub watch: bool,
}

/// Execute the ip command.
pub fn execute(mut config: Config, args: IpArgs) -> anyhow::Result<()> {
    super::apply_paths(&mut config, args.src.as_deref(), args.dest.as_deref());
    if args.watch {
        config.watch.enabled = true;
    }

    // Watch runs end with the process, so nothing ever raises this flag
    let stop = Arc::new(AtomicBool::new(false));
    let observer = Arc::new(ProgressObserver::new());
    let result = run_image_processing(&config, stop, observer.clone());
    observer.finish();

    let stats = result?;
    print_summary(&stats, Some(&config.dest_dir()));
    Ok(())
}
