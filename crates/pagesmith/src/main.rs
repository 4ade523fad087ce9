//! Pagesmith CLI - cleanup and packaging for scanned book pages.
//!
//! Pagesmith deskews, compacts, crops, resizes and watermarks page images
//! from a directory or a zip/cbz archive, and writes them back as JPEG files,
//! a zip/cbz archive or an image PDF.
//!
//! # Usage
//!
//! ```bash
//! # Convert a directory into a cbz using the default config
//! pagesmith conv --src ./scans --dest ./books
//!
//! # Run only the filter chain, watching a directory for new pages
//! pagesmith ip --src ./incoming --dest ./clean --watch
//!
//! # View configuration
//! pagesmith config show
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Pagesmith - batch cleanup and packaging of scanned page images.
#[derive(Parser, Debug)]
#[command(name = "pagesmith")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, env = "PAGESMITH_CONFIG")]
    cfg: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run filters, resize and package pages
    Conv(cli::conv::ConvArgs),

    /// Run the filter chain only, optionally watching for new pages
    Ip(cli::ip::IpArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = cli::load_config(cli.cfg.as_deref())?;
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Pagesmith v{}", pagesmith_core::VERSION);

    match cli.command {
        Commands::Conv(args) => cli::conv::execute(config, args),
        Commands::Ip(args) => cli::ip::execute(config, args),
        Commands::Config(args) => cli::config::execute(config, cli.cfg, args),
    }
}
