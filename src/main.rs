//! Arbor CLI entry point

use arbor_core::Granularity;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Incremental semantic call-graph analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Repository root path (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the repository, re-deriving only what changed
    Analyze {
        /// Write a default .arbor/config.toml if none exists
        #[arg(long)]
        init: bool,

        /// Override the configured granularity (file or unit)
        #[arg(short, long)]
        granularity: Option<Granularity>,
    },
    /// Show what the next analysis would re-derive, without writing
    Status,
    /// List the units affected by a change to NAME
    Impact {
        name: String,

        /// Maximum caller hops (defaults to analysis.maxCallDepth)
        #[arg(short, long)]
        depth: Option<usize>,
    },
    /// List call cycles
    Cycles,
    /// List likely entry points
    EntryPoints {
        /// Maximum callers for a unit to count as an entry point
        #[arg(long)]
        max_callers: Option<usize>,
    },
    /// List units that call no known unit
    Leaves,
    /// Remove the manifest and graph store
    Clear,
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose when set
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("arbor={log_level}")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Repository root: {}", cli.root.display());

    match cli.command {
        Commands::Analyze { init, granularity } => commands::analyze(&cli.root, init, granularity),
        Commands::Status => commands::status(&cli.root),
        Commands::Impact { name, depth } => commands::impact(&cli.root, &name, depth),
        Commands::Cycles => commands::cycles(&cli.root),
        Commands::EntryPoints { max_callers } => commands::entry_points(&cli.root, max_callers),
        Commands::Leaves => commands::leaves(&cli.root),
        Commands::Clear => commands::clear(&cli.root),
        Commands::Version => {
            println!("arbor v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
