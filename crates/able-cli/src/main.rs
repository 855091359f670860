//! # able-cli
//!
//! Command-line front-end for the Able package graph loader.
//!
//! Parses arguments, sets up logging, loads the program reachable from an
//! entry file and reports it as a package list, an import graph or a
//! lockfile.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use tracing::debug;

mod commands;
mod output;

use commands::CommandContext;
use output::errors::ErrorFormatter;

/// Load and inspect Able package graphs
#[derive(Parser)]
#[command(name = "able-load", version, about = "Load and inspect Able package graphs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Options shared by every command that performs a load
#[derive(Args, Debug, Clone, Default)]
pub struct LoadArgs {
    /// Entry source file
    #[arg(value_name = "ENTRY")]
    pub entry: Utf8PathBuf,

    /// Additional packages to load alongside the entry
    #[arg(long = "include", value_name = "PACKAGE")]
    pub include: Vec<String>,

    /// Extra user search root (repeatable)
    #[arg(long = "search-path", value_name = "DIR")]
    pub search_paths: Vec<Utf8PathBuf>,

    /// Extra stdlib search root (repeatable)
    #[arg(long = "stdlib-path", value_name = "DIR")]
    pub stdlib_paths: Vec<Utf8PathBuf>,

    /// Do not look for bundled kernel and stdlib checkouts
    #[arg(long)]
    pub no_bundled: bool,

    /// Also search the entry directory and the working directory
    #[arg(long)]
    pub include_cwd: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the entry and list packages in dependency order
    Check {
        #[command(flatten)]
        load: LoadArgs,
        /// Print the program summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the import graph of the loaded program
    Graph {
        #[command(flatten)]
        load: LoadArgs,
        /// Print the graph as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a package.lock for the loaded program
    Lock {
        #[command(flatten)]
        load: LoadArgs,
        /// Output path (defaults to package.lock in the entry root)
        #[arg(short, long, value_name = "FILE")]
        output: Option<Utf8PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    debug!("Starting able-load v{}", env!("CARGO_PKG_VERSION"));

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!("Load failed: {:#}", err);
            eprintln!("{}", ErrorFormatter::new().format_any(&err));
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> anyhow::Result<()> {
    let ctx = CommandContext::new()?;
    commands::dispatch_command(cli.command, &ctx)
}

fn setup_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "able={},able_loader={},able_config={}",
            level, level, level
        ))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
