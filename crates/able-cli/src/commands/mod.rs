//! Command implementations and dispatch logic.
//!
//! Every command loads a program through [`build_loader`] and then renders
//! it in its own format.

use able_config::SearchPathCollector;
use able_core::error::AbleError;
use able_core::utils::path::{normalize_path, utf8_path};
use able_loader::{LoadOptions, Loader, Program};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use tracing::info;

pub mod check;
pub mod graph;
pub mod lock;


use crate::{output::OutputHandler, Commands, LoadArgs};

/// Shared context for all commands
pub struct CommandContext {
    pub cwd: Utf8PathBuf,
    pub output: OutputHandler,
    /// Search-path environment variables, captured once at startup
    pub env: HashMap<String, String>,
}

impl CommandContext {
    /// Create a new command context from the process environment
    pub fn new() -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| AbleError::io("Failed to get current directory".to_string(), e))?;

        Ok(Self {
            cwd: utf8_path(cwd)?,
            output: OutputHandler::new(),
            env: SearchPathCollector::collect_env_overrides(),
        })
    }

    /// Resolve a user-supplied path against the working directory
    pub fn resolve(&self, path: &Utf8Path) -> Utf8PathBuf {
        if path.is_absolute() {
            normalize_path(path)
        } else {
            normalize_path(&self.cwd.join(path))
        }
    }
}

/// Dispatch a command to its handler
pub fn dispatch_command(command: Commands, ctx: &CommandContext) -> anyhow::Result<()> {
    match command {
        Commands::Check { load, json } => {
            info!("Checking {}", load.entry);
            check::execute(&load, json, ctx)
        }
        Commands::Graph { load, json } => {
            info!("Printing import graph for {}", load.entry);
            graph::execute(&load, json, ctx)
        }
        Commands::Lock { load, output } => {
            info!("Locking {}", load.entry);
            lock::execute(&load, output, ctx)
        }
    }
}

/// Build a loader from the command line and environment layers
pub fn build_loader(args: &LoadArgs, ctx: &CommandContext) -> anyhow::Result<Loader> {
    let entry = ctx.resolve(&args.entry);
    let mut collector = SearchPathCollector::new()
        .with_search_paths(args.search_paths.iter().map(|p| ctx.resolve(p)))
        .with_stdlib_paths(args.stdlib_paths.iter().map(|p| ctx.resolve(p)))
        .with_env(ctx.env.clone());
    if let Some(dir) = entry.parent() {
        collector = collector.with_base(dir);
    }
    if args.no_bundled {
        collector = collector.without_bundled();
    }
    if args.include_cwd {
        collector = collector.with_cwd(ctx.cwd.clone());
    }

    let loader = Loader::new(collector.collect()?)?;
    info!("Using {} search roots", loader.search_paths().len());
    Ok(loader)
}

/// Load the program named by `args`
pub fn load_program(args: &LoadArgs, ctx: &CommandContext) -> anyhow::Result<Program> {
    let loader = build_loader(args, ctx)?;
    let entry = ctx.resolve(&args.entry);
    let options = LoadOptions::with_packages(args.include.iter().cloned());
    Ok(loader.load_with_options(&entry, &options)?)
}
