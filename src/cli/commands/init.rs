//! `ptrack init` command - Initialize a new tracker workspace

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::cli::GlobalOpts;
use crate::core::config::Config;
use crate::core::workspace::{Workspace, WorkspaceError};
use crate::storage::open_backend;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Force initialization even if .ptrack/ already exists
    #[arg(long)]
    pub force: bool,
}

/// Initialize a workspace; the global `--backend` picks the stored backend
pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let backend = global.backend.unwrap_or_default();
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let workspace = if args.force {
        Workspace::init_force(&path, backend)
    } else {
        Workspace::init(&path, backend)
    };

    match workspace {
        Ok(ws) => {
            // Opening the backend once creates the database or data files
            let config = Config::with_data_dir(backend, ws.data_dir());
            open_backend(&config)?;
            tracing::info!(root = %ws.root().display(), backend = %backend, "workspace initialized");

            println!(
                "{} Initialized {} workspace at {}",
                style("✓").green(),
                backend,
                style(ws.root().display()).cyan()
            );
            println!();
            print_structure(ws.root());
            println!();
            println!("Next steps:");
            println!(
                "  {} Register a team member",
                style("ptrack employee new").yellow()
            );
            println!("  {} Create a project", style("ptrack project new").yellow());
            Ok(())
        }
        Err(WorkspaceError::AlreadyExists(path)) => {
            println!(
                "{} Workspace already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("ptrack init --force").yellow());
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn print_structure(root: &Path) {
    for entry in [".ptrack/", ".ptrack/config.yaml", "data/"] {
        if root.join(entry).exists() {
            let prefix = if entry.ends_with('/') { "📁" } else { "📄" };
            println!("  {} {}", prefix, style(entry).dim());
        }
    }
}
