//! cmspub CLI
//!
//! Command-line tools for a cmspub file store.
//!
//! # Commands
//!
//! - `init` - Create a store with online and offline workspaces
//! - `stage` - Record an edit in an offline workspace
//! - `publish` - Publish an offline workspace into the online workspace
//! - `inspect` - List the resources of a workspace with their state
//! - `history` - List publish runs or the snapshots of one version

mod commands;

use clap::{Parser, Subcommand};
use commands::stage::Edit;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// cmspub command-line publishing tools.
#[derive(Parser)]
#[command(name = "cmspub")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory
    #[arg(global = true, short, long)]
    path: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a store with online and offline workspaces
    Init {
        /// Id of the online workspace
        #[arg(long, default_value = "1")]
        online: u32,

        /// Ids of offline workspaces
        #[arg(long, num_args = 1.., default_value = "2")]
        offline: Vec<u32>,
    },

    /// Record an edit in an offline workspace
    Stage {
        /// Offline workspace id
        #[arg(short, long)]
        workspace: u32,

        /// Resource path, e.g. /news/index.html
        resource: String,

        /// Create or replace a file with this local file's content
        #[arg(long, conflicts_with_all = ["folder", "delete"])]
        file: Option<PathBuf>,

        /// Create a folder
        #[arg(long, conflicts_with = "delete")]
        folder: bool,

        /// Mark the resource deleted
        #[arg(long)]
        delete: bool,
    },

    /// Publish an offline workspace
    Publish {
        /// Offline workspace id
        #[arg(short, long)]
        workspace: u32,

        /// Id of the publishing user
        #[arg(short, long, default_value = "1")]
        actor: u32,

        /// Skip history snapshots
        #[arg(long)]
        no_history: bool,

        /// JSON publish configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the resources of a workspace
    Inspect {
        /// Workspace id
        #[arg(short, long, default_value = "1")]
        workspace: u32,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List publish runs, or the snapshots of one version
    History {
        /// Backup version to show
        #[arg(long)]
        version: Option<u64>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Init { online, offline } => {
            let path = cli.path.ok_or("Store path required for init")?;
            commands::init::run(&path, online, &offline)?;
        }
        Commands::Stage {
            workspace,
            resource,
            file,
            folder,
            delete,
        } => {
            let path = cli.path.ok_or("Store path required for stage")?;
            let edit = match (file.as_deref(), folder, delete) {
                (Some(source), _, _) => Edit::File(source),
                (None, true, _) => Edit::Folder,
                (None, false, true) => Edit::Delete,
                (None, false, false) => {
                    return Err("one of --file, --folder or --delete is required".into());
                }
            };
            commands::stage::run(&path, workspace, &resource, edit)?;
        }
        Commands::Publish {
            workspace,
            actor,
            no_history,
            config,
        } => {
            let path = cli.path.ok_or("Store path required for publish")?;
            commands::publish::run(&path, workspace, actor, no_history, config.as_deref())?;
        }
        Commands::Inspect { workspace, format } => {
            let path = cli.path.ok_or("Store path required for inspect")?;
            commands::inspect::run(&path, workspace, &format)?;
        }
        Commands::History { version } => {
            let path = cli.path.ok_or("Store path required for history")?;
            commands::history::run(&path, version)?;
        }
        Commands::Version => {
            println!("cmspub CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
