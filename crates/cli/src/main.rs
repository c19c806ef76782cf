use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use monodeploy_core::deploy_manager::{DeployManager, DeployManagerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// Monodeploy - Deploy workspace projects with their runtime dependencies
#[derive(Parser)]
#[command(name = "monodeploy")]
#[command(about = "Copy a subset of workspace projects and their dependencies into a deployment folder")]
#[command(version)]
struct Cli {
    /// Path to the workspace root (defaults to current directory)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Log each resolved folder and created link
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a scenario into the target folder
    Deploy {
        /// Scenario name; selects common/config/deploy-<name>.json instead of deploy.json
        #[arg(short, long)]
        scenario: Option<String>,
        /// Recursively delete the contents of a non-empty target folder
        #[arg(long)]
        overwrite: bool,
        /// Existing folder to deploy into (defaults to common/deploy)
        #[arg(short, long)]
        target_folder: Option<PathBuf>,
    },
    /// Resolve a scenario and show what would be deployed
    Plan {
        /// Scenario name; selects common/config/deploy-<name>.json instead of deploy.json
        #[arg(short, long)]
        scenario: Option<String>,
        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// List projects registered in the workspace
    List,
    /// Manage links of a deployment made with symlinkCreation "script"
    Links {
        #[command(subcommand)]
        links_command: LinksCommands,
    },
    /// Print the JSON schema of deploy scenario files
    Schema,
}

#[derive(Subcommand)]
enum LinksCommands {
    /// Create the links listed in deploy-metadata.json
    Create {
        /// Folder holding deploy-metadata.json
        #[arg(default_value = ".")]
        folder: PathBuf,
    },
    /// Remove the links listed in deploy-metadata.json
    Remove {
        /// Folder holding deploy-metadata.json
        #[arg(default_value = ".")]
        folder: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "monodeploy_core=debug,info"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Deploy {
            scenario,
            overwrite,
            target_folder,
        } => {
            let manager = load_manager(cli.workspace)?;
            commands::deploy::execute(&manager, scenario, overwrite, target_folder)
        }
        Commands::Plan { scenario, json } => {
            let manager = load_manager(cli.workspace)?;
            commands::plan::execute(&manager, scenario.as_deref(), json)
        }
        Commands::List => commands::list::execute(&load_manager(cli.workspace)?),
        // Deployed folders carry their own metadata and need no workspace
        Commands::Links { links_command } => commands::links::execute(links_command),
        Commands::Schema => commands::schema::execute(),
    }
}

fn load_manager(workspace_root: PathBuf) -> Result<DeployManager> {
    DeployManager::new(DeployManagerConfig { workspace_root })
        .map_err(|e| anyhow::anyhow!("Failed to initialize workspace: {}", e))
}
