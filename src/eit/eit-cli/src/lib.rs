//! CLI for eit: scaffold new projects from templates published to an npm
//! registry.
//!
//! `eit init` lists the available templates, asks a few questions, installs
//! the chosen template package into `~/.eit-tool/template` and copies it into
//! the current directory.

pub mod config;
pub mod error;
pub mod init;
pub mod logging;
pub mod process;
pub mod prompt;
pub mod templates;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::{CLI_PACKAGE_NAME, Config};
use console::style;
use eit_package::{NpmClient, VersionSource};
use init::InitCommand;
use prompt::TerminalPrompter;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "eit")]
#[command(version, about = "Create projects from published templates", long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, short = 'd', global = true)]
    pub debug: bool,

    /// Use a local template package instead of downloading one
    #[arg(long, global = true)]
    pub target_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a project in the current directory
    Init {
        /// Name for the new project (asked interactively when missing or invalid)
        project_name: Option<String>,

        /// Continue in a non-empty directory without the first confirmation
        #[arg(long, short = 'f')]
        force: bool,
    },
}

/// Main entry point for the CLI.
pub fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.debug);

    run(cli).inspect_err(|err| {
        error!("{err:#}");
    })
}

fn run(cli: Cli) -> Result<()> {
    info!("eit {}", CURRENT_VERSION);
    let config = Config::load(cli.target_path)?;
    debug!(?config, "configuration");

    check_global_update(&config);

    match cli.command {
        Commands::Init {
            project_name,
            force,
        } => InitCommand::new(project_name, force, config).run(&mut TerminalPrompter),
    }
}

/// Tell the user when a newer CLI is published. Failures never stop the
/// command.
fn check_global_update(config: &Config) {
    let newer = NpmClient::new(config.registry.as_deref())
        .and_then(|client| client.next_version_after(CURRENT_VERSION, CLI_PACKAGE_NAME));

    match newer {
        Ok(Some(latest)) => warn!(
            "{}",
            style(format!(
                "A newer version is available: {latest} (current {CURRENT_VERSION}). \
                 Update with `npm install -g {CLI_PACKAGE_NAME}`"
            ))
            .yellow()
        ),
        Ok(None) => debug!("eit {} is up to date", CURRENT_VERSION),
        Err(err) => debug!("update check failed: {}", err),
    }
}
