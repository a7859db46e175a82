//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, OutputFlags};
use crate::commands;

/// Provision, deploy to and debug a VPS over interactive SSH
#[derive(Parser)]
#[command(
    name = "vpsctl",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Configuration file (default: ./vpsctl.yaml)
    #[arg(long, global = true, env = "VPSCTL_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Log session internals to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install docker and start the reverse proxy
    Setup,

    /// Upload the project and rebuild its containers
    Deploy,

    /// Show container logs and health checks
    Debug,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration or credential cannot be loaded.
    /// A failing workflow is reported and mapped to a failure exit code.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            config,
            quiet,
            no_color,
            verbose: _,
            command,
        } = self;
        let app = AppContext::new(AppFlags {
            output: OutputFlags { no_color, quiet },
            config,
        })?;
        match command {
            Command::Setup => commands::setup::run(&app).await,
            Command::Deploy => commands::deploy::run(&app).await,
            Command::Debug => commands::debug::run(&app).await,
        }
    }
}
