//! Application context: unified state passed to every command handler.
//!
//! Built once in `Cli::run()` from the global flags, so command handlers
//! take a single `&AppContext` instead of loose parameters.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::domain::DeployConfig;
use crate::infra::config::YamlConfigStore;
use crate::output::OutputContext;

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Explicit configuration file, if given.
    pub config: Option<PathBuf>,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// The validated deployment configuration.
    pub config: DeployConfig,
    /// Where the configuration came from; `None` means built-in defaults.
    pub config_path: Option<PathBuf>,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read, parsed or validated.
    pub fn new(flags: AppFlags) -> Result<Self> {
        let store = YamlConfigStore::new(flags.config);
        let config_path = store.path();
        let config = store.load().context("cannot load configuration")?;
        Ok(Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            config,
            config_path,
        })
    }
}
