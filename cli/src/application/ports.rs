//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::{CredentialError, SessionError, SpawnSpec};

// ── Session Transport Port ────────────────────────────────────────────────────

/// One read from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// Bytes produced by the remote side.
    Data(Vec<u8>),
    /// The subprocess closed its output; nothing more will arrive.
    Eof,
    /// Nothing arrived within the read timeout.
    Idle,
}

/// Byte pipe to an interactive subprocess (ssh/scp in a pseudo-terminal).
///
/// Pattern matching lives in the session driver; a transport only moves bytes.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Write `data` to the subprocess.
    async fn send(&mut self, data: &[u8]) -> std::io::Result<()>;

    /// Wait up to `timeout` for the next chunk of output.
    async fn recv(&mut self, timeout: Duration) -> std::io::Result<Received>;

    /// Kill the subprocess if still running and reap it.
    ///
    /// Returns the exit code when one could be collected. Synchronous so it
    /// can run from `Drop`.
    fn terminate(&mut self) -> Option<u32>;
}

/// Spawns transports for sessions.
pub trait TransportFactory {
    type Transport: Transport;

    /// Start the subprocess described by `spec`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Spawn` if the program cannot be started.
    fn spawn(&self, spec: &SpawnSpec) -> Result<Self::Transport, SessionError>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts local process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output, killing it after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
}

// ── Secret Source Port ────────────────────────────────────────────────────────

/// The three places a credential may come from.
pub trait SecretSource {
    /// Read the `KEY=VALUE` store at `path`. `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Store` if the file exists but cannot be read.
    fn read_store(&self, path: &Path) -> Result<Option<String>, CredentialError>;

    /// Value of the process environment variable `key`.
    fn env_var(&self, key: &str) -> Option<String>;

    /// Whether a terminal is attached for an interactive prompt.
    fn is_interactive(&self) -> bool;

    /// Ask for a masked secret. `Ok(None)` when the prompt yields nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails.
    fn prompt(&self, message: &str) -> Result<Option<String>>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait, no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Emit output captured from the remote side.
    fn output(&self, text: &str);
}
