//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::time::Duration;

use thiserror::Error;

use crate::domain::session::SessionState;

// ── Credential errors ─────────────────────────────────────────────────────────

/// Errors raised while resolving the login credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error(
        "{key} not set: add it to {store}, export it, or run from an interactive terminal."
    )]
    Unavailable { key: String, store: String },

    #[error("cannot read credential store {path}: {reason}")]
    Store { path: String, reason: String },
}

// ── Session errors ────────────────────────────────────────────────────────────

/// Errors raised by the interactive session driver.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to spawn {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("authentication failed for {target}: {reason}")]
    Authentication { target: String, reason: String },

    #[error("step '{label}' timed out after {:.1}s", elapsed.as_secs_f64())]
    StepTimeout { label: String, elapsed: Duration },

    #[error("session to {target} lost: {reason}")]
    SessionLost { target: String, reason: String },

    #[error("session is {state}, steps require a ready session")]
    NotReady { state: SessionState },

    #[error("transfer to {target} exited with status {code}")]
    TransferFailed { target: String, code: u32 },

    #[error("invalid prompt pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },
}

impl SessionError {
    /// Short name of the failure class, used in run summaries.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Spawn { .. } => "spawn",
            Self::Authentication { .. } => "authentication",
            Self::StepTimeout { .. } => "timeout",
            Self::SessionLost { .. } => "session lost",
            Self::NotReady { .. } => "not ready",
            Self::TransferFailed { .. } => "transfer",
            Self::Pattern { .. } => "pattern",
        }
    }
}

// ── Archive errors ────────────────────────────────────────────────────────────

/// Errors raised while bundling the local project.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("cannot run archiver: {0}")]
    Spawn(String),

    #[error("archiver exited with status {code}: {stderr}")]
    Failed { code: i32, stderr: String },

    #[error("cannot prepare archive directory: {0}")]
    Workspace(String),
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to loading and validating the deployment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("cannot parse {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}
