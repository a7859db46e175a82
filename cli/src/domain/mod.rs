//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod compose;
pub mod config;
pub mod credential;
pub mod error;
pub mod prompt;
pub mod session;
pub mod step;
pub mod workflow;

pub use config::{DeployConfig, validate};
pub use credential::{Credential, CredentialSource};
pub use error::{ArchiveError, ConfigError, CredentialError, SessionError};
pub use prompt::{Match, PatternKind, PromptPattern, PromptSet};
pub use session::{SessionKind, SessionState, SpawnSpec};
pub use step::{Step, StepKind, StepResult, Terminator};
