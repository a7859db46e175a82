//! `vpsctl debug`: read-only diagnostics on the target.

use anyhow::Result;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::services::workflows::Workflow;

/// Run `vpsctl debug`.
///
/// # Errors
///
/// Returns an error if no credential can be resolved.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let ok = super::workflow::execute(app, Workflow::Debug).await?;
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
