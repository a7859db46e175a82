//! `vpsctl deploy`: bundle, upload, extract and rebuild the project.

use anyhow::Result;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::services::workflows::Workflow;

/// Run `vpsctl deploy`.
///
/// # Errors
///
/// Returns an error if no credential can be resolved.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let ctx = &app.output;
    ctx.kv("source", &app.config.paths.local_dir.display().to_string());
    ctx.kv("remote", &app.config.paths.remote_dir);
    if !super::workflow::execute(app, Workflow::Deploy).await? {
        return Ok(ExitCode::FAILURE);
    }
    ctx.info("Check the containers: vpsctl debug");
    Ok(ExitCode::SUCCESS)
}
