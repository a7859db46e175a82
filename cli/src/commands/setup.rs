//! `vpsctl setup`: install docker and start the reverse proxy.

use anyhow::Result;
use std::process::ExitCode;

use crate::app::AppContext;
use crate::application::services::workflows::Workflow;

/// Run `vpsctl setup`.
///
/// # Errors
///
/// Returns an error if no credential can be resolved.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    if !super::workflow::execute(app, Workflow::Setup).await? {
        return Ok(ExitCode::FAILURE);
    }
    app.output.info(&format!(
        "Proxy running from {} on network {}",
        app.config.paths.proxy_dir, app.config.proxy.network
    ));
    app.output.info("Next: vpsctl deploy");
    Ok(ExitCode::SUCCESS)
}
