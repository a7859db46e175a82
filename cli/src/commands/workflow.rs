//! Shared driver for the workflow commands.

use anyhow::{Context, Result};
use tracing::debug;

use crate::app::AppContext;
use crate::application::services::secrets::resolve_credential;
use crate::application::services::workflows::{Orchestrator, Workflow, WorkflowError};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::pty::PtyTransportFactory;
use crate::infra::secrets::SystemSecretSource;
use crate::output::{OutputContext, TerminalReporter};

/// Resolve the credential, run `workflow` and report the outcome.
///
/// Returns `Ok(false)` when the workflow ran and failed; the failure has
/// already been printed.
///
/// # Errors
///
/// Returns an error if no credential can be resolved or the target's
/// prompt patterns are invalid.
pub(super) async fn execute(app: &AppContext, workflow: Workflow) -> Result<bool> {
    let ctx = &app.output;
    let config = &app.config;
    let target = config.target_label();

    ctx.header(&format!("vpsctl {} → {target}", workflow.name()));
    match &app.config_path {
        Some(path) => debug!(path = %path.display(), "using configuration file"),
        None => debug!("using built-in configuration"),
    }

    let (credential, source) = resolve_credential(&SystemSecretSource, &config.secrets, &target)
        .context("cannot resolve login credential")?;
    debug!(?source, "credential resolved");

    let reporter = TerminalReporter::new(ctx);
    let runner = TokioCommandRunner;
    let orchestrator =
        Orchestrator::new(config, &PtyTransportFactory, &runner, &reporter, &credential)?;

    match orchestrator.run(workflow).await {
        Ok(report) => {
            ctx.success(&format!(
                "{} finished: {} step(s) on {target}",
                report.workflow.name(),
                report.results.len()
            ));
            Ok(true)
        }
        Err(e) => {
            reporter.abandon();
            print_failure(ctx, &e);
            Ok(false)
        }
    }
}

fn print_failure(ctx: &OutputContext, error: &WorkflowError) {
    match error {
        WorkflowError::Sequence(failure) => {
            ctx.error(&format!(
                "{} failed ({}): {}",
                failure.label,
                failure.error.kind(),
                failure.error
            ));
            if !failure.partial_output.trim().is_empty() {
                ctx.error_block(&failure.partial_output);
            }
            if !failure.last_buffer.trim().is_empty()
                && failure.last_buffer != failure.partial_output
            {
                ctx.error("last output from the session:");
                ctx.error_block(&failure.last_buffer);
            }
            if !failure.completed.is_empty() {
                ctx.error(&format!(
                    "{} step(s) completed before the failure",
                    failure.completed.len()
                ));
            }
        }
        WorkflowError::Archive(e) => ctx.error(&format!("archive: {e}")),
        WorkflowError::Session(e) => ctx.error(&e.to_string()),
    }
}
