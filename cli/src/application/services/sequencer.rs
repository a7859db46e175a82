//! Step sequencer: runs an ordered step list against one session.
//!
//! Steps run strictly in order. The first failure stops the run; the
//! session is closed exactly once on every path before the result is
//! returned. Nothing is retried here.

use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::application::ports::{ProgressReporter, Transport};
use crate::application::services::session::{Established, Session};
use crate::domain::{Credential, SessionError, Step, StepResult};

/// Label used when the run fails before the first step.
pub const LOGIN_LABEL: &str = "login";

/// A run stopped at its first failing step.
#[derive(Debug, Error)]
#[error("step '{label}' failed: {error}")]
pub struct SequenceFailure {
    /// Label of the step that failed (`login` for authentication failures).
    pub label: String,
    /// Output the failing step produced before it failed.
    pub partial_output: String,
    /// Raw unread session buffer at the time of failure.
    pub last_buffer: String,
    /// Results of the steps that completed before the failure.
    pub completed: Vec<StepResult>,
    #[source]
    pub error: SessionError,
}

impl SequenceFailure {
    fn at_login<T: Transport>(session: &Session<T>, error: SessionError) -> Self {
        Self {
            label: LOGIN_LABEL.to_string(),
            partial_output: String::new(),
            last_buffer: session.unread(),
            completed: Vec::new(),
            error,
        }
    }
}

/// Authenticate `session`, run `steps` in order, then close the session.
///
/// # Errors
///
/// Returns `SequenceFailure` for the first failing step (or the login);
/// steps after it are never sent.
pub async fn run_steps<T: Transport>(
    mut session: Session<T>,
    credential: &Credential,
    steps: &[Step],
    reporter: &impl ProgressReporter,
) -> Result<Vec<StepResult>, SequenceFailure> {
    let outcome = drive(&mut session, credential, steps, reporter).await;
    session.close().await;
    outcome
}

async fn drive<T: Transport>(
    session: &mut Session<T>,
    credential: &Credential,
    steps: &[Step],
    reporter: &impl ProgressReporter,
) -> Result<Vec<StepResult>, SequenceFailure> {
    match session.authenticate(credential).await {
        Ok(Established::Ready) => {}
        Ok(Established::Finished { .. }) => {
            let error = SessionError::SessionLost {
                target: session.target().to_string(),
                reason: "remote side exited before a shell prompt appeared".to_string(),
            };
            return Err(SequenceFailure::at_login(session, error));
        }
        Err(error) => return Err(SequenceFailure::at_login(session, error)),
    }

    let mut results = Vec::with_capacity(steps.len());
    for (i, step) in steps.iter().enumerate() {
        reporter.step(&step.label);
        debug!(index = i, label = %step.label, "executing step");
        match session.execute(step).await {
            Ok(result) => {
                reporter.output(&result.output);
                reporter.success(&format!(
                    "{} ({:.1}s)",
                    result.label,
                    result.elapsed.as_secs_f64()
                ));
                results.push(result);
            }
            Err(error) => {
                warn!(label = %step.label, remaining = steps.len() - i - 1, "stopping run");
                return Err(SequenceFailure {
                    label: step.label.clone(),
                    partial_output: session.partial_output(step),
                    last_buffer: session.unread(),
                    completed: results,
                    error,
                });
            }
        }
    }
    Ok(results)
}

/// Authenticate a transfer session and wait for it to finish, then close it.
///
/// # Errors
///
/// Returns `SequenceFailure` labelled `label` if login fails, the transfer
/// times out, exits non-zero, or unexpectedly opens a shell.
pub async fn run_transfer<T: Transport>(
    mut session: Session<T>,
    credential: &Credential,
    label: &str,
    reporter: &impl ProgressReporter,
) -> Result<StepResult, SequenceFailure> {
    reporter.step(label);
    let started = Instant::now();
    let mut status_unknown = false;
    let outcome = match session.authenticate(credential).await {
        Ok(Established::Finished { output, exit_code }) => {
            status_unknown = exit_code.is_none();
            Ok(StepResult {
                label: label.to_string(),
                output,
                elapsed: started.elapsed(),
                success: true,
            })
        }
        Ok(Established::Ready) => Err(SessionError::SessionLost {
            target: session.target().to_string(),
            reason: "transfer opened an interactive shell".to_string(),
        }),
        Err(error) => Err(error),
    };
    let outcome = outcome.map_err(|error| SequenceFailure {
        label: label.to_string(),
        partial_output: session.unread(),
        last_buffer: session.unread(),
        completed: Vec::new(),
        error,
    });
    session.close().await;
    if let Ok(result) = &outcome {
        reporter.success(&format!("{label} ({:.1}s)", result.elapsed.as_secs_f64()));
        if status_unknown {
            warn!(label, "transfer exit status unavailable");
            reporter.warn(&format!("{label}: exit status unavailable, assuming success"));
        }
    }
    outcome
}
