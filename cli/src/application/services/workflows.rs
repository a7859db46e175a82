//! Application service: the setup, deploy and debug workflows.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Each workflow builds its step list from the configuration and hands it
//! to the sequencer over freshly opened sessions.

use thiserror::Error;
use tracing::info;

use crate::application::ports::{CommandRunner, ProgressReporter, TransportFactory};
use crate::application::services::archive::build_archive;
use crate::application::services::sequencer::{SequenceFailure, run_steps, run_transfer};
use crate::application::services::session::Session;
use crate::domain::session::{scp_upload, ssh_shell};
use crate::domain::workflow::{debug_steps, deploy_plan, setup_steps};
use crate::domain::{ArchiveError, Credential, DeployConfig, PromptSet, SessionError, StepResult};

/// Which workflow ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workflow {
    Setup,
    Deploy,
    Debug,
}

impl Workflow {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Deploy => "deploy",
            Self::Debug => "debug",
        }
    }
}

/// Results of a completed workflow, in execution order.
#[derive(Debug)]
pub struct RunReport {
    pub workflow: Workflow,
    pub results: Vec<StepResult>,
}

/// Why a workflow stopped.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Sequence(#[from] SequenceFailure),
}

/// Composes the workflows over injected transports and runners.
pub struct Orchestrator<'a, F, C, R> {
    config: &'a DeployConfig,
    factory: &'a F,
    runner: &'a C,
    reporter: &'a R,
    credential: &'a Credential,
    prompts: PromptSet,
}

impl<'a, F, C, R> Orchestrator<'a, F, C, R>
where
    F: TransportFactory,
    C: CommandRunner,
    R: ProgressReporter,
{
    /// # Errors
    ///
    /// Returns `SessionError::Pattern` if the target's prompt patterns do not compile.
    pub fn new(
        config: &'a DeployConfig,
        factory: &'a F,
        runner: &'a C,
        reporter: &'a R,
        credential: &'a Credential,
    ) -> Result<Self, SessionError> {
        let prompts = PromptSet::for_target(
            &config.target.user,
            config.target.hostname.as_deref(),
            config.ssh.allow_sigil_fallback,
        )?;
        Ok(Self {
            config,
            factory,
            runner,
            reporter,
            credential,
            prompts,
        })
    }

    /// Run `workflow`.
    ///
    /// # Errors
    ///
    /// Returns the first failure of the workflow.
    pub async fn run(&self, workflow: Workflow) -> Result<RunReport, WorkflowError> {
        match workflow {
            Workflow::Setup => self.setup().await,
            Workflow::Deploy => self.deploy().await,
            Workflow::Debug => self.debug().await,
        }
    }

    /// Install docker and bring up the reverse proxy.
    ///
    /// # Errors
    ///
    /// Returns the first failing step.
    pub async fn setup(&self) -> Result<RunReport, WorkflowError> {
        let results = self.run_shell(&setup_steps(self.config)).await?;
        Ok(RunReport {
            workflow: Workflow::Setup,
            results,
        })
    }

    /// Bundle, upload, extract and rebuild.
    ///
    /// The local archive lives in a temporary directory removed on return.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError` before any session is opened if bundling
    /// fails; otherwise the first failing transfer or step.
    pub async fn deploy(&self) -> Result<RunReport, WorkflowError> {
        let plan = deploy_plan(self.config);
        let workdir = tempfile::tempdir().map_err(|e| ArchiveError::Workspace(e.to_string()))?;

        self.reporter.step("Creating archive");
        let archive = build_archive(self.runner, &plan.archive, workdir.path()).await?;
        self.reporter.success(&format!("Archive created: {}", plan.archive.file_name));

        let local = archive.display().to_string();
        let spec = scp_upload(&self.config.ssh_options(), &local, &plan.upload_dir);
        let transport = self.factory.spawn(&spec)?;
        let session = Session::new(transport, &spec, self.prompts.clone())
            .completion_timeout(self.config.timeouts.transfer());
        let label = format!("Upload {}", plan.archive.file_name);
        let upload = run_transfer(session, self.credential, &label, self.reporter).await?;
        info!(elapsed = ?upload.elapsed, "upload complete");

        let mut results = vec![upload];
        results.extend(self.run_shell(&plan.steps).await?);
        Ok(RunReport {
            workflow: Workflow::Deploy,
            results,
        })
    }

    /// Read-only diagnostics.
    ///
    /// # Errors
    ///
    /// Returns the first failing step.
    pub async fn debug(&self) -> Result<RunReport, WorkflowError> {
        let results = self.run_shell(&debug_steps(self.config)).await?;
        Ok(RunReport {
            workflow: Workflow::Debug,
            results,
        })
    }

    async fn run_shell(
        &self,
        steps: &[crate::domain::Step],
    ) -> Result<Vec<StepResult>, WorkflowError> {
        let spec = ssh_shell(&self.config.ssh_options());
        self.reporter.step(&format!("Connecting to {}", spec.target));
        let transport = self.factory.spawn(&spec)?;
        let session = Session::new(transport, &spec, self.prompts.clone());
        Ok(run_steps(session, self.credential, steps, self.reporter).await?)
    }
}
