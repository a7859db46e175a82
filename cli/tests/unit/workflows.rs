//! Orchestrator: setup, deploy and debug over scripted sessions.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use vpsctl::application::services::workflows::{Orchestrator, Workflow, WorkflowError};
use vpsctl::domain::session::SessionKind;
use vpsctl::domain::{ArchiveError, Credential, DeployConfig, SessionError};

use crate::mocks::{
    FakeRunner, PASSWORD_PROMPT, RecordingReporter, SECRET, ScriptedFactory, ScriptedTransport,
};

fn credential() -> Credential {
    Credential::new(SECRET.to_string())
}

fn upload_ok() -> ScriptedTransport {
    ScriptedTransport::new()
        .greeting(PASSWORD_PROMPT)
        .reply_and_close("\r\napp.tar.gz 100%\r\n")
}

#[tokio::test]
async fn setup_runs_every_step_in_one_shell_session() {
    let config = DeployConfig::default();
    let shell = ScriptedTransport::password_login()
        .prompts_for(8)
        .reply_and_close("logout\r\n");
    let wire = shell.wire();
    let factory = ScriptedFactory::new(vec![shell]);
    let runner = FakeRunner::succeeding();
    let reporter = RecordingReporter::default();
    let cred = credential();
    let orchestrator = Orchestrator::new(&config, &factory, &runner, &reporter, &cred).unwrap();

    let report = orchestrator.run(Workflow::Setup).await.expect("setup");

    assert_eq!(report.workflow, Workflow::Setup);
    assert_eq!(report.results.len(), 8);
    assert_eq!(factory.programs(), ["ssh"]);
    assert!(runner.calls.borrow().is_empty());

    let transcript = wire.lock().unwrap().transcript();
    assert!(transcript.contains("sh get-docker.sh\n"));
    assert!(transcript.contains("<<'VPSCTL_EOF'\n"));
    assert!(transcript.contains("chmod 600 /root/traefik/acme.json\n"));
    assert!(transcript.contains("docker network create traefik-public || true\n"));
}

#[tokio::test]
async fn deploy_archives_uploads_then_rebuilds() {
    let config = DeployConfig::default();
    let shell = ScriptedTransport::logged_in()
        .prompts_for(4)
        .reply_and_close("logout\r\n");
    let wire = shell.wire();
    let factory = ScriptedFactory::new(vec![upload_ok(), shell]);
    let runner = FakeRunner::succeeding();
    let reporter = RecordingReporter::default();
    let cred = credential();
    let orchestrator = Orchestrator::new(&config, &factory, &runner, &reporter, &cred).unwrap();

    let report = orchestrator.deploy().await.expect("deploy");

    assert_eq!(report.results.len(), 5);
    assert_eq!(report.results[0].label, "Upload app.tar.gz");

    let calls = runner.calls.borrow();
    assert_eq!(calls.len(), 1);
    let (program, args) = &calls[0];
    assert_eq!(program, "tar");
    assert!(args.contains(&"--exclude=node_modules".to_string()));
    assert!(args.contains(&"--exclude=.git".to_string()));

    let spawned = factory.spawned.borrow();
    assert_eq!(spawned[0].kind, SessionKind::Transfer);
    assert_eq!(spawned[0].args.last().unwrap(), "root@203.0.113.10:/root");
    assert_eq!(spawned[1].kind, SessionKind::Shell);

    let transcript = wire.lock().unwrap().transcript();
    let extract = transcript.find("tar -xzf /root/app.tar.gz -C /root/app").unwrap();
    let remove = transcript.find("rm /root/app.tar.gz").unwrap();
    let rebuild = transcript.find("docker compose up -d --build").unwrap();
    assert!(extract < remove && remove < rebuild);
}

#[tokio::test]
async fn archive_failure_blocks_upload() {
    let config = DeployConfig::default();
    let factory = ScriptedFactory::new(vec![upload_ok()]);
    let runner = FakeRunner::failing();
    let reporter = RecordingReporter::default();
    let cred = credential();
    let orchestrator = Orchestrator::new(&config, &factory, &runner, &reporter, &cred).unwrap();

    let err = orchestrator.deploy().await.unwrap_err();

    assert!(matches!(err, WorkflowError::Archive(ArchiveError::Failed { code: 2, .. })));
    assert!(factory.spawned.borrow().is_empty());
}

#[tokio::test]
async fn failed_upload_skips_remote_steps() {
    let config = DeployConfig::default();
    let upload = ScriptedTransport::new()
        .greeting(PASSWORD_PROMPT)
        .reply_and_close("\r\nscp: /root/app.tar.gz: No space left on device\r\n")
        .exit_code(Some(1));
    let factory = ScriptedFactory::new(vec![upload, ScriptedTransport::logged_in()]);
    let runner = FakeRunner::succeeding();
    let reporter = RecordingReporter::default();
    let cred = credential();
    let orchestrator = Orchestrator::new(&config, &factory, &runner, &reporter, &cred).unwrap();

    let err = orchestrator.deploy().await.unwrap_err();

    match err {
        WorkflowError::Sequence(failure) => {
            assert_eq!(failure.label, "Upload app.tar.gz");
            assert!(matches!(failure.error, SessionError::TransferFailed { code: 1, .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(factory.programs(), ["scp"]);
}

#[tokio::test]
async fn debug_runs_default_diagnostics() {
    let config = DeployConfig::default();
    let shell = ScriptedTransport::logged_in()
        .answers("docker logs app-web-1 --tail 100", "listening on :80\r\n")
        .prompts_for(2)
        .reply_and_close("logout\r\n");
    let factory = ScriptedFactory::new(vec![shell]);
    let runner = FakeRunner::succeeding();
    let reporter = RecordingReporter::default();
    let cred = credential();
    let orchestrator = Orchestrator::new(&config, &factory, &runner, &reporter, &cred).unwrap();

    let report = orchestrator.run(Workflow::Debug).await.expect("debug");

    assert_eq!(report.results.len(), 3);
    assert_eq!(report.results[0].output, "listening on :80\r\n");
    assert!(
        reporter
            .events
            .borrow()
            .contains(&"output: listening on :80\r\n".to_string())
    );
}

#[tokio::test]
async fn configured_debug_commands_replace_defaults() {
    let mut config = DeployConfig::default();
    config.debug.commands = vec!["docker ps".to_string()];
    let shell = ScriptedTransport::logged_in()
        .prompts_for(1)
        .reply_and_close("logout\r\n");
    let wire = shell.wire();
    let factory = ScriptedFactory::new(vec![shell]);
    let runner = FakeRunner::succeeding();
    let reporter = RecordingReporter::default();
    let cred = credential();
    let orchestrator = Orchestrator::new(&config, &factory, &runner, &reporter, &cred).unwrap();

    let report = orchestrator.debug().await.expect("debug");

    assert_eq!(report.results.len(), 1);
    assert_eq!(wire.lock().unwrap().sent, ["docker ps\n", "exit\n"]);
}

#[tokio::test]
async fn spawn_failure_is_session_error() {
    let config = DeployConfig::default();
    let factory = ScriptedFactory::new(Vec::new());
    let runner = FakeRunner::succeeding();
    let reporter = RecordingReporter::default();
    let cred = credential();
    let orchestrator = Orchestrator::new(&config, &factory, &runner, &reporter, &cred).unwrap();

    let err = orchestrator.setup().await.unwrap_err();

    assert!(matches!(err, WorkflowError::Session(SessionError::Spawn { .. })));
}
