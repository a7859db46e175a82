//! Step sequencer: ordering, stop-on-failure and the single close point.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use vpsctl::application::services::sequencer::{LOGIN_LABEL, run_steps, run_transfer};
use vpsctl::application::services::session::Session;
use vpsctl::domain::{Credential, SessionError, Step};

use crate::mocks::{
    PASSWORD_PROMPT, RecordingReporter, SECRET, ScriptedTransport, prompts, shell_spec,
    transfer_spec,
};

const T: Duration = Duration::from_secs(5);

fn credential() -> Credential {
    Credential::new(SECRET.to_string())
}

fn steps() -> Vec<Step> {
    vec![
        Step::command("Make directory", "mkdir -p /root/app", T),
        Step::command("Extract", "tar -xzf /root/app.tar.gz -C /root/app", T),
        Step::command("Start", "docker compose up -d --build", T),
    ]
}

#[tokio::test]
async fn all_steps_run_in_order_then_close() {
    let transport = ScriptedTransport::password_login()
        .answers("mkdir -p /root/app", "")
        .answers("tar -xzf /root/app.tar.gz -C /root/app", "")
        .answers("docker compose up -d --build", "Container app-web-1  Started\r\n")
        .reply_and_close("exit\r\n");
    let wire = transport.wire();
    let reporter = RecordingReporter::default();
    let session = Session::new(transport, &shell_spec(), prompts());

    let results = run_steps(session, &credential(), &steps(), &reporter)
        .await
        .expect("run");

    let labels: Vec<_> = results.iter().map(|r| r.label.as_str()).collect();
    assert_eq!(labels, ["Make directory", "Extract", "Start"]);
    assert!(results[2].output.contains("Started"));
    assert_eq!(reporter.steps(), ["Make directory", "Extract", "Start"]);

    let wire = wire.lock().unwrap();
    assert_eq!(
        wire.sent[2..],
        [
            "mkdir -p /root/app\n",
            "tar -xzf /root/app.tar.gz -C /root/app\n",
            "docker compose up -d --build\n",
            "exit\n",
        ]
    );
    assert_eq!(wire.terminated, 1);
}

#[tokio::test(start_paused = true)]
async fn failure_at_step_stops_the_rest() {
    let transport = ScriptedTransport::logged_in()
        .answers("mkdir -p /root/app", "")
        .reply("tar -xzf /root/app.tar.gz -C /root/app\r\nx ./package.json\r\n")
        .silence();
    let wire = transport.wire();
    let reporter = RecordingReporter::default();
    let session = Session::new(transport, &shell_spec(), prompts());

    let failure = run_steps(session, &credential(), &steps(), &reporter)
        .await
        .unwrap_err();

    assert_eq!(failure.label, "Extract");
    assert_eq!(failure.completed.len(), 1);
    assert_eq!(failure.partial_output, "x ./package.json\r\n");
    assert!(matches!(failure.error, SessionError::StepTimeout { .. }));

    let wire = wire.lock().unwrap();
    assert!(!wire.transcript().contains("docker compose"));
    assert_eq!(wire.terminated, 1);
    assert!(!reporter.steps().contains(&"Start".to_string()));
}

#[tokio::test]
async fn login_failure_sends_no_steps_and_closes_once() {
    let transport = ScriptedTransport::new()
        .greeting(PASSWORD_PROMPT)
        .reply(&format!("\r\nPermission denied, please try again.\r\n{PASSWORD_PROMPT}"));
    let wire = transport.wire();
    let reporter = RecordingReporter::default();
    let session = Session::new(transport, &shell_spec(), prompts());

    let failure = run_steps(session, &credential(), &steps(), &reporter)
        .await
        .unwrap_err();

    assert_eq!(failure.label, LOGIN_LABEL);
    assert!(matches!(failure.error, SessionError::Authentication { .. }));
    assert!(failure.completed.is_empty());

    let wire = wire.lock().unwrap();
    assert_eq!(wire.sent, [SECRET, "\n"]);
    assert_eq!(wire.terminated, 1);
    assert!(reporter.steps().is_empty());
}

#[tokio::test]
async fn lost_session_is_closed_once_without_exit() {
    let transport = ScriptedTransport::logged_in()
        .answers("mkdir -p /root/app", "")
        .hang_up();
    let wire = transport.wire();
    let session = Session::new(transport, &shell_spec(), prompts());

    let failure = run_steps(session, &credential(), &steps(), &RecordingReporter::default())
        .await
        .unwrap_err();

    assert_eq!(failure.label, "Extract");
    assert!(matches!(failure.error, SessionError::SessionLost { .. }));
    let wire = wire.lock().unwrap();
    assert_eq!(wire.sends_of("exit\n"), 0);
    assert_eq!(wire.terminated, 1);
}

#[tokio::test]
async fn empty_step_list_only_logs_in_and_out() {
    let transport = ScriptedTransport::logged_in().reply_and_close("logout\r\n");
    let wire = transport.wire();
    let session = Session::new(transport, &shell_spec(), prompts());

    let results = run_steps(session, &credential(), &[], &RecordingReporter::default())
        .await
        .expect("run");

    assert!(results.is_empty());
    assert_eq!(wire.lock().unwrap().sent, ["exit\n"]);
}

#[tokio::test]
async fn transfer_reports_success_and_closes_once() {
    let transport = ScriptedTransport::new()
        .greeting(PASSWORD_PROMPT)
        .reply_and_close("\r\napp.tar.gz 100%\r\n");
    let wire = transport.wire();
    let reporter = RecordingReporter::default();
    let session = Session::new(transport, &transfer_spec(), prompts());

    let result = run_transfer(session, &credential(), "Upload app.tar.gz", &reporter)
        .await
        .expect("transfer");

    assert_eq!(result.label, "Upload app.tar.gz");
    assert!(result.success);
    assert_eq!(wire.lock().unwrap().terminated, 1);
    assert!(
        reporter
            .events
            .borrow()
            .iter()
            .any(|e| e.starts_with("success: Upload app.tar.gz"))
    );
}

#[tokio::test]
async fn failed_transfer_is_labelled() {
    let transport = ScriptedTransport::new()
        .greeting(PASSWORD_PROMPT)
        .reply_and_close("\r\nscp: /root: Permission denied\r\n")
        .exit_code(Some(1));
    let session = Session::new(transport, &transfer_spec(), prompts());

    let failure = run_transfer(session, &credential(), "Upload", &RecordingReporter::default())
        .await
        .unwrap_err();

    assert_eq!(failure.label, "Upload");
    assert!(matches!(failure.error, SessionError::TransferFailed { code: 1, .. }), "{:?}", failure.error);
}

#[tokio::test]
async fn transfer_without_exit_status_succeeds_with_warning() {
    let transport = ScriptedTransport::new()
        .greeting(PASSWORD_PROMPT)
        .reply_and_close("\r\napp.tar.gz  100%\r\n")
        .exit_code(None);
    let reporter = RecordingReporter::default();
    let session = Session::new(transport, &transfer_spec(), prompts());

    let result = run_transfer(session, &credential(), "Upload", &reporter)
        .await
        .expect("transfer");

    assert!(result.success);
    let events = reporter.events.borrow();
    let success = events.iter().position(|e| e.starts_with("success: Upload"));
    let warning = events
        .iter()
        .position(|e| e.starts_with("warn: Upload") && e.contains("exit status unavailable"));
    assert!(success.is_some() && warning > success, "{events:?}");
}
