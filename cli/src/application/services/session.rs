//! Session driver: one interactive ssh/scp subprocess behind a state machine.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! Output is accumulated in an unread buffer and matched against
//! `PromptPattern`s; whatever precedes the match belongs to the current
//! step, whatever follows stays buffered for the next one.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::application::ports::{Received, Transport};
use crate::domain::prompt::{PatternKind, PromptPattern, PromptSet, eof_index, find_earliest};
use crate::domain::step::{HEREDOC_MARKER, StepKind};
use crate::domain::{
    Credential, SessionError, SessionKind, SessionState, SpawnSpec, Step, StepResult, Terminator,
};

/// How long `close` waits for the shell to exit after `exit`.
const EXIT_GRACE: Duration = Duration::from_secs(2);

/// Bytes past the echo length searched for the echoed command line.
const ECHO_WINDOW_SLACK: usize = 64;

/// Outcome of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Established {
    /// A shell prompt appeared; steps may be executed.
    Ready,
    /// The remote side finished and exited (transfer sessions).
    /// `exit_code` is `None` when the status could not be collected.
    Finished {
        output: String,
        exit_code: Option<u32>,
    },
}

struct Expected {
    kind: PatternKind,
    before: Vec<u8>,
    matched: Vec<u8>,
}

enum ExpectError {
    Timeout(Duration),
    Eof,
    Io(std::io::Error),
}

/// A live connection. Only a `Ready` session accepts steps.
pub struct Session<T: Transport> {
    transport: T,
    kind: SessionKind,
    state: SessionState,
    target: String,
    prompts: PromptSet,
    connect_timeout: Duration,
    completion_timeout: Duration,
    buffer: Vec<u8>,
    released: bool,
    exit_code: Option<u32>,
}

impl<T: Transport> Session<T> {
    /// Wrap a freshly spawned transport. The session starts `Disconnected`.
    #[must_use]
    pub fn new(transport: T, spec: &SpawnSpec, prompts: PromptSet) -> Self {
        Self {
            transport,
            kind: spec.kind,
            state: SessionState::Disconnected,
            target: spec.target.clone(),
            prompts,
            connect_timeout: spec.connect_timeout,
            completion_timeout: spec.connect_timeout,
            buffer: Vec::new(),
            released: false,
            exit_code: None,
        }
    }

    /// How long a transfer session may run before it counts as hung.
    #[must_use]
    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn kind(&self) -> SessionKind {
        self.kind
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Everything received but not yet consumed by a match.
    #[must_use]
    pub fn unread(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }

    /// The unread buffer seen as `step`'s output, echo removed.
    #[must_use]
    pub fn partial_output(&self, step: &Step) -> String {
        String::from_utf8_lossy(step_output(step, &self.buffer)).into_owned()
    }

    fn login_timeout(&self) -> Duration {
        match self.kind {
            SessionKind::Shell => self.connect_timeout,
            SessionKind::Transfer => self.completion_timeout,
        }
    }

    /// Race the login prompts and, if asked, send the credential once.
    ///
    /// # Errors
    ///
    /// - `SessionError::Authentication` if no prompt appears in time, the
    ///   credential is rejected, or a shell session closes during login.
    /// - `SessionError::TransferFailed` if a transfer exits non-zero.
    /// - `SessionError::SessionLost` on transport failure.
    pub async fn authenticate(
        &mut self,
        credential: &Credential,
    ) -> Result<Established, SessionError> {
        if self.state != SessionState::Disconnected {
            return Err(self.auth_error(format!("session is already {}", self.state)));
        }
        self.state = SessionState::Authenticating;
        info!(target = %self.target, kind = ?self.kind, "authenticating");

        let timeout = self.login_timeout();
        let mut login = vec![PromptPattern::password(), PromptPattern::login_failure()];
        if self.kind == SessionKind::Shell {
            login.extend(self.prompts.all().iter().cloned());
        }
        login.push(PromptPattern::eof());

        let first = self
            .expect(&login, timeout)
            .await
            .map_err(|e| self.login_error(e, "login prompt"))?;

        let found = if first.kind == PatternKind::Password {
            debug!(target = %self.target, "password prompt; sending credential");
            self.send(credential.expose().as_bytes()).await?;
            self.send(b"\n").await?;

            let mut after = Vec::new();
            if self.kind == SessionKind::Shell {
                after.extend(self.prompts.all().iter().cloned());
            }
            after.push(PromptPattern::password());
            // scp reports remote errors such as an unwritable target as
            // "Permission denied"; for transfers the exit status decides.
            if self.kind == SessionKind::Shell {
                after.push(PromptPattern::login_failure());
            }
            after.push(PromptPattern::eof());
            let second = self
                .expect(&after, timeout)
                .await
                .map_err(|e| self.login_error(e, "response to credential"))?;
            if second.kind == PatternKind::Password {
                return Err(self.auth_error("credential rejected".to_string()));
            }
            second
        } else {
            first
        };

        match found.kind {
            kind if kind.is_shell_prompt() => {
                self.state = SessionState::Ready;
                info!(target = %self.target, prompt = ?kind, "session ready");
                Ok(Established::Ready)
            }
            PatternKind::LoginFailure => {
                let reason = String::from_utf8_lossy(&found.matched).into_owned();
                Err(self.auth_error(reason))
            }
            PatternKind::Eof => self.finish_on_eof(&found.before),
            other => Err(self.auth_error(format!("unexpected {other:?} during login"))),
        }
    }

    fn finish_on_eof(&mut self, before: &[u8]) -> Result<Established, SessionError> {
        let output = String::from_utf8_lossy(before).into_owned();
        if self.kind == SessionKind::Shell {
            let tail = output.trim().lines().last().unwrap_or("no output").to_string();
            return Err(self.auth_error(format!("connection closed before a shell prompt ({tail})")));
        }
        match self.release() {
            Some(code) if code != 0 => Err(SessionError::TransferFailed {
                target: self.target.clone(),
                code,
            }),
            exit_code => Ok(Established::Finished { output, exit_code }),
        }
    }

    /// Send one step and block until its terminator matches.
    ///
    /// # Errors
    ///
    /// - `SessionError::NotReady` unless the session is `Ready`.
    /// - `SessionError::StepTimeout` if no terminator matches within the
    ///   step timeout. Nothing is retried.
    /// - `SessionError::SessionLost` if the transport fails or the remote
    ///   side exits; the session becomes `Closed`.
    pub async fn execute(&mut self, step: &Step) -> Result<StepResult, SessionError> {
        if self.state != SessionState::Ready {
            return Err(SessionError::NotReady { state: self.state });
        }
        let patterns = match &step.terminator {
            Terminator::Prompt => vec![self.prompts.strict().clone()],
            Terminator::AnyPrompt => self.prompts.all().to_vec(),
            Terminator::Custom(pattern) => vec![pattern.clone()],
        };

        let started = Instant::now();
        let payload = step.wire_payload();
        debug!(label = %step.label, bytes = payload.len(), "sending step");
        self.send(payload.as_bytes()).await?;

        match self.expect(&patterns, step.timeout).await {
            Ok(found) => {
                let output = step_output(step, &found.before);
                debug!(label = %step.label, prompt = ?found.kind, "step finished");
                Ok(StepResult {
                    label: step.label.clone(),
                    output: String::from_utf8_lossy(output).into_owned(),
                    elapsed: started.elapsed(),
                    success: true,
                })
            }
            Err(ExpectError::Timeout(elapsed)) => {
                warn!(label = %step.label, secs = elapsed.as_secs(), "step timed out");
                Err(SessionError::StepTimeout {
                    label: step.label.clone(),
                    elapsed,
                })
            }
            Err(ExpectError::Eof) => Err(self.lost("remote side closed the connection")),
            Err(ExpectError::Io(e)) => Err(self.lost(&e.to_string())),
        }
    }

    /// Exit the shell if it is ready, then terminate and reap the subprocess.
    ///
    /// Idempotent: only the first call touches the transport.
    pub async fn close(&mut self) -> Option<u32> {
        if self.released {
            return self.exit_code;
        }
        if self.state == SessionState::Ready && self.transport.send(b"exit\n").await.is_ok() {
            let _ = self.expect(&[PromptPattern::eof()], EXIT_GRACE).await;
        }
        self.release()
    }

    fn release(&mut self) -> Option<u32> {
        if !self.released {
            self.exit_code = self.transport.terminate();
            self.released = true;
            self.state = SessionState::Closed;
            info!(target = %self.target, exit_code = ?self.exit_code, "session closed");
        }
        self.exit_code
    }

    async fn send(&mut self, data: &[u8]) -> Result<(), SessionError> {
        if let Err(e) = self.transport.send(data).await {
            return Err(self.lost(&e.to_string()));
        }
        Ok(())
    }

    async fn expect(
        &mut self,
        patterns: &[PromptPattern],
        timeout: Duration,
    ) -> Result<Expected, ExpectError> {
        let started = Instant::now();
        let deadline = started + timeout;
        loop {
            if let Some(m) = find_earliest(patterns, &self.buffer) {
                let rest = self.buffer.split_off(m.end);
                let matched = self.buffer.split_off(m.start);
                let before = std::mem::replace(&mut self.buffer, rest);
                return Ok(Expected {
                    kind: m.kind,
                    before,
                    matched,
                });
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(ExpectError::Timeout(now - started));
            }
            match self.transport.recv(deadline - now).await {
                Ok(Received::Data(bytes)) => self.buffer.extend_from_slice(&bytes),
                Ok(Received::Idle) => {}
                Ok(Received::Eof) => {
                    self.state = SessionState::Closed;
                    if eof_index(patterns).is_some() {
                        return Ok(Expected {
                            kind: PatternKind::Eof,
                            before: std::mem::take(&mut self.buffer),
                            matched: Vec::new(),
                        });
                    }
                    return Err(ExpectError::Eof);
                }
                Err(e) => {
                    self.state = SessionState::Closed;
                    return Err(ExpectError::Io(e));
                }
            }
        }
    }

    fn login_error(&mut self, err: ExpectError, waiting_for: &str) -> SessionError {
        match err {
            ExpectError::Timeout(elapsed) if self.kind == SessionKind::Transfer => {
                SessionError::StepTimeout {
                    label: format!("transfer to {}", self.target),
                    elapsed,
                }
            }
            ExpectError::Timeout(elapsed) => self.auth_error(format!(
                "no {waiting_for} within {}s",
                elapsed.as_secs()
            )),
            ExpectError::Eof => self.auth_error("connection closed during login".to_string()),
            ExpectError::Io(e) => self.lost(&e.to_string()),
        }
    }

    fn auth_error(&self, reason: String) -> SessionError {
        warn!(target = %self.target, %reason, "authentication failed");
        SessionError::Authentication {
            target: self.target.clone(),
            reason,
        }
    }

    fn lost(&mut self, reason: &str) -> SessionError {
        self.state = SessionState::Closed;
        warn!(target = %self.target, reason, "session lost");
        SessionError::SessionLost {
            target: self.target.clone(),
            reason: reason.to_string(),
        }
    }
}

impl<T: Transport> Drop for Session<T> {
    fn drop(&mut self) {
        if !self.released {
            warn!(target = %self.target, "session dropped without close; terminating");
            self.transport.terminate();
        }
    }
}

/// `before` with the terminal's echo of `step` removed.
#[must_use]
pub fn step_output<'a>(step: &Step, before: &'a [u8]) -> &'a [u8] {
    match step.kind {
        StepKind::FileWrite { .. } => strip_heredoc_echo(before, HEREDOC_MARKER),
        _ => strip_echo(before, step.echo_line().as_deref()),
    }
}

/// Drop everything up to and including the last line that closes a heredoc.
///
/// The shell echoes the body behind its continuation prompt, so the closing
/// line reads either `marker` or `> marker`. The opening `<<'marker'` line
/// does not count. `before` is returned unchanged when no closing line is found.
#[must_use]
pub fn strip_heredoc_echo<'a>(before: &'a [u8], marker: &str) -> &'a [u8] {
    let marker = marker.as_bytes();
    let mut cut = None;
    let mut start = 0;
    for line in before.split_inclusive(|&b| b == b'\n') {
        let end = start + line.len();
        let text = line.trim_ascii_end();
        let text = text.strip_prefix(b"> ").unwrap_or(text);
        if text == marker {
            cut = Some(end);
        }
        start = end;
    }
    cut.map_or(before, |end| &before[end..])
}

/// Drop the terminal's echo of `echo` from the head of `before`.
///
/// The echo is looked for near the start only, so command text repeated
/// later in real output is kept. Everything up to and including the end of
/// the echoed line is removed; `before` is returned unchanged when the echo
/// is not found.
#[must_use]
pub fn strip_echo<'a>(before: &'a [u8], echo: Option<&str>) -> &'a [u8] {
    let Some(needle) = echo.map(str::as_bytes).filter(|n| !n.is_empty()) else {
        return before;
    };
    let window = (needle.len() + ECHO_WINDOW_SLACK).min(before.len());
    let Some(pos) = before[..window]
        .windows(needle.len())
        .position(|w| w == needle)
    else {
        return before;
    };
    let after = pos + needle.len();
    match before[after..].iter().position(|&b| b == b'\n') {
        Some(nl) => &before[after + nl + 1..],
        None => &before[after..],
    }
}
