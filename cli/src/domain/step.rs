//! Steps: the unit of remote work, and the result captured for each.

use std::time::Duration;

use crate::domain::prompt::PromptPattern;

/// Delimiter for heredoc file writes. Quoted on the opening line so the
/// remote shell performs no expansion inside the body.
pub const HEREDOC_MARKER: &str = "VPSCTL_EOF";

/// How a step's payload is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// A command line; a newline is appended.
    ShellCommand,
    /// Sent verbatim with no terminator (e.g. streamed heredoc content).
    RawSend,
    /// Payload becomes the body of a heredoc written to `path`.
    FileWrite { path: String },
}

/// Which patterns end a step.
#[derive(Debug, Clone)]
pub enum Terminator {
    /// Only the most specific shell prompt for the target.
    Prompt,
    /// Any shell prompt in the target's set, generic sigils included when enabled.
    AnyPrompt,
    /// A caller-supplied pattern.
    Custom(PromptPattern),
}

/// One remote operation. Built by the workflow layer, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Step {
    pub label: String,
    pub payload: String,
    pub timeout: Duration,
    pub kind: StepKind,
    pub terminator: Terminator,
}

impl Step {
    /// A shell command ended by the strict prompt.
    #[must_use]
    pub fn command(label: impl Into<String>, command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            label: label.into(),
            payload: command.into(),
            timeout,
            kind: StepKind::ShellCommand,
            terminator: Terminator::Prompt,
        }
    }

    /// A heredoc write of `body` to the remote `path`.
    #[must_use]
    pub fn file_write(
        label: impl Into<String>,
        path: impl Into<String>,
        body: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            label: label.into(),
            payload: body.into(),
            timeout,
            kind: StepKind::FileWrite { path: path.into() },
            terminator: Terminator::Prompt,
        }
    }

    /// Verbatim bytes, ended by `until`.
    #[must_use]
    pub fn raw(
        label: impl Into<String>,
        payload: impl Into<String>,
        until: PromptPattern,
        timeout: Duration,
    ) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
            timeout,
            kind: StepKind::RawSend,
            terminator: Terminator::Custom(until),
        }
    }

    /// Accept any prompt in the target's set instead of only the strictest.
    #[must_use]
    pub fn any_prompt(mut self) -> Self {
        self.terminator = Terminator::AnyPrompt;
        self
    }

    /// Bytes written to the session for this step.
    #[must_use]
    pub fn wire_payload(&self) -> String {
        match &self.kind {
            StepKind::ShellCommand => format!("{}\n", self.payload),
            StepKind::RawSend => self.payload.clone(),
            StepKind::FileWrite { path } => {
                let mut out = format!("cat > '{path}' <<'{HEREDOC_MARKER}'\n{}", self.payload);
                if !self.payload.ends_with('\n') {
                    out.push('\n');
                }
                out.push_str(HEREDOC_MARKER);
                out.push('\n');
                out
            }
        }
    }

    /// The last line the remote terminal will echo back, if any.
    ///
    /// Captured output starts after this line.
    #[must_use]
    pub fn echo_line(&self) -> Option<String> {
        match &self.kind {
            StepKind::ShellCommand => self.payload.lines().last().map(str::to_owned),
            StepKind::FileWrite { .. } => Some(HEREDOC_MARKER.to_string()),
            StepKind::RawSend => None,
        }
    }
}

/// Output captured for one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    pub label: String,
    pub output: String,
    pub elapsed: Duration,
    pub success: bool,
}
