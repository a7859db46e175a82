//! Prompt recognizers and the earliest-match rule used by the session driver.
//!
//! Pure functions only: matching operates on an in-memory byte buffer.

#![allow(clippy::expect_used)] // Built-in patterns are compile-time constants

use regex::bytes::Regex;

use crate::domain::error::SessionError;

const PASSWORD_PROMPT: &str = r"(?i)password:\s*$";
const LOGIN_FAILURE: &str = "Permission denied|Host key verification failed|Connection refused\
|Could not resolve hostname|Connection timed out|No route to host";
const SIGIL_PROMPT: &str = r"[#$] ?$";
const CONTINUATION_PROMPT: &str = r"(?:^|\n)> $";

/// Identity of a recognizer; decides what the driver does after a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// `password:` login prompt.
    Password,
    /// Shell prompt bound to the configured user and hostname.
    HostPrompt,
    /// Shell prompt bound to the configured user on any host.
    UserPrompt,
    /// Bare `#`/`$` sigil. Last-resort fallback.
    Sigil,
    /// Text emitted by ssh/scp when the login cannot succeed.
    LoginFailure,
    /// Heredoc continuation prompt (`> `).
    Continuation,
    /// Caller-supplied pattern.
    Custom,
    /// Remote side closed the stream.
    Eof,
}

impl PatternKind {
    /// Returns `true` for the shell prompt kinds.
    #[must_use]
    pub fn is_shell_prompt(self) -> bool {
        matches!(self, Self::HostPrompt | Self::UserPrompt | Self::Sigil)
    }
}

/// One recognizer: an identity plus the regex it matches (none for `Eof`).
#[derive(Debug, Clone)]
pub struct PromptPattern {
    kind: PatternKind,
    regex: Option<Regex>,
}

impl PromptPattern {
    /// Compile a pattern from a regex source.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Pattern` if `source` is not a valid regex.
    pub fn new(kind: PatternKind, source: &str) -> Result<Self, SessionError> {
        let regex = Regex::new(source).map_err(|e| SessionError::Pattern {
            pattern: source.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            kind,
            regex: Some(regex),
        })
    }

    fn builtin(kind: PatternKind, source: &str) -> Self {
        Self {
            kind,
            regex: Some(Regex::new(source).expect("valid built-in pattern")),
        }
    }

    /// `password:` prompt at the end of the buffer.
    #[must_use]
    pub fn password() -> Self {
        Self::builtin(PatternKind::Password, PASSWORD_PROMPT)
    }

    /// ssh/scp failure text that ends a login attempt.
    #[must_use]
    pub fn login_failure() -> Self {
        Self::builtin(PatternKind::LoginFailure, LOGIN_FAILURE)
    }

    /// Heredoc continuation prompt.
    #[must_use]
    pub fn continuation() -> Self {
        Self::builtin(PatternKind::Continuation, CONTINUATION_PROMPT)
    }

    /// End-of-file marker. Only fires when the transport reports EOF.
    #[must_use]
    pub fn eof() -> Self {
        Self {
            kind: PatternKind::Eof,
            regex: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.kind == PatternKind::Eof
    }

    fn find(&self, haystack: &[u8]) -> Option<(usize, usize)> {
        self.regex
            .as_ref()
            .and_then(|re| re.find(haystack))
            .map(|m| (m.start(), m.end()))
    }
}

/// Result of matching a pattern list against the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Identity of the pattern that fired.
    pub kind: PatternKind,
    /// Position of that pattern in the list it was tried from.
    pub index: usize,
    /// Byte offset where the match starts (end of the "before" region).
    pub start: usize,
    /// Byte offset just past the match.
    pub end: usize,
}

/// Find the match that starts earliest in `buffer`; ties go to list order.
///
/// `Eof` patterns never match here, the driver handles them when the
/// transport reports end-of-file.
#[must_use]
pub fn find_earliest(patterns: &[PromptPattern], buffer: &[u8]) -> Option<Match> {
    let mut best: Option<Match> = None;
    for (index, pattern) in patterns.iter().enumerate() {
        let Some((start, end)) = pattern.find(buffer) else {
            continue;
        };
        if best.is_none_or(|b| start < b.start) {
            best = Some(Match {
                kind: pattern.kind,
                index,
                start,
                end,
            });
        }
    }
    best
}

/// Index of the first `Eof` pattern in the list, if any.
#[must_use]
pub fn eof_index(patterns: &[PromptPattern]) -> Option<usize> {
    patterns.iter().position(PromptPattern::is_eof)
}

/// Shell prompt recognizers for one target, most specific first.
#[derive(Debug, Clone)]
pub struct PromptSet {
    shell: Vec<PromptPattern>,
}

impl PromptSet {
    /// Build the prompt set for `user` on a host whose prompt shows `hostname`.
    ///
    /// With a hostname the first entry is bound to it; the user-bound prompt
    /// follows; bare sigils are appended only when `allow_sigil` is set.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Pattern` if a generated pattern fails to compile.
    pub fn for_target(
        user: &str,
        hostname: Option<&str>,
        allow_sigil: bool,
    ) -> Result<Self, SessionError> {
        let user = regex::escape(user);
        let mut shell = Vec::with_capacity(3);
        if let Some(host) = hostname.filter(|h| !h.is_empty()) {
            let host = regex::escape(host);
            shell.push(PromptPattern::new(
                PatternKind::HostPrompt,
                &format!(r"{user}@{host}[^\r\n]*[#$] ?$"),
            )?);
        }
        shell.push(PromptPattern::new(
            PatternKind::UserPrompt,
            &format!(r"{user}@[^\s:@]+:[^\r\n]*[#$] ?$"),
        )?);
        if allow_sigil {
            shell.push(PromptPattern::builtin(PatternKind::Sigil, SIGIL_PROMPT));
        }
        Ok(Self { shell })
    }

    /// The most specific prompt available for this target.
    #[must_use]
    pub fn strict(&self) -> &PromptPattern {
        &self.shell[0]
    }

    /// All prompts, most specific first.
    #[must_use]
    pub fn all(&self) -> &[PromptPattern] {
        &self.shell
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
