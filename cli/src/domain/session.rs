//! Session lifecycle states and spawn parameters.

use std::fmt;
use std::time::Duration;

/// Lifecycle of one interactive connection.
///
/// `Disconnected → Authenticating → Ready → Closed`. Transfer sessions go
/// straight from `Authenticating` to `Closed` when the transfer finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Authenticating,
    Ready,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Authenticating => "authenticating",
            Self::Ready => "ready",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// What the remote side does once authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    /// Interactive shell (`ssh`) that accepts steps until `exit`.
    Shell,
    /// One-shot transfer (`scp`) that exits once the copy completes.
    Transfer,
}

/// Host key checking policy passed to ssh/scp as `StrictHostKeyChecking`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HostKeyPolicy {
    /// Never verify (`no`).
    #[default]
    Disabled,
    /// Accept unknown keys, reject changed ones (`accept-new`).
    AcceptNew,
    /// Require a known key (`yes`).
    Strict,
}

impl HostKeyPolicy {
    #[must_use]
    pub fn as_ssh_option(self) -> &'static str {
        match self {
            Self::Disabled => "StrictHostKeyChecking=no",
            Self::AcceptNew => "StrictHostKeyChecking=accept-new",
            Self::Strict => "StrictHostKeyChecking=yes",
        }
    }
}

/// Everything needed to spawn the subprocess behind a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnSpec {
    pub kind: SessionKind,
    pub program: String,
    pub args: Vec<String>,
    /// `user@host`, used in messages.
    pub target: String,
    pub connect_timeout: Duration,
}

/// Connection parameters shared by shell and transfer sessions.
#[derive(Debug, Clone, Copy)]
pub struct SshOptions<'a> {
    pub user: &'a str,
    pub host: &'a str,
    pub port: u16,
    pub host_key_policy: HostKeyPolicy,
    pub connect_timeout: Duration,
}

impl SshOptions<'_> {
    fn target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    fn common_args(&self, port_flag: &str) -> Vec<String> {
        vec![
            "-o".to_string(),
            self.host_key_policy.as_ssh_option().to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout.as_secs().max(1)),
            port_flag.to_string(),
            self.port.to_string(),
        ]
    }
}

/// Spawn spec for an interactive `ssh` shell.
#[must_use]
pub fn ssh_shell(opts: &SshOptions<'_>) -> SpawnSpec {
    let mut args = opts.common_args("-p");
    args.push("-tt".to_string());
    args.push(opts.target());
    SpawnSpec {
        kind: SessionKind::Shell,
        program: "ssh".to_string(),
        args,
        target: opts.target(),
        connect_timeout: opts.connect_timeout,
    }
}

/// Spawn spec for an `scp` upload of `local` into `remote_dir`.
#[must_use]
pub fn scp_upload(opts: &SshOptions<'_>, local: &str, remote_dir: &str) -> SpawnSpec {
    let mut args = opts.common_args("-P");
    args.push(local.to_string());
    args.push(format!("{}:{remote_dir}", opts.target()));
    SpawnSpec {
        kind: SessionKind::Transfer,
        program: "scp".to_string(),
        args,
        target: opts.target(),
        connect_timeout: opts.connect_timeout,
    }
}
