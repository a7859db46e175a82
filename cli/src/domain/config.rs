//! Domain types and validators for the deployment configuration.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::error::ConfigError;
use crate::domain::session::{HostKeyPolicy, SshOptions};

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level configuration, usually read from `vpsctl.yaml`.
///
/// Every field has a default so a partial file only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DeployConfig {
    pub target: TargetConfig,
    pub ssh: SshConfig,
    pub paths: PathsConfig,
    pub archive: ArchiveConfig,
    pub secrets: SecretsConfig,
    pub timeouts: TimeoutsConfig,
    pub proxy: ProxyConfig,
    pub debug: DebugConfig,
}

/// The remote host and login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TargetConfig {
    pub host: String,
    pub user: String,
    pub port: u16,
    /// Hostname shown in the remote shell prompt (e.g. `srv956229`).
    /// Binds prompt detection to this host when set.
    pub hostname: Option<String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            host: "203.0.113.10".to_string(),
            user: "root".to_string(),
            port: 22,
            hostname: None,
        }
    }
}

/// Transport behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SshConfig {
    pub host_key_policy: HostKeyPolicy,
    pub connect_timeout_secs: u64,
    /// Also accept bare `#`/`$` as a prompt for relaxed steps.
    pub allow_sigil_fallback: bool,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host_key_policy: HostKeyPolicy::Disabled,
            connect_timeout_secs: 30,
            allow_sigil_fallback: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Local project directory that gets bundled.
    pub local_dir: PathBuf,
    /// Remote directory the project is extracted into.
    pub remote_dir: String,
    /// Remote directory the archive is uploaded to.
    pub upload_dir: String,
    pub archive_name: String,
    /// Remote directory holding the reverse-proxy stack.
    pub proxy_dir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            local_dir: PathBuf::from("."),
            remote_dir: "/root/app".to_string(),
            upload_dir: "/root".to_string(),
            archive_name: "app.tar.gz".to_string(),
            proxy_dir: "/root/traefik".to_string(),
        }
    }
}

impl PathsConfig {
    /// Remote path of the uploaded archive.
    #[must_use]
    pub fn remote_archive(&self) -> String {
        format!("{}/{}", self.upload_dir.trim_end_matches('/'), self.archive_name)
    }

    /// Compose project name docker derives from the remote directory.
    #[must_use]
    pub fn project_name(&self) -> &str {
        self.remote_dir
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Globs passed to the archiver as `--exclude`.
    pub exclude: Vec<String>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            exclude: ["node_modules", "dist", ".git", ".firebase"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecretsConfig {
    /// `KEY=VALUE` store checked before the environment.
    pub store: PathBuf,
    /// Key looked up in the store and the environment.
    pub key: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            store: PathBuf::from(".env"),
            key: "VPS_PASSWORD".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Ordinary commands.
    pub command_secs: u64,
    /// Installs, image builds and stack restarts.
    pub long_secs: u64,
    /// Archive upload.
    pub transfer_secs: u64,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            command_secs: 300,
            long_secs: 600,
            transfer_secs: 600,
        }
    }
}

impl TimeoutsConfig {
    #[must_use]
    pub fn command(&self) -> Duration {
        Duration::from_secs(self.command_secs)
    }

    #[must_use]
    pub fn long(&self) -> Duration {
        Duration::from_secs(self.long_secs)
    }

    #[must_use]
    pub fn transfer(&self) -> Duration {
        Duration::from_secs(self.transfer_secs)
    }
}

/// Reverse-proxy stack written by `setup`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    pub image: String,
    pub network: String,
    pub acme_email: String,
    /// Host rule for the dashboard router. No dashboard when unset.
    pub dashboard_host: Option<String>,
    /// htpasswd-style `user:hash` list guarding the dashboard.
    pub dashboard_users: Option<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            image: "traefik:v2.10".to_string(),
            network: "traefik-public".to_string(),
            acme_email: "admin@example.com".to_string(),
            dashboard_host: None,
            dashboard_users: None,
        }
    }
}

/// Read-only diagnostics run by `debug`. Empty means the built-in list.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    pub commands: Vec<String>,
}

impl DeployConfig {
    /// `user@host`.
    #[must_use]
    pub fn target_label(&self) -> String {
        format!("{}@{}", self.target.user, self.target.host)
    }

    /// Connection parameters for ssh/scp spawn specs.
    #[must_use]
    pub fn ssh_options(&self) -> SshOptions<'_> {
        SshOptions {
            user: &self.target.user,
            host: &self.target.host,
            port: self.target.port,
            host_key_policy: self.ssh.host_key_policy,
            connect_timeout: Duration::from_secs(self.ssh.connect_timeout_secs),
        }
    }
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a loaded configuration.
///
/// # Errors
///
/// Returns `ConfigError::Invalid` naming the first offending key.
pub fn validate(config: &DeployConfig) -> Result<(), ConfigError> {
    let invalid = |key: &str, reason: &str| ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.to_string(),
    };
    if config.target.host.trim().is_empty() {
        return Err(invalid("target.host", "must not be empty"));
    }
    if config.target.user.trim().is_empty() {
        return Err(invalid("target.user", "must not be empty"));
    }
    for (key, path) in [
        ("paths.remote_dir", &config.paths.remote_dir),
        ("paths.upload_dir", &config.paths.upload_dir),
        ("paths.proxy_dir", &config.paths.proxy_dir),
    ] {
        if !path.starts_with('/') {
            return Err(invalid(key, "must be an absolute remote path"));
        }
    }
    if config.paths.archive_name.is_empty() || config.paths.archive_name.contains('/') {
        return Err(invalid("paths.archive_name", "must be a plain file name"));
    }
    if config.paths.project_name().is_empty() {
        return Err(invalid("paths.remote_dir", "must name a directory below /"));
    }
    for (key, secs) in [
        ("ssh.connect_timeout_secs", config.ssh.connect_timeout_secs),
        ("timeouts.command_secs", config.timeouts.command_secs),
        ("timeouts.long_secs", config.timeouts.long_secs),
        ("timeouts.transfer_secs", config.timeouts.transfer_secs),
    ] {
        if secs == 0 {
            return Err(invalid(key, "must be greater than zero"));
        }
    }
    if config.secrets.key.trim().is_empty() {
        return Err(invalid("secrets.key", "must not be empty"));
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
