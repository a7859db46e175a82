//! The three fixed workflows as ordered step lists.
//!
//! Pure builders: configuration in, steps out. Nothing here touches a session.

use std::path::PathBuf;

use crate::domain::compose::render_proxy_compose;
use crate::domain::config::DeployConfig;
use crate::domain::step::Step;

/// What the archive builder should bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSpec {
    pub source: PathBuf,
    pub file_name: String,
    pub exclude: Vec<String>,
}

/// Everything `deploy` does, in order: bundle, upload, then `steps`.
#[derive(Debug, Clone)]
pub struct DeployPlan {
    pub archive: ArchiveSpec,
    /// Remote directory the archive is copied into.
    pub upload_dir: String,
    pub steps: Vec<Step>,
}

/// Quote `s` for a POSIX shell when it contains anything unusual.
#[must_use]
pub fn sh_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"/._-+:@%=,".contains(&b));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

/// Install docker, materialize the reverse proxy and start it.
#[must_use]
pub fn setup_steps(cfg: &DeployConfig) -> Vec<Step> {
    let t = &cfg.timeouts;
    let dir = sh_quote(&cfg.paths.proxy_dir);
    let proxy_dir = cfg.paths.proxy_dir.trim_end_matches('/');
    let acme = sh_quote(&format!("{proxy_dir}/acme.json"));
    let network = sh_quote(&cfg.proxy.network);

    vec![
        Step::command(
            "Download docker installer",
            "curl -fsSL https://get.docker.com -o get-docker.sh",
            t.command(),
        ),
        Step::command("Install docker", "sh get-docker.sh", t.long()),
        Step::command("Create proxy directory", format!("mkdir -p {dir}"), t.command()).any_prompt(),
        Step::file_write(
            "Write proxy compose file",
            format!("{proxy_dir}/docker-compose.yml"),
            render_proxy_compose(&cfg.proxy),
            t.command(),
        ),
        Step::command("Create certificate store", format!("touch {acme}"), t.command()).any_prompt(),
        Step::command(
            "Restrict certificate store",
            format!("chmod 600 {acme}"),
            t.command(),
        )
        .any_prompt(),
        Step::command(
            "Create shared network",
            format!("docker network create {network} || true"),
            t.command(),
        ),
        Step::command(
            "Start reverse proxy",
            format!("cd {dir} && docker compose up -d"),
            t.long(),
        ),
    ]
}

/// Bundle the project, upload it, extract it and rebuild the stack.
#[must_use]
pub fn deploy_plan(cfg: &DeployConfig) -> DeployPlan {
    let t = &cfg.timeouts;
    let remote_dir = sh_quote(&cfg.paths.remote_dir);
    let remote_archive = sh_quote(&cfg.paths.remote_archive());

    DeployPlan {
        archive: ArchiveSpec {
            source: cfg.paths.local_dir.clone(),
            file_name: cfg.paths.archive_name.clone(),
            exclude: cfg.archive.exclude.clone(),
        },
        upload_dir: cfg.paths.upload_dir.clone(),
        steps: vec![
            Step::command(
                "Create project directory",
                format!("mkdir -p {remote_dir}"),
                t.command(),
            ),
            Step::command(
                "Extract archive",
                format!("tar -xzf {remote_archive} -C {remote_dir}"),
                t.long(),
            ),
            Step::command("Remove archive", format!("rm {remote_archive}"), t.command()),
            Step::command(
                "Rebuild and restart stack",
                format!("cd {remote_dir} && docker compose up -d --build"),
                t.long(),
            ),
        ],
    }
}

/// Diagnostics run by `debug` when the config lists none.
#[must_use]
pub fn default_debug_commands(project: &str) -> Vec<String> {
    vec![
        format!("docker logs {project}-web-1 --tail 100"),
        format!("docker exec {project}-server-1 wget -qO- http://localhost:3000/health"),
        format!("docker exec {project}-web-1 wget -qO- http://server:3000/health"),
    ]
}

/// Read-only diagnostic commands.
#[must_use]
pub fn debug_steps(cfg: &DeployConfig) -> Vec<Step> {
    let commands = if cfg.debug.commands.is_empty() {
        default_debug_commands(cfg.paths.project_name())
    } else {
        cfg.debug.commands.clone()
    };
    commands
        .into_iter()
        .map(|cmd| Step::command(cmd.clone(), cmd, cfg.timeouts.command()))
        .collect()
}
