//! Archive builder: bundles the local project with an external `tar`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::application::ports::CommandRunner;
use crate::domain::ArchiveError;
use crate::domain::workflow::ArchiveSpec;

/// Upper bound for the archiver.
pub const ARCHIVE_TIMEOUT: Duration = Duration::from_secs(300);

/// Arguments for `tar`: gzip `spec.source` into `out`, skipping `spec.exclude`.
#[must_use]
pub fn tar_args(spec: &ArchiveSpec, out: &Path) -> Vec<String> {
    let mut args = vec!["-czf".to_string(), out.display().to_string()];
    args.extend(spec.exclude.iter().map(|glob| format!("--exclude={glob}")));
    args.push("-C".to_string());
    args.push(spec.source.display().to_string());
    args.push(".".to_string());
    args
}

/// Build the archive in `out_dir` and return its path.
///
/// # Errors
///
/// - `ArchiveError::Spawn` if `tar` cannot be run or times out.
/// - `ArchiveError::Failed` if `tar` exits non-zero; nothing may be uploaded.
pub async fn build_archive(
    runner: &impl CommandRunner,
    spec: &ArchiveSpec,
    out_dir: &Path,
) -> Result<PathBuf, ArchiveError> {
    let out = out_dir.join(&spec.file_name);
    let args = tar_args(spec, &out);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    debug!(?args, "running archiver");

    let output = runner
        .run_with_timeout("tar", &args, ARCHIVE_TIMEOUT)
        .await
        .map_err(|e| ArchiveError::Spawn(format!("{e:#}")))?;

    if !output.status.success() {
        return Err(ArchiveError::Failed {
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    info!(archive = %out.display(), "archive built");
    Ok(out)
}
