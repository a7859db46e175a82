//! Archive builder against the system `tar`.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::fs;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use vpsctl::application::services::archive::{build_archive, tar_args};
use vpsctl::domain::ArchiveError;
use vpsctl::domain::workflow::ArchiveSpec;
use vpsctl::infra::command_runner::TokioCommandRunner;

fn spec(source: &Path) -> ArchiveSpec {
    ArchiveSpec {
        source: source.to_path_buf(),
        file_name: "app.tar.gz".to_string(),
        exclude: ["node_modules", "dist", ".git", ".firebase"]
            .map(String::from)
            .to_vec(),
    }
}

fn write(root: &Path, rel: &str, body: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn entries(archive: &Path) -> Vec<String> {
    let file = fs::File::open(archive).unwrap();
    let mut tar = tar::Archive::new(GzDecoder::new(file));
    tar.entries()
        .unwrap()
        .map(|e| {
            let path: PathBuf = e.unwrap().path().unwrap().into_owned();
            path.display().to_string().trim_start_matches("./").to_string()
        })
        .filter(|p| !p.is_empty() && p != ".")
        .collect()
}

#[test]
fn tar_args_place_excludes_before_source() {
    let args = tar_args(&spec(Path::new("/src/app")), Path::new("/tmp/out/app.tar.gz"));
    assert_eq!(
        args,
        [
            "-czf",
            "/tmp/out/app.tar.gz",
            "--exclude=node_modules",
            "--exclude=dist",
            "--exclude=.git",
            "--exclude=.firebase",
            "-C",
            "/src/app",
            ".",
        ]
    );
}

#[tokio::test]
async fn archive_skips_excluded_directories() {
    let project = tempfile::TempDir::new().unwrap();
    let out = tempfile::TempDir::new().unwrap();
    write(project.path(), "docker-compose.yml", "services: {}\n");
    write(project.path(), "web/src/main.ts", "console.log(1)\n");
    write(project.path(), "web/node_modules/left-pad/index.js", "x");
    write(project.path(), "web/dist/bundle.js", "x");
    write(project.path(), ".git/HEAD", "ref: refs/heads/main\n");
    write(project.path(), ".firebase/cache", "x");

    let archive = build_archive(&TokioCommandRunner, &spec(project.path()), out.path())
        .await
        .expect("archive");

    assert_eq!(archive, out.path().join("app.tar.gz"));
    let names = entries(&archive);
    assert!(names.iter().any(|n| n == "docker-compose.yml"), "{names:?}");
    assert!(names.iter().any(|n| n == "web/src/main.ts"), "{names:?}");
    for excluded in ["node_modules", "dist", ".git", ".firebase"] {
        assert!(
            !names.iter().any(|n| n.split('/').any(|part| part == excluded)),
            "{excluded} leaked into {names:?}"
        );
    }
}

#[tokio::test]
async fn missing_source_is_archive_failure() {
    let out = tempfile::TempDir::new().unwrap();
    let missing = out.path().join("does-not-exist");

    let err = build_archive(&TokioCommandRunner, &spec(&missing), out.path())
        .await
        .unwrap_err();

    match err {
        ArchiveError::Failed { code, stderr } => {
            assert_ne!(code, 0);
            assert!(!stderr.is_empty());
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
