use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn run_cli(config_file: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ferrite-train"))
        .arg("--config-file")
        .arg(config_file)
        .env("RUST_LOG", "info")
        .output()
        .unwrap()
}

fn only_run_dir(root: &Path) -> PathBuf {
    let dirs: Vec<PathBuf> = std::fs::read_dir(root).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(dirs.len(), 1, "expected one run directory, found {:?}", dirs);
    dirs.into_iter().next().unwrap()
}

#[test]
fn dataset_failure_reaches_log_file_once() {
    let tmp = TempDir::new().unwrap();
    let runs = tmp.path().join("runs");
    let config = tmp.path().join("mnist.yml");
    std::fs::write(
        &config,
        format!(
            "dataset:
  name: MNIST
  root: {}
model:
  name: MLP
training:
  batch_size:
    train: 8
    val: 8
  optimizer:
    name: SGD
    lr: 0.1
  scheduler:
    name: Constant
  num_epochs: 1
logging:
  root: {}
",
            tmp.path().join("no-data").display(),
            runs.display()
        ),
    )
    .unwrap();

    let out = run_cli(&config);
    assert!(!out.status.success());

    let log = std::fs::read_to_string(only_run_dir(&runs).join("log.txt")).unwrap();
    assert!(log.contains("cannot read"), "log.txt was: {}", log);

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert_eq!(stderr.matches("cannot read").count(), 1, "stderr was: {}", stderr);
}

#[test]
fn unreadable_config_fails_before_run_dir() {
    let tmp = TempDir::new().unwrap();
    let out = run_cli(&tmp.path().join("missing.yml"));
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("missing.yml"), "stderr was: {}", stderr);
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}
