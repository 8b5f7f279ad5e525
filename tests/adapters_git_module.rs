use std::fs;
use std::path::Path;
use std::process::Command;
use taskgate::adapters::{self, AdapterError};
use taskgate::config::Settings;
use tempfile::TempDir;

fn git(cwd: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .env("GIT_AUTHOR_NAME", "taskgate-test")
        .env("GIT_AUTHOR_EMAIL", "taskgate@example.invalid")
        .env("GIT_COMMITTER_NAME", "taskgate-test")
        .env("GIT_COMMITTER_EMAIL", "taskgate@example.invalid")
        .output()
        .expect("run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

fn seeded_remote(tmp: &TempDir) -> String {
    let seed = tmp.path().join("seed");
    fs::create_dir_all(&seed).expect("create seed dir");
    git(&seed, &["init"]);
    fs::write(seed.join("README.md"), "seed\n").expect("write readme");
    git(&seed, &["add", "-A"]);
    git(&seed, &["commit", "-m", "initial"]);

    let remote = tmp.path().join("remote.git");
    git(
        tmp.path(),
        &["clone", "--bare", "seed", &remote.display().to_string()],
    );
    remote.display().to_string()
}

fn identity_env() {
    std::env::set_var("GIT_AUTHOR_NAME", "taskgate-test");
    std::env::set_var("GIT_AUTHOR_EMAIL", "taskgate@example.invalid");
    std::env::set_var("GIT_COMMITTER_NAME", "taskgate-test");
    std::env::set_var("GIT_COMMITTER_EMAIL", "taskgate@example.invalid");
}

#[test]
fn commit_and_push_clones_then_pushes_staged_changes() {
    identity_env();
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("data");
    fs::create_dir_all(&root).expect("create root");
    let settings = Settings {
        data_root: root.clone(),
        ..Settings::default()
    };
    let remote = seeded_remote(&tmp);

    // First call clones the remote into the fixed working copy; with no
    // local changes the commit step fails and the sequence aborts there.
    let err =
        adapters::commit_and_push(&settings, &remote, "empty update").expect_err("nothing staged");
    match err {
        AdapterError::Git { operation, .. } => assert_eq!(operation, "commit"),
        other => panic!("unexpected error: {other:?}"),
    }
    let working_copy = settings.git_working_copy_path();
    assert!(working_copy.join("README.md").exists());

    // With a real change in the working copy the full sequence lands on
    // the remote.
    fs::write(working_copy.join("notes.txt"), "hello from taskgate\n").expect("write change");
    adapters::commit_and_push(&settings, &remote, "add notes").expect("commit and push");

    let log = Command::new("git")
        .args(["log", "--format=%s", "-n", "1"])
        .current_dir(&remote)
        .output()
        .expect("read remote log");
    assert!(log.status.success());
    assert_eq!(String::from_utf8_lossy(&log.stdout).trim(), "add notes");
}
