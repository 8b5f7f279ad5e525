use super::AdapterError;
use crate::config::Settings;
use std::path::Path;
use std::process::Command;

/// Clones the repository into the fixed working copy under the data root
/// when absent, then stages everything, commits, and pushes. Each step is
/// a `git` CLI invocation; the first failing step aborts the sequence.
pub fn commit_and_push(
    settings: &Settings,
    repo_url: &str,
    commit_message: &str,
) -> Result<(), AdapterError> {
    let working_copy = settings.git_working_copy_path();

    if !working_copy.exists() {
        let target = working_copy.display().to_string();
        run_git(None, &["clone", repo_url, &target])?;
    }

    run_git(Some(&working_copy), &["add", "-A"])?;
    run_git(Some(&working_copy), &["commit", "-m", commit_message])?;
    run_git(Some(&working_copy), &["push"])?;
    Ok(())
}

fn run_git(cwd: Option<&Path>, args: &[&str]) -> Result<String, AdapterError> {
    let operation = args.first().copied().unwrap_or("git").to_string();
    let mut command = Command::new("git");
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let output = command.output().map_err(|err| AdapterError::Git {
        operation: operation.clone(),
        detail: err.to_string(),
    })?;

    if !output.status.success() {
        return Err(AdapterError::Git {
            operation,
            detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
