use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use taskgate::config::Settings;
use taskgate::dispatch::{Dispatcher, TaskResponse};
use taskgate::history::{TaskHistory, TaskStatus};
use taskgate::oracle::{CommandOracle, OracleError};
use tempfile::TempDir;

struct FixedOracle {
    command: String,
}

impl CommandOracle for FixedOracle {
    fn propose_command(&self, _task: &str) -> Result<String, OracleError> {
        Ok(self.command.clone())
    }
}

struct UnreachableOracle;

impl CommandOracle for UnreachableOracle {
    fn propose_command(&self, task: &str) -> Result<String, OracleError> {
        Err(OracleError::Request(format!(
            "oracle should not be consulted for `{task}`"
        )))
    }
}

fn settings_for(root: &Path) -> Settings {
    Settings {
        data_root: root.to_path_buf(),
        ..Settings::default()
    }
}

fn open_history(settings: &Settings) -> TaskHistory {
    TaskHistory::open(&settings.history_db_path()).expect("open history")
}

#[test]
fn successful_dispatch_records_exactly_one_success_row() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("data");
    fs::create_dir_all(&root).expect("create root");
    fs::write(root.join("hello.txt"), "hello world\n").expect("write file");

    let settings = settings_for(&root);
    let history = open_history(&settings);
    let oracle = FixedOracle {
        command: format!("cat {}/hello.txt", root.display()),
    };
    let dispatcher = Dispatcher::new(&settings, &history, &oracle);

    let response = dispatcher.dispatch("show the greeting");
    assert_eq!(
        response,
        TaskResponse::Success {
            output: "hello world".to_string()
        }
    );

    let records = history.recent(10).expect("query");
    // The open() call above also creates the db; only the dispatch row exists.
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].description, "show the greeting");
    assert_eq!(records[0].status, TaskStatus::Success);
    assert_eq!(records[0].output, "hello world");
}

#[test]
fn fenced_oracle_output_is_normalized_before_authorization() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("data");
    fs::create_dir_all(&root).expect("create root");
    fs::write(root.join("hello.txt"), "hi").expect("write file");

    let settings = settings_for(&root);
    let history = open_history(&settings);
    let oracle = FixedOracle {
        command: format!("```bash\ncat {}/hello.txt\n```", root.display()),
    };
    let dispatcher = Dispatcher::new(&settings, &history, &oracle);

    let response = dispatcher.dispatch("show the greeting");
    assert_eq!(
        response,
        TaskResponse::Success {
            output: "hi".to_string()
        }
    );
}

#[test]
fn destructive_command_is_rejected_without_a_record_or_side_effect() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("data");
    fs::create_dir_all(&root).expect("create root");
    let target = root.join("hello.txt");
    fs::write(&target, "precious").expect("write file");

    let settings = settings_for(&root);
    let history = open_history(&settings);
    let oracle = FixedOracle {
        command: format!("rm {}/hello.txt", root.display()),
    };
    let dispatcher = Dispatcher::new(&settings, &history, &oracle);

    let response = dispatcher.dispatch("tidy up");
    match response {
        TaskResponse::Error { message } => assert!(message.contains("not allowed")),
        other => panic!("unexpected response: {other:?}"),
    }
    assert!(target.exists());
    assert!(history.recent(10).expect("query").is_empty());
}

#[test]
fn out_of_scope_command_is_rejected_without_a_record() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("data");
    fs::create_dir_all(&root).expect("create root");

    let settings = settings_for(&root);
    let history = open_history(&settings);
    let oracle = FixedOracle {
        command: "echo hi".to_string(),
    };
    let dispatcher = Dispatcher::new(&settings, &history, &oracle);

    let response = dispatcher.dispatch("say hi");
    assert!(matches!(response, TaskResponse::Error { .. }));
    assert!(history.recent(10).expect("query").is_empty());
}

#[test]
fn execution_failure_is_recorded_with_error_status() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("data");
    fs::create_dir_all(&root).expect("create root");

    let settings = settings_for(&root);
    let history = open_history(&settings);
    let oracle = FixedOracle {
        command: format!("cat {}/missing.txt", root.display()),
    };
    let dispatcher = Dispatcher::new(&settings, &history, &oracle);

    let response = dispatcher.dispatch("read a missing file");
    assert!(matches!(response, TaskResponse::Error { .. }));

    let records = history.recent(10).expect("query");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, TaskStatus::Error);
    assert!(records[0].output.contains("exited with status"));
}

#[test]
fn oracle_failure_surfaces_without_a_record() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("data");
    fs::create_dir_all(&root).expect("create root");

    let settings = settings_for(&root);
    let history = open_history(&settings);
    let oracle = UnreachableOracle;
    let dispatcher = Dispatcher::new(&settings, &history, &oracle);

    let response = dispatcher.dispatch("anything");
    assert!(matches!(response, TaskResponse::Error { .. }));
    assert!(history.recent(10).expect("query").is_empty());
}

#[test]
fn named_task_skips_the_oracle() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("data");
    fs::create_dir_all(&root).expect("create root");
    fs::write(root.join("greet.txt"), "hi there").expect("write file");

    let mut settings = settings_for(&root);
    settings.named_tasks.insert(
        "greet".to_string(),
        format!("cat {}/greet.txt", root.display()),
    );
    let history = open_history(&settings);
    let dispatcher = Dispatcher::new(&settings, &history, &UnreachableOracle);

    let response = dispatcher.dispatch("greet");
    assert_eq!(
        response,
        TaskResponse::Success {
            output: "hi there".to_string()
        }
    );
}

#[test]
fn response_serialization_is_status_tagged() {
    let success = serde_json::to_value(TaskResponse::Success {
        output: "ok".to_string(),
    })
    .expect("serialize");
    assert_eq!(
        success,
        serde_json::json!({"status": "success", "output": "ok"})
    );

    let error = serde_json::to_value(TaskResponse::Error {
        message: "boom".to_string(),
    })
    .expect("serialize");
    assert_eq!(
        error,
        serde_json::json!({"status": "error", "message": "boom"})
    );
}

#[test]
fn concurrent_dispatches_record_one_row_each() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("data");
    fs::create_dir_all(&root).expect("create root");
    fs::write(root.join("hello.txt"), "hello").expect("write file");

    let settings = settings_for(&root);
    let history = open_history(&settings);
    let shared = Arc::new((settings, history));

    let mut handles = Vec::new();
    for worker in 0..8 {
        let shared = Arc::clone(&shared);
        let command = format!("cat {}/hello.txt", root.display());
        handles.push(thread::spawn(move || {
            let oracle = FixedOracle { command };
            let dispatcher = Dispatcher::new(&shared.0, &shared.1, &oracle);
            let response = dispatcher.dispatch(&format!("task from worker {worker}"));
            assert!(matches!(response, TaskResponse::Success { .. }));
        }));
    }
    for handle in handles {
        handle.join().expect("worker thread");
    }

    let records = shared.1.recent(100).expect("query");
    assert_eq!(records.len(), 8);
    let mut ids: Vec<i64> = records.iter().map(|record| record.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 8);
}
