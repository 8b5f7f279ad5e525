use crate::config::Settings;
use crate::executor::{execute, ExecError};
use crate::history::{HistoryError, TaskHistory, TaskStatus};
use crate::oracle::{strip_fence_wrapper, CommandOracle, OracleError};
use crate::sandbox::{authorize_command, SandboxError};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error(transparent)]
    Sandbox(#[from] SandboxError),
    #[error(transparent)]
    Execution(#[from] ExecError),
    #[error("failed to record task history: {0}")]
    History(#[from] HistoryError),
}

/// Terminal response shape for one dispatch. Callers branch on the `status`
/// field only, never on the transport status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TaskResponse {
    Success { output: String },
    Error { message: String },
}

pub struct Dispatcher<'a> {
    settings: &'a Settings,
    history: &'a TaskHistory,
    oracle: &'a dyn CommandOracle,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        settings: &'a Settings,
        history: &'a TaskHistory,
        oracle: &'a dyn CommandOracle,
    ) -> Self {
        Self {
            settings,
            history,
            oracle,
        }
    }

    /// One end-to-end dispatch: resolve the command (named-task catalog
    /// first, oracle otherwise), normalize, authorize, execute, record.
    ///
    /// Authorization rejections return before any side effect and are not
    /// recorded. Execution failures are recorded with status `error` and
    /// the error message as output; the subprocess's side effects are not
    /// rolled back.
    pub fn dispatch(&self, task: &str) -> TaskResponse {
        match self.run_task(task) {
            Ok(output) => TaskResponse::Success { output },
            Err(err) => TaskResponse::Error {
                message: err.to_string(),
            },
        }
    }

    fn run_task(&self, task: &str) -> Result<String, DispatchError> {
        let command = match self.settings.named_tasks.get(task) {
            Some(command) => command.clone(),
            None => self.oracle.propose_command(task)?,
        };
        let command = strip_fence_wrapper(&command);
        let intent = authorize_command(&command, &self.settings.root_prefix())?;

        match execute(&intent, self.settings.command_timeout()) {
            Ok(output) => {
                self.history
                    .record(task, TaskStatus::Success, &output.stdout)?;
                Ok(output.stdout)
            }
            Err(err) => {
                let message = err.to_string();
                self.history.record(task, TaskStatus::Error, &message)?;
                Err(DispatchError::Execution(err))
            }
        }
    }
}
