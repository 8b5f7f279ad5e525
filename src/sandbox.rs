pub mod authorizer;
pub mod path_guard;

pub use authorizer::{authorize_command, CommandIntent, DESTRUCTIVE_VERBS};
pub use path_guard::{authorize_path, is_authorized, AuthorizedPath};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SandboxError {
    #[error("file deletion is not allowed: command contains `{verb}`")]
    DestructiveOperation { verb: String },
    #[error("access outside {root} is not allowed")]
    OutOfScope { root: String },
}
