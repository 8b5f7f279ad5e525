use crate::config::Settings;
use crate::sandbox::{authorize_path, AuthorizedPath};
use std::path::Path;

pub mod audio;
pub mod fetch;
pub mod git;
pub mod image_ops;
pub mod markdown;
pub mod read_file;
pub mod sql;

pub use audio::{transcribe_file, HttpTranscriber, Transcriber};
pub use fetch::fetch_to_file;
pub use git::commit_and_push;
pub use image_ops::{resize_in_place, resize_to};
pub use markdown::convert_to_html;
pub use read_file::read_file;
pub use sql::run_select;

#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("access outside {root} is not allowed: {path}")]
    SandboxViolation { root: String, path: String },
    #[error("file not found: {path}")]
    NotFound { path: String },
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("sql error on {path}: {source}")]
    Sql {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("only SELECT queries are allowed")]
    SqlRestricted,
    #[error("audio transcription failed: {reason}")]
    Audio { reason: String },
    #[error("image operation failed for {path}: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
    #[error("git {operation} failed: {detail}")]
    Git { operation: String, detail: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl AdapterError {
    /// HTTP status the server boundary maps this error to. Sandbox and
    /// restriction rejections are caller errors; missing files are 404;
    /// everything else is an internal failure.
    pub fn http_status(&self) -> u16 {
        match self {
            AdapterError::SandboxViolation { .. } | AdapterError::SqlRestricted => 400,
            AdapterError::NotFound { .. } => 404,
            AdapterError::Fetch { .. }
            | AdapterError::Sql { .. }
            | AdapterError::Audio { .. }
            | AdapterError::Image { .. }
            | AdapterError::Git { .. }
            | AdapterError::Io { .. } => 500,
        }
    }
}

/// Revalidates `path` against the data root on every use; adapters never
/// cache an authorization across requests.
pub(crate) fn guard_path(settings: &Settings, path: &Path) -> Result<AuthorizedPath, AdapterError> {
    authorize_path(path, &settings.data_root).ok_or_else(|| AdapterError::SandboxViolation {
        root: settings.root_prefix(),
        path: path.display().to_string(),
    })
}

pub(crate) fn require_existing(authorized: &AuthorizedPath) -> Result<(), AdapterError> {
    if authorized.as_path().exists() {
        Ok(())
    } else {
        Err(AdapterError::NotFound {
            path: authorized.as_path().display().to_string(),
        })
    }
}

pub(crate) fn io_error(path: &Path, source: std::io::Error) -> AdapterError {
    AdapterError::Io {
        path: path.display().to_string(),
        source,
    }
}
