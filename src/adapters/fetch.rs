use super::{guard_path, io_error, AdapterError};
use crate::config::Settings;
use crate::shared::fs_atomic::atomic_write_file;
use std::path::Path;

/// Fetches remote text content and writes it inside the data root. The
/// write is atomic so a concurrent reader never sees a partial download.
pub fn fetch_to_file(
    settings: &Settings,
    agent: &ureq::Agent,
    url: &str,
    output_path: &str,
) -> Result<(), AdapterError> {
    let authorized = guard_path(settings, Path::new(output_path))?;

    let response = agent.get(url).call().map_err(|err| AdapterError::Fetch {
        url: url.to_string(),
        reason: err.to_string(),
    })?;
    let body = response.into_string().map_err(|err| AdapterError::Fetch {
        url: url.to_string(),
        reason: err.to_string(),
    })?;

    atomic_write_file(authorized.as_path(), body.as_bytes())
        .map_err(|source| io_error(authorized.as_path(), source))
}
