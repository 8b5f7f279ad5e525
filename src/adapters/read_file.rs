use super::{guard_path, io_error, require_existing, AdapterError};
use crate::config::Settings;
use std::fs;
use std::path::Path;

pub fn read_file(settings: &Settings, path: &str) -> Result<String, AdapterError> {
    let authorized = guard_path(settings, Path::new(path))?;
    require_existing(&authorized)?;
    fs::read_to_string(authorized.as_path()).map_err(|source| io_error(authorized.as_path(), source))
}
