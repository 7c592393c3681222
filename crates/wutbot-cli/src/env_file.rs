use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};

pub const ENV_FILE_NAME: &str = ".env";

/// Loads `path` into the process environment without overriding variables that are already set.
///
/// Returns `Ok(false)` when the file does not exist. A file that exists but cannot be parsed is an error.
pub fn load_env_file(path: &Path) -> Result<bool> {
    match dotenv::from_path(path) {
        Ok(()) => Ok(true),
        Err(dotenv::Error::Io(error)) if error.kind() == ErrorKind::NotFound => Ok(false),
        Err(error) => Err(error).with_context(|| format!("failed to load {}", path.display())),
    }
}
