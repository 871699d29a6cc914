mod config;
mod project;

pub use config::Config;
pub use project::{normalize_name, Project, ProjectStore};

use std::path::PathBuf;

use crate::error::StorageError;

/// Returns the base data directory, `~/.config/ytsched` by default.
///
/// Set YTSCHED_HOME to use a different location (tests rely on this).
pub fn data_dir() -> Result<PathBuf, StorageError> {
    let dir = match std::env::var_os("YTSCHED_HOME") {
        Some(home) => PathBuf::from(home),
        None => dirs::home_dir()
            .ok_or(StorageError::NoDataDir)?
            .join(".config")
            .join("ytsched"),
    };

    std::fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
        path: dir.clone(),
        source,
    })?;
    Ok(dir)
}
