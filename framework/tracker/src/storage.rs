use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uitrack_core::prelude::{IoResultExt, TrackError, TrackResult};

/// Read and parse a JSON file, or `None` if it doesn't exist.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> TrackResult<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read(path).io_err("read", path)?;
    serde_json::from_slice(&content)
        .map(Some)
        .map_err(|e| TrackError::json(path, e))
}

/// Write a value as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> TrackResult<()> {
    let mut content = serde_json::to_vec_pretty(value).map_err(|e| TrackError::json(path, e))?;
    content.push(b'\n');
    write_atomic(path, &content)
}

/// Read a YAML document as an untyped value, or `None` if the file doesn't exist.
pub(crate) fn read_yaml_value(path: &Path) -> TrackResult<Option<serde_yaml::Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path).io_err("read", path)?;
    serde_yaml::from_str(&content)
        .map(Some)
        .map_err(|e| TrackError::yaml(path, e))
}

pub(crate) fn write_yaml<T: Serialize>(path: &Path, value: &T) -> TrackResult<()> {
    let content = serde_yaml::to_string(value).map_err(|e| TrackError::yaml(path, e))?;
    write_atomic(path, content.as_bytes())
}

/// Write through a temporary file in the same directory and rename it into place, so readers
/// never observe a half written record.
pub(crate) fn write_atomic(path: &Path, content: &[u8]) -> TrackResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| TrackError::Validation(format!("{} has no parent", path.display())))?;
    std::fs::create_dir_all(dir).io_err("create directory", dir)?;

    let mut file = tempfile::NamedTempFile::new_in(dir).io_err("create temporary file in", dir)?;
    file.write_all(content).io_err("write", path)?;
    file.as_file().sync_all().io_err("sync", path)?;
    file.persist(path)
        .map_err(|e| e.error)
        .io_err("replace", path)?;

    log::trace!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
