//! Backing file persistence.
//!
//! # Responsibilities
//! - Parse file (or override) text into a `ConfigMap`
//! - Render a `ConfigMap` as indented JSON
//! - Read and write the backing file, creating parent directories on write
//!
//! # Design Decisions
//! - Empty content is an empty map, not a parse error
//! - Anything other than a top-level JSON object is malformed
//! - Output is `to_string_pretty` with no trailing newline

use std::path::Path;

use serde_json::Value;
use tokio::fs;

use super::error::StorageError;
use super::ConfigMap;

/// Parse a JSON object of named server configs.
pub fn parse_config_map(text: &str) -> Result<ConfigMap, StorageError> {
    parse_config_bytes(text.as_bytes())
}

/// Like [`parse_config_map`] for raw file content; bytes that are not UTF-8
/// are a parse error, the same as any other malformed JSON.
pub fn parse_config_bytes(bytes: &[u8]) -> Result<ConfigMap, StorageError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(ConfigMap::new());
    }

    match serde_json::from_slice::<Value>(bytes)? {
        Value::Object(entries) => Ok(entries.into_iter().collect()),
        other => Err(StorageError::NotAnObject {
            found: json_kind(&other),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Render the map the way it is stored on disk.
pub fn render_config_map(map: &ConfigMap) -> Result<String, StorageError> {
    Ok(serde_json::to_string_pretty(map)?)
}

/// Read and parse the backing file.
pub async fn read_config_file(path: &Path) -> Result<ConfigMap, StorageError> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| StorageError::from_io(path, e))?;
    parse_config_bytes(&bytes)
}

/// Overwrite the backing file with `map`.
pub async fn write_config_file(path: &Path, map: &ConfigMap) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::from_io(parent, e))?;
    }

    let contents = render_config_map(map)?;
    fs::write(path, contents)
        .await
        .map_err(|e| StorageError::from_io(path, e))?;

    tracing::debug!(path = %path.display(), entries = map.len(), "Wrote config file");
    Ok(())
}
