//! Serialization of the assembled document to JSON or YAML.

use anyhow::{Context, Result};
use log::debug;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Serializes a document to pretty-printed JSON, the primary output format.
pub fn serialize_json(doc: &Value) -> Result<String> {
    debug!("Serializing document to JSON");
    let mut content = serde_json::to_string_pretty(doc)
        .context("Failed to serialize document to JSON")?;
    content.push('\n');
    Ok(content)
}

/// Serializes a document to YAML.
pub fn serialize_yaml(doc: &Value) -> Result<String> {
    debug!("Serializing document to YAML");
    serde_yaml::to_string(doc).context("Failed to serialize document to YAML")
}

/// Writes content to a file, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the file cannot be
/// written; these are fatal for the run.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn json_output_is_stable_and_newline_terminated() {
        let doc = json!({"openapi": "3.0.0", "paths": {}});
        let first = serialize_json(&doc).unwrap();
        let second = serialize_json(&doc).unwrap();
        assert_eq!(first, second);
        assert!(first.ends_with('\n'));
        assert!(first.contains("\"openapi\": \"3.0.0\""));
    }

    #[test]
    fn yaml_output_contains_top_level_keys() {
        let doc = json!({"openapi": "3.0.0", "paths": {}});
        let yaml = serialize_yaml(&doc).unwrap();
        assert!(yaml.contains("openapi:"));
        assert!(yaml.contains("paths:"));
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("nested/out/openapi.json");
        write_to_file("{}", &target).unwrap();
        assert_eq!(std::fs::read_to_string(target).unwrap(), "{}");
    }
}
