use crate::error::{EngineError, Result};
use crate::types::config::{ConfigFile, EngineConfig};
use std::path::{Path, PathBuf};
use toml::map::Map;
use toml::Value;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "fundrank.toml";
pub const DEFAULT_LOCAL_FILE: &str = ".fundrank/local.toml";
pub const DEFAULT_GLOBAL_CONFIG_FILE: &str = ".config/fundrank/config.toml";

/// Resolves configuration for `root`.
///
/// The global, project and local files are merged in that order, each one
/// optional; with none present the defaults apply. An explicit path takes the
/// place of the project file and must exist.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<EngineConfig> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(EngineError::PathNotFound(path.display().to_string()));
        }
    }

    let global = std::env::var_os("HOME")
        .map(PathBuf::from)
        .map(|home| home.join(DEFAULT_GLOBAL_CONFIG_FILE));
    load_config_layers(root, global.as_deref(), explicit)?.resolve()
}

fn load_config_layers(
    root: &Path,
    global_path: Option<&Path>,
    project_path: Option<&Path>,
) -> Result<ConfigFile> {
    let mut merged = Value::Table(Map::new());
    if let Some(path) = global_path {
        merge_file_if_exists(&mut merged, path)?;
    }
    let project = project_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(DEFAULT_CONFIG_FILE));
    merge_file_if_exists(&mut merged, &project)?;
    merge_file_if_exists(&mut merged, &root.join(DEFAULT_LOCAL_FILE))?;

    merged
        .try_into()
        .map_err(|e: toml::de::Error| EngineError::ConfigParse(e.to_string()))
}

fn merge_file_if_exists(merged: &mut Value, path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    debug!(path = %path.display(), "merging config layer");
    let value = read_toml_value(path)?;
    merge_toml(merged, value);
    Ok(())
}

fn read_toml_value(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| EngineError::ConfigParse(format!("{}: {}", path.display(), e)))
}

fn merge_toml(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Table(base_table), Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => {
            *slot = value;
        }
    }
}
