// Export snapshot handed to the export consumer
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// `{name, tendencies}` in display order, committed values only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub name: String,
    pub tendencies: Map<String, Value>,
}

impl ExportSnapshot {
    pub fn new<'a>(name: &str, values: impl IntoIterator<Item = (&'a str, i64)>) -> Self {
        let tendencies = values
            .into_iter()
            .map(|(k, v)| (k.to_string(), Value::from(v)))
            .collect();
        Self {
            name: name.to_string(),
            tendencies,
        }
    }

    pub fn get(&self, tendency: &str) -> Option<i64> {
        self.tendencies.get(tendency).and_then(Value::as_i64)
    }

    pub fn len(&self) -> usize {
        self.tendencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tendencies.is_empty()
    }
}

/// `Jalen Brunson` -> `Jalen_Brunson_tendencies.json`
pub fn default_file_name(player_name: &str) -> String {
    let trimmed = player_name.trim();
    let base = if trimmed.is_empty() { "player" } else { trimmed };
    format!("{}_tendencies.json", base.replace(' ', "_"))
}

/// Explicit output path wins, otherwise the default name inside `export_dir` (or cwd)
pub fn resolve_output_path(
    output: Option<PathBuf>,
    export_dir: Option<&Path>,
    player_name: &str,
) -> PathBuf {
    output.unwrap_or_else(|| {
        export_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(default_file_name(player_name))
    })
}

pub fn write_snapshot(snapshot: &ExportSnapshot, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;

    info!(
        "Exported {} tendencies for {} to {}",
        snapshot.len(),
        snapshot.name,
        path.display()
    );
    Ok(())
}
