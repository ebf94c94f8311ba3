// Reading upstream provider payloads (generation results, debug dumps)
use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("Provider returned an error: {0}")]
    Provider(String),
    #[error("Unexpected payload shape: {0}")]
    Shape(String),
    #[error("No player matching '{0}' in bulk result")]
    NoSuchPlayer(String),
    #[error("Invalid payload JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read a payload document from a file, or from stdin when the path is `-`
pub fn read_document(path: &Path) -> Result<Value> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read payload from stdin")?;
        buf
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read payload {}", path.display()))?
    };

    debug!("Read {} bytes of payload", content.len());
    let value = serde_json::from_str(&content).map_err(PayloadError::from)?;
    Ok(value)
}

/// Surface `{"error": "..."}` objects from a provider verbatim
pub fn check_provider_error(value: &Value) -> Result<(), PayloadError> {
    match value.get("error") {
        Some(Value::Null) | None => Ok(()),
        Some(Value::String(msg)) => Err(PayloadError::Provider(msg.clone())),
        Some(other) => Err(PayloadError::Provider(other.to_string())),
    }
}
