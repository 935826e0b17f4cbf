//! Save document loading

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// Errors raised while loading a save document
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read save {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Save {} is not valid JSON: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Save {} does not contain a JSON object", path.display())]
    NotAnObject { path: PathBuf },
}

/// Read and parse the save document at `path`
pub fn load_save_document(path: &Path) -> Result<Map<String, Value>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_save_document(path, &text)
}

fn parse_save_document(path: &Path, text: &str) -> Result<Map<String, Value>, LoadError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    match serde_json::from_str(text) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(LoadError::NotAnObject {
            path: path.to_path_buf(),
        }),
        Err(source) => Err(LoadError::Parse {
            path: path.to_path_buf(),
            source,
        }),
    }
}
