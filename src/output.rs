// src/output.rs

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Serialize `value` as JSON at `path`, creating parent directories.
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    let display = path.display().to_string();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| OutputError::Io {
            path: display.clone(),
            source,
        })?;
    }
    let file = File::create(path).map_err(|source| OutputError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::to_writer(BufWriter::new(file), value).map_err(|source| OutputError::Json {
        path: display,
        source,
    })
}

/// Reverse-lookup map `id -> key` from a registry key table.
pub fn id_map(keys: &[String]) -> BTreeMap<u32, &str> {
    keys.iter()
        .enumerate()
        .map(|(id, key)| (id as u32, key.as_str()))
        .collect()
}
