//! Bulk export and import of the whole durable store.

use crate::store::Store;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    InvalidDocument(#[from] serde_json::Error),
    #[error("expected a JSON object at the top level")]
    NotAnObject,
}

/// Every key with its parsed value. Entries that are not valid JSON are
/// exported as plain strings.
pub fn export_document(store: &Store) -> Value {
    let map: Map<String, Value> = store
        .entries()
        .into_iter()
        .map(|(key, raw)| {
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            (key, value)
        })
        .collect();
    Value::Object(map)
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("widgetopia-settings-{}.json", date.format("%Y-%m-%d"))
}

/// Write the export document into `dir` and return the file path.
pub fn export_to_dir(store: &Store, dir: &Path, date: NaiveDate) -> Result<PathBuf, TransferError> {
    let path = dir.join(export_file_name(date));
    let text = serde_json::to_string_pretty(&export_document(store))?;
    fs::write(&path, text).map_err(|source| TransferError::Write {
        path: path.clone(),
        source,
    })?;
    tracing::info!(path = %path.display(), "exported settings");
    Ok(path)
}

pub fn parse_document(text: &str) -> Result<Map<String, Value>, TransferError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        _ => Err(TransferError::NotAnObject),
    }
}

/// Replace the whole store with the document. The document is validated
/// before anything is cleared. Returns the number of keys written.
pub fn import_document(store: &Store, text: &str) -> Result<usize, TransferError> {
    let document = match parse_document(text) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::error!(error = %err, "rejected settings import");
            return Err(err);
        }
    };
    let encoded: Vec<(String, String)> = document
        .into_iter()
        .map(|(key, value)| serde_json::to_string(&value).map(|raw| (key, raw)))
        .collect::<Result<_, serde_json::Error>>()?;
    let count = encoded.len();
    store.batch(|tx| {
        tx.clear();
        for (key, raw) in encoded {
            tx.set_raw(&key, raw);
        }
    });
    tracing::info!(keys = count, "imported settings");
    Ok(count)
}

pub fn import_from_file(store: &Store, path: &Path) -> Result<usize, TransferError> {
    let text = fs::read_to_string(path).map_err(|source| {
        tracing::error!(path = %path.display(), error = %source, "could not read settings file");
        TransferError::Read {
            path: path.to_path_buf(),
            source,
        }
    })?;
    import_document(store, &text)
}
