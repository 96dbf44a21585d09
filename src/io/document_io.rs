use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;

use crate::io::lock::LockError;
use crate::model::document::Document;
use crate::model::task::Task;

/// Error type for reading and writing document files
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("{0} already exists (use --force to overwrite)")]
    AlreadyExists(PathBuf),
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// The canonical wire value of a document.
pub fn serialize(doc: &Document) -> Result<Value, serde_json::Error> {
    serde_json::to_value(doc)
}

/// Pretty-printed JSON text, newline-terminated.
pub fn to_json_string(doc: &Document) -> Result<String, serde_json::Error> {
    let mut text = serde_json::to_string_pretty(doc)?;
    text.push('\n');
    Ok(text)
}

/// Parse document text. Blank text is an empty document; a bare JSON array
/// is read as the task list of an otherwise empty document.
pub fn deserialize(text: &str) -> Result<Document, serde_json::Error> {
    if text.trim().is_empty() {
        return Ok(Document::default());
    }
    let value: Value = serde_json::from_str(text)?;
    if value.is_array() {
        // Early files held only the task array
        let tasks: Vec<Task> = serde_json::from_value(value)?;
        return Ok(Document::from_tasks(tasks));
    }
    serde_json::from_value(value)
}

/// Read a document file. A missing file is an empty document.
pub fn load_document(path: &Path) -> Result<Document, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no document yet, starting empty");
            return Ok(Document::default());
        }
        Err(source) => {
            return Err(StoreError::ReadError {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let doc = deserialize(&text).map_err(|source| StoreError::ParseError {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), tasks = doc.task_count(), "loaded document");
    Ok(doc)
}

/// Write a document file atomically.
pub fn save_document(path: &Path, doc: &Document) -> Result<(), StoreError> {
    let write_err = |source| StoreError::WriteError {
        path: path.to_path_buf(),
        source,
    };
    let text = to_json_string(doc).map_err(|e| write_err(io::Error::other(e)))?;
    atomic_write(path, text.as_bytes()).map_err(write_err)?;
    tracing::debug!(path = %path.display(), tasks = doc.task_count(), "saved document");
    Ok(())
}

/// Write to a temp file in the same directory, then rename over `path`.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
