use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("no entry named {0}")]
    NotFound(String),
    #[error("failed to read color source {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid color source JSON")]
    Json(#[from] serde_json::Error),
}

/// External store that owns master item color definitions.
pub trait ColorSource: Send + Sync {
    fn dimension_layout(&self, id: &str) -> Result<Value, SourceError>;
    fn dimension_properties(&self, id: &str) -> Result<Value, SourceError>;
    fn object_layout(&self, id: &str) -> Result<Value, SourceError>;
}

/// Color source backed by a JSON file of the form
/// `{"dimensions": {id: {"layout": .., "properties": ..}}, "objects": {id: ..}}`.
///
/// The file is read on every call so edits show up as new fingerprints.
#[derive(Clone, Debug)]
pub struct FileColorSource {
    path: PathBuf,
}

impl FileColorSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Value, SourceError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn lookup(&self, section: &str, id: &str, field: Option<&str>) -> Result<Value, SourceError> {
        let document = self.read()?;
        let entry = document.get(section).and_then(|entries| entries.get(id));
        let value = match field {
            Some(field) => entry.and_then(|entry| entry.get(field)),
            None => entry,
        };
        value
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("{section}/{id}")))
    }
}

impl ColorSource for FileColorSource {
    fn dimension_layout(&self, id: &str) -> Result<Value, SourceError> {
        self.lookup("dimensions", id, Some("layout"))
    }

    fn dimension_properties(&self, id: &str) -> Result<Value, SourceError> {
        self.lookup("dimensions", id, Some("properties"))
    }

    fn object_layout(&self, id: &str) -> Result<Value, SourceError> {
        self.lookup("objects", id, None)
    }
}
