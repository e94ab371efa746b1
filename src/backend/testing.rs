//! Scripted backend for engine tests

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::backend::{BackendError, SymbolBackend, SymbolResultSet};
use crate::symbol::{FileLocation, Position};

type LocationKey = (PathBuf, Position);

fn key(location: &FileLocation) -> LocationKey {
    (location.file_path.clone(), location.range.start)
}

/// Backend answering from canned responses and recording every call
#[derive(Default)]
pub struct MockBackend {
    symbols: Mutex<HashMap<String, Result<Value, String>>>,
    open_failures: Mutex<HashSet<PathBuf>>,
    references: Mutex<HashMap<LocationKey, Result<Vec<FileLocation>, String>>>,
    definitions: Mutex<HashMap<LocationKey, Result<(String, FileLocation), String>>>,
    calls: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbols(self, query: &str, payload: Value) -> Self {
        self.symbols
            .lock()
            .unwrap()
            .insert(query.to_string(), Ok(payload));
        self
    }

    pub fn with_symbol_error(self, query: &str, message: &str) -> Self {
        self.symbols
            .lock()
            .unwrap()
            .insert(query.to_string(), Err(message.to_string()));
        self
    }

    pub fn with_open_failure(self, path: impl Into<PathBuf>) -> Self {
        self.open_failures.lock().unwrap().insert(path.into());
        self
    }

    pub fn with_references(self, at: &FileLocation, references: Vec<FileLocation>) -> Self {
        self.references
            .lock()
            .unwrap()
            .insert(key(at), Ok(references));
        self
    }

    pub fn with_references_error(self, at: &FileLocation, message: &str) -> Self {
        self.references
            .lock()
            .unwrap()
            .insert(key(at), Err(message.to_string()));
        self
    }

    pub fn with_definition(self, at: &FileLocation, text: &str, span: FileLocation) -> Self {
        self.definitions
            .lock()
            .unwrap()
            .insert(key(at), Ok((text.to_string(), span)));
        self
    }

    pub fn with_definition_error(self, at: &FileLocation, message: &str) -> Self {
        self.definitions
            .lock()
            .unwrap()
            .insert(key(at), Err(message.to_string()));
        self
    }

    /// Calls in order, e.g. `symbol:Calculator` or `open:/src/a.cpp`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl SymbolBackend for MockBackend {
    async fn symbol(&self, query: &str) -> Result<SymbolResultSet, BackendError> {
        self.record(format!("symbol:{}", query));
        match self.symbols.lock().unwrap().get(query) {
            Some(Ok(payload)) => Ok(SymbolResultSet::new(payload.clone())),
            Some(Err(message)) => Err(BackendError::Unavailable(message.clone())),
            None => Ok(SymbolResultSet::new(Value::Null)),
        }
    }

    async fn open_file(&self, path: &Path) -> Result<(), BackendError> {
        self.record(format!("open:{}", path.display()));
        if self.open_failures.lock().unwrap().contains(path) {
            return Err(BackendError::FileRead {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
            });
        }
        Ok(())
    }

    async fn references(
        &self,
        location: &FileLocation,
        include_declaration: bool,
    ) -> Result<Vec<FileLocation>, BackendError> {
        self.record(format!(
            "references:{}:{}:{}",
            location.file_path.display(),
            location.range.start.line,
            include_declaration
        ));
        match self.references.lock().unwrap().get(&key(location)) {
            Some(Ok(references)) => Ok(references.clone()),
            Some(Err(message)) => Err(BackendError::Unavailable(message.clone())),
            None => Ok(Vec::new()),
        }
    }

    async fn full_definition(
        &self,
        location: &FileLocation,
    ) -> Result<(String, FileLocation), BackendError> {
        self.record(format!("definition:{}", location.file_path.display()));
        match self.definitions.lock().unwrap().get(&key(location)) {
            Some(Ok(definition)) => Ok(definition.clone()),
            Some(Err(message)) => Err(BackendError::Unavailable(message.clone())),
            None => Err(BackendError::Unavailable(format!(
                "no definition scripted for {}",
                location.to_compact_range()
            ))),
        }
    }
}
