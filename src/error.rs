//! Errors raised by the context engine
//!
//! Only `BackendQuery` and `ResultParse` ever reach the caller. The other
//! variants describe per-symbol or per-file failures that are logged and
//! skipped, or rendered inline, while the rest of the request continues.

use std::path::PathBuf;

use crate::backend::BackendError;

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    /// A search the whole request depends on failed
    #[error("failed to {operation}: {source}")]
    BackendQuery {
        operation: &'static str,
        #[source]
        source: BackendError,
    },

    #[error("failed to parse symbol results: {0}")]
    ResultParse(#[from] serde_json::Error),

    #[error("failed to open {}: {source}", path.display())]
    FileOpen {
        path: PathBuf,
        #[source]
        source: BackendError,
    },

    #[error("failed to get full definition of {name}: {source}")]
    DefinitionExpand {
        name: String,
        #[source]
        source: BackendError,
    },

    #[error("failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContextError {
    pub fn backend_query(operation: &'static str, source: BackendError) -> Self {
        ContextError::BackendQuery { operation, source }
    }
}
