//! Symbol backend abstraction
//!
//! The engine talks to its language server through [`SymbolBackend`], a
//! small async capability set: name search, file open, reference lookup and
//! full-definition expansion. [`LspBackend`] implements it over a real
//! language server process; tests use a scripted backend.

use async_trait::async_trait;
use lsp_types::WorkspaceSymbolResponse;
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::io::ProcessError;
use crate::lsp::LspError;
use crate::symbol::{FileLocation, MinimalSymbol, SymbolMatch, UriError};

pub mod definition;
pub mod files;
pub mod lsp;

#[cfg(test)]
pub mod testing;

pub use lsp::LspBackend;

// ============================================================================
// Backend Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("LSP error: {0}")]
    Lsp(#[from] LspError),

    #[error("Process error: {0}")]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Uri(#[from] UriError),

    #[error("Failed to read {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Line {line} is out of range for {} ({total} lines)", path.display())]
    LineOutOfRange {
        path: PathBuf,
        line: u32,
        total: usize,
    },

    /// Scripted failure raised by test backends
    #[cfg(test)]
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// Symbol Result Set
// ============================================================================

/// Undecoded answer to a symbol search
///
/// Servers reply with flat `SymbolInformation` lists, nested
/// `WorkspaceSymbol` lists, or bare `{name, location}` records. Decoding is
/// deferred so the caller can tell a failed search from an unreadable answer.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolResultSet {
    payload: Value,
}

/// Bare record some servers return without a kind
#[derive(Debug, Deserialize)]
struct MinimalWire {
    name: String,
    location: lsp_types::Location,
}

impl SymbolResultSet {
    pub fn new(payload: Value) -> Self {
        Self { payload }
    }

    /// Decode into symbol matches, preserving backend order
    pub fn results(&self) -> Result<Vec<SymbolMatch>, serde_json::Error> {
        if self.payload.is_null() {
            return Ok(Vec::new());
        }

        match serde_json::from_value::<WorkspaceSymbolResponse>(self.payload.clone()) {
            Ok(WorkspaceSymbolResponse::Flat(symbols)) => {
                Ok(symbols.into_iter().map(SymbolMatch::from).collect())
            }
            Ok(WorkspaceSymbolResponse::Nested(symbols)) => {
                Ok(symbols.into_iter().map(SymbolMatch::from).collect())
            }
            Err(_) => {
                let records: Vec<MinimalWire> = serde_json::from_value(self.payload.clone())?;
                Ok(records
                    .into_iter()
                    .map(|record| {
                        SymbolMatch::Minimal(MinimalSymbol {
                            location: FileLocation::from(&record.location),
                            name: record.name,
                        })
                    })
                    .collect())
            }
        }
    }
}

// ============================================================================
// Backend Trait
// ============================================================================

#[async_trait]
pub trait SymbolBackend: Send + Sync {
    /// Name-based symbol search
    async fn symbol(&self, query: &str) -> Result<SymbolResultSet, BackendError>;

    /// Make `path` known to the backend; repeated opens are cheap
    async fn open_file(&self, path: &Path) -> Result<(), BackendError>;

    /// Locations referring to the symbol at `location.range.start`
    async fn references(
        &self,
        location: &FileLocation,
        include_declaration: bool,
    ) -> Result<Vec<FileLocation>, BackendError>;

    /// Source text of the whole definition containing `location`, together
    /// with the span it covers
    async fn full_definition(
        &self,
        location: &FileLocation,
    ) -> Result<(String, FileLocation), BackendError>;
}
