//! Name search against the backend

use crate::backend::SymbolBackend;
use crate::diagnostics::Diagnostics;
use crate::error::ContextError;
use crate::symbol::SymbolMatch;

const COMPONENT: &str = "matcher";

/// Resolves a free-text symbol name into backend symbol matches
pub struct SymbolMatcher<'a> {
    backend: &'a dyn SymbolBackend,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> SymbolMatcher<'a> {
    pub fn new(backend: &'a dyn SymbolBackend, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            backend,
            diagnostics,
        }
    }

    /// All matches for `query`, in backend order.
    ///
    /// The backend's own matching, including qualified names such as
    /// `Type::member`, is taken as is. Only bare name/location records are
    /// filtered, by exact name.
    pub async fn find_matches(&self, query: &str) -> Result<Vec<SymbolMatch>, ContextError> {
        let result_set = self
            .backend
            .symbol(query)
            .await
            .map_err(|source| ContextError::backend_query("fetch symbol", source))?;

        let matches: Vec<SymbolMatch> = result_set
            .results()?
            .into_iter()
            .filter(|candidate| candidate.accepts_query(query))
            .collect();

        for candidate in &matches {
            self.diagnostics.debug(
                COMPONENT,
                format!(
                    "Found symbol: {} at {}",
                    candidate.name(),
                    candidate.location().to_compact_range()
                ),
            );
        }
        Ok(matches)
    }
}
