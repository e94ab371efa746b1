//! Definition lookup

use crate::backend::SymbolBackend;
use crate::context::PartialResults;
use crate::context::format::definition_block;
use crate::context::matcher::SymbolMatcher;
use crate::diagnostics::Diagnostics;
use crate::error::ContextError;
use crate::symbol::SymbolMatch;

const COMPONENT: &str = "definitions";

/// Renders the full source definition of every match for a symbol name
pub struct DefinitionResolver<'a> {
    backend: &'a dyn SymbolBackend,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a> DefinitionResolver<'a> {
    pub fn new(backend: &'a dyn SymbolBackend, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            backend,
            diagnostics,
        }
    }

    /// Definitions of `query`, or `"<query> not found"` when none resolve.
    ///
    /// Matches whose file cannot be opened or whose definition cannot be
    /// expanded are logged and left out.
    pub async fn resolve_definitions(&self, query: &str) -> Result<String, ContextError> {
        let matches = SymbolMatcher::new(self.backend, self.diagnostics)
            .find_matches(query)
            .await?;

        let mut blocks = PartialResults::new();
        for symbol in &matches {
            let block = self.render(symbol).await;
            blocks.absorb(block, self.diagnostics, COMPONENT);
        }

        if !blocks.skipped().is_empty() {
            self.diagnostics.warn(
                COMPONENT,
                format!(
                    "{} of {} matches for {} skipped",
                    blocks.skipped().len(),
                    matches.len(),
                    query
                ),
            );
        }

        if blocks.is_empty() {
            return Ok(format!("{} not found", query));
        }
        Ok(blocks.into_items().concat())
    }

    async fn render(&self, symbol: &SymbolMatch) -> Result<String, ContextError> {
        let location = symbol.location();
        self.backend
            .open_file(&location.file_path)
            .await
            .map_err(|source| ContextError::FileOpen {
                path: location.file_path.clone(),
                source,
            })?;

        let (text, span) = self
            .backend
            .full_definition(location)
            .await
            .map_err(|source| ContextError::DefinitionExpand {
                name: symbol.name().to_string(),
                source,
            })?;

        Ok(definition_block(symbol, &text, &span))
    }
}
