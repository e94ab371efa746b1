//! Reference aggregation
//!
//! Collects references for every match of a symbol name, groups them per
//! file in URI order and renders each file with merged context windows.

use std::collections::BTreeMap;

use crate::backend::SymbolBackend;
use crate::context::PartialResults;
use crate::context::format::{reference_block, unreadable_file_block};
use crate::context::matcher::SymbolMatcher;
use crate::context::ranges::merge_ranges;
use crate::diagnostics::Diagnostics;
use crate::error::ContextError;
use crate::io::FileSystemTrait;
use crate::symbol::FileLocation;

const COMPONENT: &str = "references";

/// References to one symbol, keyed and ordered by file URI
pub type ReferenceGroups = BTreeMap<String, Vec<FileLocation>>;

/// Group `references` by file URI, keeping backend order inside each file
pub fn group_by_file(references: Vec<FileLocation>) -> ReferenceGroups {
    let mut groups = ReferenceGroups::new();
    for reference in references {
        groups
            .entry(reference.uri_string())
            .or_default()
            .push(reference);
    }
    groups
}

pub struct ReferenceAggregator<'a, F: FileSystemTrait> {
    backend: &'a dyn SymbolBackend,
    fs: F,
    diagnostics: &'a dyn Diagnostics,
}

impl<'a, F: FileSystemTrait> ReferenceAggregator<'a, F> {
    pub fn new(backend: &'a dyn SymbolBackend, fs: F, diagnostics: &'a dyn Diagnostics) -> Self {
        Self {
            backend,
            fs,
            diagnostics,
        }
    }

    /// Rendered references to `query` with `context_lines` lines around each.
    ///
    /// A match whose file cannot be opened is skipped, but a failed
    /// reference lookup aborts the whole call. Unreadable files are reported
    /// inline in their block.
    pub async fn find_references(
        &self,
        query: &str,
        context_lines: usize,
    ) -> Result<String, ContextError> {
        let matches = SymbolMatcher::new(self.backend, self.diagnostics)
            .find_matches(query)
            .await?;

        let mut blocks = PartialResults::new();
        for symbol in &matches {
            let location = symbol.location();

            if let Err(source) = self.backend.open_file(&location.file_path).await {
                let error = ContextError::FileOpen {
                    path: location.file_path.clone(),
                    source,
                };
                blocks.skip(self.diagnostics, COMPONENT, error);
                continue;
            }

            let references = self
                .backend
                .references(location, false)
                .await
                .map_err(|source| ContextError::backend_query("get references", source))?;

            self.diagnostics.debug(
                COMPONENT,
                format!(
                    "{} references to {} at {}",
                    references.len(),
                    symbol.name(),
                    location.to_compact_range()
                ),
            );

            for file_references in group_by_file(references).into_values() {
                blocks.push(self.render_file(&file_references, context_lines));
            }
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
            return Ok(format!("No references found for symbol: {}", query));
        }
        Ok(blocks.into_items().join("\n"))
    }

    fn render_file(&self, references: &[FileLocation], context_lines: usize) -> String {
        // Groups are never empty
        let path = &references[0].file_path;

        let text = match self.fs.read_to_string(path) {
            Ok(text) => text,
            Err(source) => {
                let block = unreadable_file_block(path, references.len(), &source);
                let error = ContextError::FileRead {
                    path: path.clone(),
                    source,
                };
                self.diagnostics.warn(COMPONENT, error.to_string());
                return block;
            }
        };

        let lines: Vec<&str> = text.split('\n').collect();
        let points: Vec<usize> = references
            .iter()
            .map(|reference| reference.range.start.line as usize + 1)
            .collect();
        let ranges = merge_ranges(&points, lines.len(), context_lines);

        reference_block(path, references, &lines, &ranges)
    }
}
