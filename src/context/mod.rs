//! Symbol context engine
//!
//! Turns a symbol name into rendered source context:
//! - **matcher**: name search against the backend
//! - **definitions**: full definition text for every match
//! - **references**: references grouped per file with surrounding lines
//! - **ranges** and **format**: line-window merging and text rendering

pub mod definitions;
pub mod format;
pub mod matcher;
pub mod ranges;
pub mod references;

pub use definitions::DefinitionResolver;
pub use references::ReferenceAggregator;

use crate::diagnostics::Diagnostics;
use crate::error::ContextError;

/// Outcome of a best-effort loop: what succeeded, and what was skipped
#[derive(Debug)]
pub struct PartialResults<T> {
    items: Vec<T>,
    skipped: Vec<String>,
}

impl<T> Default for PartialResults<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> PartialResults<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// Record a skipped step and report it
    pub fn skip(
        &mut self,
        diagnostics: &dyn Diagnostics,
        component: &'static str,
        error: ContextError,
    ) {
        let message = error.to_string();
        diagnostics.error(component, message.clone());
        self.skipped.push(message);
    }

    /// Keep a success, or record the failure as skipped
    pub fn absorb(
        &mut self,
        result: Result<T, ContextError>,
        diagnostics: &dyn Diagnostics,
        component: &'static str,
    ) {
        match result {
            Ok(item) => self.push(item),
            Err(error) => self.skip(diagnostics, component, error),
        }
    }

    #[cfg(test)]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}
