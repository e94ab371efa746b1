//! Symbol abstraction module
//!
//! Locations and symbol matches in the crate's own types, with conversions
//! from the LSP wire types provided by `lsp_types`.

pub mod location;
#[allow(clippy::module_inception)]
mod symbol;

pub use location::{FileLocation, Position, Range, UriError};
pub use symbol::{MinimalSymbol, SymbolMatch, kind_name};

#[cfg(test)]
pub use symbol::{IndexedSymbol, LightweightSymbol};
