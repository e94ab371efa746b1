//! Symbol match representation
//!
//! Backends answer symbol searches in several shapes. They are modelled as a
//! closed set of variants sharing `name()` and `location()`, with kind and
//! container exposed only where the shape carries them meaningfully.

use lsp_types::{OneOf, SymbolInformation, SymbolKind, WorkspaceSymbol};
use serde::{Deserialize, Serialize};

use crate::symbol::location::{FileLocation, Position, Range, pathbuf_from_uri};

/// Richer indexed shape: kind and container are always reported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub container_name: Option<String>,
    pub location: FileLocation,
}

/// Lightweight shape: kind and container only matter when a container disambiguates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightweightSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub container_name: Option<String>,
    pub location: FileLocation,
}

/// Fallback shape carrying only a name and a location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimalSymbol {
    pub name: String,
    pub location: FileLocation,
}

/// A candidate returned by a name-based symbol search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolMatch {
    Indexed(IndexedSymbol),
    Lightweight(LightweightSymbol),
    Minimal(MinimalSymbol),
}

impl SymbolMatch {
    pub fn name(&self) -> &str {
        match self {
            SymbolMatch::Indexed(s) => &s.name,
            SymbolMatch::Lightweight(s) => &s.name,
            SymbolMatch::Minimal(s) => &s.name,
        }
    }

    pub fn location(&self) -> &FileLocation {
        match self {
            SymbolMatch::Indexed(s) => &s.location,
            SymbolMatch::Lightweight(s) => &s.location,
            SymbolMatch::Minimal(s) => &s.location,
        }
    }

    /// Kind to report, if this shape supplies one worth showing
    pub fn kind(&self) -> Option<SymbolKind> {
        match self {
            SymbolMatch::Indexed(s) => Some(s.kind),
            SymbolMatch::Lightweight(s) => non_empty(&s.container_name).map(|_| s.kind),
            SymbolMatch::Minimal(_) => None,
        }
    }

    /// Container to report, if present and non-empty
    pub fn container_name(&self) -> Option<&str> {
        match self {
            SymbolMatch::Indexed(s) => non_empty(&s.container_name),
            SymbolMatch::Lightweight(s) => non_empty(&s.container_name),
            SymbolMatch::Minimal(_) => None,
        }
    }

    /// Whether this match survives filtering for `query`.
    ///
    /// Indexed and lightweight results are trusted as returned: the backend
    /// already resolved qualified queries such as `Type::member` into a name
    /// and container. Only the minimal shape is held to exact name equality.
    pub fn accepts_query(&self, query: &str) -> bool {
        match self {
            SymbolMatch::Minimal(s) => s.name == query,
            _ => true,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl From<SymbolInformation> for SymbolMatch {
    fn from(info: SymbolInformation) -> Self {
        SymbolMatch::Indexed(IndexedSymbol {
            location: FileLocation::from(&info.location),
            name: info.name,
            kind: info.kind,
            container_name: info.container_name,
        })
    }
}

impl From<WorkspaceSymbol> for SymbolMatch {
    fn from(ws_symbol: WorkspaceSymbol) -> Self {
        let location = match ws_symbol.location {
            OneOf::Left(location) => FileLocation::from(&location),
            // Location without a range: anchor at the top of the file
            OneOf::Right(workspace_location) => FileLocation {
                file_path: pathbuf_from_uri(&workspace_location.uri),
                range: Range::point(Position::new(0, 0)),
            },
        };

        SymbolMatch::Lightweight(LightweightSymbol {
            name: ws_symbol.name,
            kind: ws_symbol.kind,
            container_name: ws_symbol.container_name,
            location,
        })
    }
}

/// Human-readable name for an LSP symbol kind
pub fn kind_name(kind: SymbolKind) -> &'static str {
    match kind {
        SymbolKind::FILE => "File",
        SymbolKind::MODULE => "Module",
        SymbolKind::NAMESPACE => "Namespace",
        SymbolKind::PACKAGE => "Package",
        SymbolKind::CLASS => "Class",
        SymbolKind::METHOD => "Method",
        SymbolKind::PROPERTY => "Property",
        SymbolKind::FIELD => "Field",
        SymbolKind::CONSTRUCTOR => "Constructor",
        SymbolKind::ENUM => "Enum",
        SymbolKind::INTERFACE => "Interface",
        SymbolKind::FUNCTION => "Function",
        SymbolKind::VARIABLE => "Variable",
        SymbolKind::CONSTANT => "Constant",
        SymbolKind::STRING => "String",
        SymbolKind::NUMBER => "Number",
        SymbolKind::BOOLEAN => "Boolean",
        SymbolKind::ARRAY => "Array",
        SymbolKind::OBJECT => "Object",
        SymbolKind::KEY => "Key",
        SymbolKind::NULL => "Null",
        SymbolKind::ENUM_MEMBER => "EnumMember",
        SymbolKind::STRUCT => "Struct",
        SymbolKind::EVENT => "Event",
        SymbolKind::OPERATOR => "Operator",
        SymbolKind::TYPE_PARAMETER => "TypeParameter",
        _ => "Unknown",
    }
}
