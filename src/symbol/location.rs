use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use lsp_types::{Location as LspLocation, Position as LspPosition, Range as LspRange};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Serialize};

/// URI scheme prefix used for every location handed to the backend
pub const FILE_SCHEME: &str = "file://";

/// Path bytes left as-is in a file URI: unreserved characters and `/`
const PATH_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// 0-based line/column position inside a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Render as a 1-based `L<line>:C<col>` label
    pub fn label(&self) -> String {
        format!("L{}:C{}", self.line + 1, self.column + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-width range at a single position
    pub fn point(position: Position) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// Whether `position` lies within the range, both ends inclusive
    pub fn contains(&self, position: Position) -> bool {
        self.start <= position && position <= self.end
    }

    /// Whether `other` is fully enclosed by this range
    pub fn encloses(&self, other: &Range) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start.label(), self.end.label())
    }
}

/// Error raised when a path cannot be expressed as an LSP URI
#[derive(Debug, thiserror::Error)]
#[error("Invalid file URI '{uri}': {reason}")]
pub struct UriError {
    pub uri: String,
    pub reason: String,
}

/// A range inside a file identified by its absolute path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileLocation {
    pub file_path: PathBuf,
    pub range: Range,
}

impl FileLocation {
    pub fn new(file_path: impl Into<PathBuf>, range: Range) -> Self {
        Self {
            file_path: file_path.into(),
            range,
        }
    }

    /// `file://` URI string for this location's file
    pub fn uri_string(&self) -> String {
        uri_string_from_path(&self.file_path)
    }

    /// Typed LSP URI for this location's file
    pub fn lsp_uri(&self) -> Result<lsp_types::Uri, UriError> {
        uri_from_path(&self.file_path)
    }

    /// Convert FileLocation to compact LSP-style range format
    /// Examples:
    /// - Point location: "file.cpp:23:5"
    /// - Same line range: "file.cpp:23:5-20"
    /// - Multi-line range: "file.cpp:23:5-25:10"
    pub fn to_compact_range(&self) -> String {
        let path = self.file_path.to_string_lossy();
        let start = &self.range.start;
        let end = &self.range.end;

        let start_line = start.line + 1;
        let start_col = start.column + 1;
        let end_line = end.line + 1;
        let end_col = end.column + 1;

        if start_line == end_line {
            if start_col == end_col {
                format!("{}:{}:{}", path, start_line, start_col)
            } else {
                format!("{}:{}:{}-{}", path, start_line, start_col, end_col)
            }
        } else {
            format!(
                "{}:{}:{}-{}:{}",
                path, start_line, start_col, end_line, end_col
            )
        }
    }
}

/// Percent-encoded `file://` URI for `path`
pub fn uri_string_from_path(path: &Path) -> String {
    let path_str = path.to_string_lossy();
    let encoded = utf8_percent_encode(&path_str, PATH_ESCAPE);
    if path_str.starts_with('/') {
        format!("{}{}", FILE_SCHEME, encoded)
    } else {
        format!("{}/{}", FILE_SCHEME, encoded)
    }
}

pub fn uri_from_path(path: &Path) -> Result<lsp_types::Uri, UriError> {
    let uri_string = uri_string_from_path(path);
    lsp_types::Uri::from_str(&uri_string).map_err(|e| UriError {
        uri: uri_string.clone(),
        reason: e.to_string(),
    })
}

/// Decoded file system path of a `file://` URI
pub fn pathbuf_from_uri(uri: &lsp_types::Uri) -> PathBuf {
    let raw = uri.path().to_string();
    percent_decode_str(&raw).decode_utf8_lossy().into_owned().into()
}

impl From<LspPosition> for Position {
    fn from(pos: LspPosition) -> Self {
        Position {
            line: pos.line,
            column: pos.character,
        }
    }
}

impl From<Position> for LspPosition {
    fn from(pos: Position) -> Self {
        LspPosition {
            line: pos.line,
            character: pos.column,
        }
    }
}

impl From<LspRange> for Range {
    fn from(range: LspRange) -> Self {
        Range {
            start: range.start.into(),
            end: range.end.into(),
        }
    }
}

impl From<Range> for LspRange {
    fn from(range: Range) -> Self {
        LspRange {
            start: range.start.into(),
            end: range.end.into(),
        }
    }
}

impl From<&LspLocation> for FileLocation {
    fn from(location: &LspLocation) -> Self {
        FileLocation {
            range: Range::from(location.range),
            file_path: pathbuf_from_uri(&location.uri),
        }
    }
}
