//! Full-definition span expansion
//!
//! Given the text of a file, its document symbols and the location of a
//! symbol match, computes the whole definition the match belongs to.

use lsp_types::{DocumentSymbol, DocumentSymbolResponse};
use std::path::Path;

use crate::backend::BackendError;
use crate::symbol::{FileLocation, Position, Range};

/// Expand `location` to its full definition inside `text`.
///
/// The span is the innermost document symbol containing the match start,
/// or the match range itself when no symbol contains it. The span always
/// begins at column 0. If its last line ends with an opening bracket the
/// span continues to the matching close.
pub fn expand_definition(
    path: &Path,
    text: &str,
    symbols: Option<&DocumentSymbolResponse>,
    location: &FileLocation,
) -> Result<(String, FileLocation), BackendError> {
    let lines: Vec<&str> = text.lines().collect();

    let mut span = symbols
        .and_then(|response| innermost_containing(response, location.range.start))
        .unwrap_or(location.range);
    span.start.column = 0;

    if span.end.line as usize >= lines.len() {
        return Err(BackendError::LineOutOfRange {
            path: path.to_path_buf(),
            line: span.end.line,
            total: lines.len(),
        });
    }

    if let Some(end) = extend_to_closing_bracket(&lines, span.end.line as usize) {
        span.end = end;
    }

    let start = (span.start.line as usize).min(span.end.line as usize);
    let end = span.end.line as usize;
    let body = lines[start..=end].join("\n");

    Ok((body, FileLocation::new(path, span)))
}

fn innermost_containing(response: &DocumentSymbolResponse, target: Position) -> Option<Range> {
    let mut ranges = Vec::new();
    match response {
        DocumentSymbolResponse::Flat(symbols) => {
            ranges.extend(symbols.iter().map(|symbol| Range::from(symbol.location.range)));
        }
        DocumentSymbolResponse::Nested(symbols) => collect_nested(symbols, &mut ranges),
    }

    ranges
        .into_iter()
        .filter(|range| range.contains(target))
        .fold(None, |best: Option<Range>, candidate| match best {
            Some(current) if !current.encloses(&candidate) => Some(current),
            _ => Some(candidate),
        })
}

fn collect_nested(symbols: &[DocumentSymbol], ranges: &mut Vec<Range>) {
    for symbol in symbols {
        ranges.push(Range::from(symbol.range));
        if let Some(children) = &symbol.children {
            collect_nested(children, ranges);
        }
    }
}

fn closing_for(open: char) -> Option<char> {
    match open {
        '(' => Some(')'),
        '[' => Some(']'),
        '{' => Some('}'),
        '<' => Some('>'),
        _ => None,
    }
}

/// Position just past the bracket closing the one that ends `line_index`
fn extend_to_closing_bracket(lines: &[&str], line_index: usize) -> Option<Position> {
    let last = lines[line_index].trim_end().chars().last()?;
    closing_for(last)?;

    let mut stack = vec![last];
    for (offset, line) in lines.iter().enumerate().skip(line_index + 1) {
        for (column, ch) in line.char_indices() {
            if closing_for(ch).is_some() {
                stack.push(ch);
                continue;
            }
            let Some(&open) = stack.last() else {
                continue;
            };
            if closing_for(open) == Some(ch) {
                stack.pop();
                if stack.is_empty() {
                    return Some(Position::new(offset as u32, column as u32 + 1));
                }
            }
        }
    }
    None
}
