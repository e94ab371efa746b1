//! Text rendering for definitions and references
//!
//! Locations render as 1-based `L<line>:C<col>` labels; source excerpts are
//! prefixed with their 1-based line numbers.

use std::fmt::Write;
use std::path::Path;

use crate::context::ranges::DisplayRange;
use crate::symbol::{FileLocation, SymbolMatch, kind_name};

/// Separator opening every rendered block
pub const BLOCK_BANNER: &str = "---\n\n";

/// Marker between two non-adjacent excerpts of the same file
pub const GAP_MARKER: &str = "...";

/// Prefix each line of `text` with its number, starting at `start_line`.
///
/// Numbers are right-aligned to the width of the largest one.
pub fn add_line_numbers(text: &str, start_line: usize) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let last_line = start_line + lines.len().saturating_sub(1);
    let width = last_line.to_string().len();

    let mut out = String::with_capacity(text.len() + lines.len() * (width + 2));
    for (offset, line) in lines.iter().enumerate() {
        let _ = writeln!(out, "{:>width$}|{}", start_line + offset, line, width = width);
    }
    out
}

/// Render one resolved definition
pub fn definition_block(symbol: &SymbolMatch, text: &str, span: &FileLocation) -> String {
    let mut out = String::from(BLOCK_BANNER);
    let _ = writeln!(out, "Symbol: {}", symbol.name());
    let _ = writeln!(out, "File: {}", span.file_path.display());
    if let Some(kind) = symbol.kind() {
        let _ = writeln!(out, "Kind: {}", kind_name(kind));
    }
    if let Some(container) = symbol.container_name() {
        let _ = writeln!(out, "Container Name: {}", container);
    }
    let _ = writeln!(out, "Range: {}", span.range);
    out.push('\n');
    out.push_str(&add_line_numbers(
        text,
        span.range.start.line as usize + 1,
    ));
    out.push('\n');
    out
}

/// Header shared by every reference block of `path`
pub fn reference_header(path: &Path, count: usize) -> String {
    format!(
        "{}{}\nReferences in File: {}\n",
        BLOCK_BANNER,
        path.display(),
        count
    )
}

/// Comma-separated start labels of `references`
pub fn location_labels(references: &[FileLocation]) -> String {
    references
        .iter()
        .map(|reference| reference.range.start.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print the lines covered by `ranges`, with a gap marker between excerpts
/// that do not touch
pub fn format_lines_with_ranges(lines: &[&str], ranges: &[DisplayRange]) -> String {
    let mut out = String::new();
    let mut previous_end: Option<usize> = None;

    for range in ranges {
        if previous_end.is_some_and(|end| range.start_line > end.saturating_add(1)) {
            out.push_str(GAP_MARKER);
            out.push('\n');
        }
        for number in range.start_line.max(1)..=range.end_line {
            let Some(text) = lines.get(number - 1) else {
                break;
            };
            let _ = writeln!(out, "{}|{}", number, text);
        }
        previous_end = Some(range.end_line);
    }
    out
}

/// Render all references to one file
pub fn reference_block(
    path: &Path,
    references: &[FileLocation],
    lines: &[&str],
    ranges: &[DisplayRange],
) -> String {
    let mut out = reference_header(path, references.len());
    if !references.is_empty() {
        let _ = writeln!(out, "At: {}", location_labels(references));
    }
    out.push('\n');
    out.push_str(&format_lines_with_ranges(lines, ranges));
    out
}

/// Header followed by the read failure, in place of the excerpt
pub fn unreadable_file_block(path: &Path, count: usize, error: &std::io::Error) -> String {
    format!(
        "{}\nError reading file: {}",
        reference_header(path, count),
        error
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::{IndexedSymbol, LightweightSymbol, MinimalSymbol, Position, Range};
    use lsp_types::SymbolKind;

    fn span(path: &str, start: (u32, u32), end: (u32, u32)) -> FileLocation {
        FileLocation::new(
            path,
            Range::new(Position::new(start.0, start.1), Position::new(end.0, end.1)),
        )
    }

    #[test]
    fn test_line_numbers_pad_to_widest() {
        let text = "a\nb\nc";
        assert_eq!(add_line_numbers(text, 9), " 9|a\n10|b\n11|c\n");
    }

    #[test]
    fn test_line_numbers_single_line() {
        assert_eq!(add_line_numbers("int x;", 42), "42|int x;\n");
    }

    #[test]
    fn test_indexed_definition_block() {
        let symbol = SymbolMatch::Indexed(IndexedSymbol {
            name: "add".to_string(),
            kind: SymbolKind::FUNCTION,
            container_name: Some("math".to_string()),
            location: span("/src/math.cpp", (9, 4), (9, 7)),
        });
        let definition = span("/src/math.cpp", (9, 0), (11, 1));

        let block = definition_block(
            &symbol,
            "int add(int a, int b) {\n    return a + b;\n}",
            &definition,
        );

        assert_eq!(
            block,
            "---\n\n\
             Symbol: add\n\
             File: /src/math.cpp\n\
             Kind: Function\n\
             Container Name: math\n\
             Range: L10:C1 - L12:C2\n\n\
             10|int add(int a, int b) {\n\
             11|    return a + b;\n\
             12|}\n\n"
        );
    }

    #[test]
    fn test_lightweight_without_container_omits_kind() {
        let symbol = SymbolMatch::Lightweight(LightweightSymbol {
            name: "main".to_string(),
            kind: SymbolKind::FUNCTION,
            container_name: Some(String::new()),
            location: span("/src/main.cpp", (0, 4), (0, 8)),
        });
        let block = definition_block(&symbol, "int main() {}", &span("/src/main.cpp", (0, 0), (0, 13)));

        assert!(!block.contains("Kind:"));
        assert!(!block.contains("Container Name:"));
        assert!(block.contains("Range: L1:C1 - L1:C14\n\n1|int main() {}\n"));
    }

    #[test]
    fn test_minimal_definition_block_has_no_kind() {
        let symbol = SymbolMatch::Minimal(MinimalSymbol {
            name: "helper".to_string(),
            location: span("/src/util.c", (2, 0), (2, 6)),
        });
        let block = definition_block(&symbol, "void helper(void);", &span("/src/util.c", (2, 0), (2, 18)));
        assert!(block.starts_with("---\n\nSymbol: helper\nFile: /src/util.c\nRange: "));
    }

    #[test]
    fn test_lines_with_gap_marker() {
        let lines: Vec<&str> = (1..=20).map(|_| "x").collect();
        let ranges = [DisplayRange::new(1, 2), DisplayRange::new(5, 5)];
        assert_eq!(
            format_lines_with_ranges(&lines, &ranges),
            "1|x\n2|x\n...\n5|x\n"
        );
    }

    #[test]
    fn test_lines_stop_at_end_of_file() {
        let lines = ["a", "b"];
        assert_eq!(
            format_lines_with_ranges(&lines, &[DisplayRange::new(1, 5)]),
            "1|a\n2|b\n"
        );
    }

    #[test]
    fn test_lines_ignore_line_zero_and_open_ended_ranges() {
        let lines = ["a", "b", "c"];
        assert_eq!(
            format_lines_with_ranges(
                &lines,
                &[DisplayRange::new(0, 1), DisplayRange::new(3, usize::MAX)]
            ),
            "1|a\n...\n3|c\n"
        );
    }

    #[test]
    fn test_reference_block_layout() {
        let refs = vec![
            span("/src/main.cpp", (1, 4), (1, 7)),
            span("/src/main.cpp", (3, 11), (3, 14)),
        ];
        let lines = ["#include \"math.hpp\"", "int a = add(1, 2);", "", "int b = add(a, a);"];
        let block = reference_block(
            Path::new("/src/main.cpp"),
            &refs,
            &lines,
            &[DisplayRange::new(2, 2), DisplayRange::new(4, 4)],
        );

        assert_eq!(
            block,
            "---\n\n/src/main.cpp\nReferences in File: 2\n\
             At: L2:C5, L4:C12\n\n\
             2|int a = add(1, 2);\n\
             ...\n\
             4|int b = add(a, a);\n"
        );
    }

    #[test]
    fn test_unreadable_file_block() {
        let error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(
            unreadable_file_block(Path::new("/src/lost.cpp"), 3, &error),
            "---\n\n/src/lost.cpp\nReferences in File: 3\n\nError reading file: gone"
        );
    }
}
