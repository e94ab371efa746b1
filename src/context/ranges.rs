//! Line-range merging for reference context
//!
//! Turns reference line numbers into the smallest set of display windows
//! that shows every reference with its surrounding context.

/// Inclusive 1-based span of lines to display
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DisplayRange {
    pub start_line: usize,
    pub end_line: usize,
}

impl DisplayRange {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    /// Window of `context` lines either side of `line`, clamped to the file
    fn around(line: usize, context: usize, total_lines: usize) -> Self {
        Self {
            start_line: line.saturating_sub(context).max(1),
            end_line: line.saturating_add(context).min(total_lines),
        }
    }
}

/// Merge context windows around 1-based `points` in a file of `total_lines`.
///
/// Points outside `[1, total_lines]` are dropped. The result is sorted and
/// no two ranges overlap or touch.
pub fn merge_ranges(points: &[usize], total_lines: usize, context: usize) -> Vec<DisplayRange> {
    if total_lines == 0 {
        return Vec::new();
    }

    let windows = points
        .iter()
        .copied()
        .filter(|&line| (1..=total_lines).contains(&line))
        .map(|line| DisplayRange::around(line, context, total_lines))
        .collect();

    merge_display_ranges(windows)
}

/// Sort and coalesce ranges that overlap or are directly adjacent.
///
/// Line 0 does not exist, so starts below 1 are raised to 1 and ranges left
/// empty are dropped.
pub fn merge_display_ranges(ranges: Vec<DisplayRange>) -> Vec<DisplayRange> {
    let mut ranges: Vec<DisplayRange> = ranges
        .into_iter()
        .map(|range| DisplayRange::new(range.start_line.max(1), range.end_line))
        .filter(|range| range.start_line <= range.end_line)
        .collect();
    ranges.sort();

    let mut merged: Vec<DisplayRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        match merged.last_mut() {
            Some(last) if range.start_line <= last.end_line.saturating_add(1) => {
                last.end_line = last.end_line.max(range.end_line);
            }
            _ => merged.push(range),
        }
    }
    merged
}
