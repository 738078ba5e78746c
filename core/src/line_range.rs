//! Merge, containment, subtraction and counting utilities on line ranges.
//! All operations are total functions over `LineRange` — no exceptions, no
//! panics.

use crate::api::types::LineRange;

/// Sort and fuse a set of ranges; adjacent ranges (gap of exactly 1) are
/// merged into one. The result is sorted and non-overlapping.
pub fn merge(ranges: &[LineRange]) -> Vec<LineRange> {
    if ranges.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<LineRange> = ranges.to_vec();
    sorted.sort_by_key(|r| (r.start_line, r.end_line));

    let mut merged: Vec<LineRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        match merged.last_mut() {
            Some(last) if last.adjacent_or_overlapping(&range) => {
                last.end_line = last.end_line.max(range.end_line);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// The complement of `covered` within `[1, total]`.
pub fn uncovered(total: u32, covered: &[LineRange]) -> Vec<LineRange> {
    if total == 0 {
        return Vec::new();
    }

    let merged = merge(covered);
    let mut gaps = Vec::new();
    let mut cursor = 1u32;

    for range in &merged {
        let clipped_start = range.start_line.max(1);
        let clipped_end = range.end_line.min(total);
        if clipped_start > total {
            break;
        }
        if clipped_start > cursor {
            gaps.push(LineRange::new(cursor, clipped_start - 1));
        }
        cursor = cursor.max(clipped_end.saturating_add(1));
    }

    if cursor <= total {
        gaps.push(LineRange::new(cursor, total));
    }

    gaps
}

/// Linear containment check: true if `line` falls within any range.
pub fn contains(ranges: &[LineRange], line: u32) -> bool {
    ranges.iter().any(|r| r.contains(line))
}

/// `numberOfNewlines + (1 if text != "")`.
pub fn count_lines(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    let newlines = text.bytes().filter(|&b| b == b'\n').count() as u32;
    newlines + 1
}

/// Intersection of `ranges` with the line set `touched`, as the subset of
/// `touched` lines contained in any range, expressed as merged ranges.
pub fn intersect_with_lines(ranges: &[LineRange], touched: &std::collections::BTreeSet<u32>) -> Vec<LineRange> {
    let merged = merge(ranges);
    let mut hit: Vec<u32> = touched
        .iter()
        .copied()
        .filter(|line| merged.iter().any(|r| r.contains(*line)))
        .collect();
    hit.sort_unstable();
    lines_to_ranges(&hit)
}

/// Collapse a sorted-or-unsorted set of individual line numbers into merged
/// contiguous ranges.
pub fn lines_to_ranges(lines: &[u32]) -> Vec<LineRange> {
    if lines.is_empty() {
        return Vec::new();
    }
    let mut sorted = lines.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges = Vec::new();
    let mut start = sorted[0];
    let mut end = sorted[0];
    for &line in &sorted[1..] {
        if line == end + 1 {
            end = line;
        } else {
            ranges.push(LineRange::new(start, end));
            start = line;
            end = line;
        }
    }
    ranges.push(LineRange::new(start, end));
    ranges
}
