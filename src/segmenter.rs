//! Turns alignment points into contiguous, non-overlapping section ranges.

use std::collections::HashSet;

use crate::model::Section;

/// Builds the ordered section list for one chapter.
///
/// With no matches the whole chapter is a single introduction section.
/// Otherwise candidate starts are deduplicated by body line, and a start is
/// accepted only when it sits at least `min_gap` lines past the last
/// *accepted* start, which merges clusters of matches landing in the same
/// neighborhood. The result covers `[0, total_lines - 1]` exactly once.
pub fn build_sections(
    matches: &[(usize, usize)],
    total_lines: usize,
    min_gap: usize,
) -> Vec<Section> {
    if total_lines == 0 {
        return Vec::new();
    }
    if matches.is_empty() {
        return vec![Section {
            start_line: 0,
            end_line: total_lines - 1,
            toc_index: None,
        }];
    }

    let ordered = dedupe_by_line(matches);
    let starts = pick_starts(&ordered, min_gap);

    let mut sections = Vec::with_capacity(starts.len() + 1);

    if let Some(&(_, first_line)) = starts.first() {
        if first_line > 0 {
            sections.push(Section {
                start_line: 0,
                end_line: first_line - 1,
                toc_index: None,
            });
        }
    }

    for window in starts.windows(2) {
        let (toc_index, start_line) = window[0];
        let (_, next_start) = window[1];
        sections.push(Section {
            start_line,
            end_line: next_start - 1,
            toc_index: Some(toc_index),
        });
    }

    if let Some(&(toc_index, start_line)) = starts.last() {
        sections.push(Section {
            start_line,
            end_line: total_lines - 1,
            toc_index: Some(toc_index),
        });
    }

    sections
}

/// Keeps the first pair seen per body line, then orders by body line.
fn dedupe_by_line(matches: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut seen_lines = HashSet::new();
    let mut out = Vec::with_capacity(matches.len());

    for &pair in matches {
        if seen_lines.insert(pair.1) {
            out.push(pair);
        }
    }
    out.sort_by_key(|&(_, body_line)| body_line);
    out
}

/// Greedy start selection: always the first candidate, then every candidate
/// at least `min_gap` lines past the last accepted one.
fn pick_starts(ordered: &[(usize, usize)], min_gap: usize) -> Vec<(usize, usize)> {
    let mut starts = Vec::new();
    let Some(&first) = ordered.first() else {
        return starts;
    };

    starts.push(first);
    let mut last_line = first.1;

    for &candidate in &ordered[1..] {
        if candidate.1 - last_line >= min_gap {
            starts.push(candidate);
            last_line = candidate.1;
        }
    }
    starts
}
