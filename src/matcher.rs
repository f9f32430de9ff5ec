//! Aligns one chapter's TOC slice against the chapter's body text.

use crate::title::{is_noise_line, is_subtitle_match};

/// Produces `(toc_line_index, body_line_index)` pairs, one per TOC-slice line
/// that reappears in the body, sorted ascending by body line.
///
/// Noise lines are skipped entirely. For a surviving line, the first body
/// line containing it wins. Several TOC lines may land on the same body line;
/// the segmenter deduplicates downstream.
pub fn match_indices(
    toc_lines: &[String],
    body_lines: &[String],
    chapter_title: &str,
    uppercase_threshold: f64,
) -> Vec<(usize, usize)> {
    let mut matches = Vec::new();

    for (toc_index, line) in toc_lines.iter().enumerate() {
        if is_noise_line(line, chapter_title, uppercase_threshold) {
            continue;
        }
        if let Some(body_index) = first_match(body_lines, line) {
            matches.push((toc_index, body_index));
        }
    }

    matches.sort_by_key(|&(_, body_index)| body_index);
    matches
}

fn first_match(body_lines: &[String], toc_line: &str) -> Option<usize> {
    body_lines
        .iter()
        .position(|body_line| is_subtitle_match(toc_line, body_line))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn first_body_occurrence_wins() {
        let toc = lines(&["Observer in action"]);
        let body = lines(&[
            "intro text",
            "The observer in action begins",
            "observer in action, recap",
        ]);
        assert_eq!(match_indices(&toc, &body, "weather station", 0.6), vec![(0, 1)]);
    }

    #[test]
    fn results_are_sorted_by_body_line() {
        let toc = lines(&["late heading", "early heading"]);
        let body = lines(&["early heading here", "middle", "late heading here"]);
        let matches = match_indices(&toc, &body, "chapter", 0.6);
        assert_eq!(matches, vec![(1, 0), (0, 2)]);
    }

    #[test]
    fn chapter_title_echo_is_never_matched() {
        let toc = lines(&["The   Weather  Station"]);
        let body = lines(&["the weather station"]);
        assert!(match_indices(&toc, &body, "weather station", 0.6).is_empty());
    }

    #[test]
    fn banned_keywords_and_caps_are_never_matched() {
        let toc = lines(&["Copyright notice", "ALL CAPS RUNNING HEADER", "Real heading"]);
        let body = lines(&[
            "copyright notice",
            "all caps running header",
            "a real heading follows",
        ]);
        assert_eq!(match_indices(&toc, &body, "something", 0.6), vec![(2, 2)]);
    }

    #[test]
    fn unmatched_toc_lines_contribute_nothing() {
        let toc = lines(&["does not appear"]);
        let body = lines(&["completely different text"]);
        assert!(match_indices(&toc, &body, "chapter", 0.6).is_empty());
    }

    #[test]
    fn duplicate_body_lines_are_kept_here() {
        let toc = lines(&["shared heading", "shared heading again"]);
        let body = lines(&["shared heading again and more"]);
        let matches = match_indices(&toc, &body, "chapter", 0.6);
        assert_eq!(matches, vec![(0, 0), (1, 0)]);
    }
}
