//! Chapter-title derivation and the noise rules applied to printed-TOC lines.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::text::{collapse_whitespace, normalize_key, uppercase_ratio};

/// Keys that mark a file (or title) as the printed table of contents itself.
const TOC_LABELS: [&str; 3] = ["tableofcontents", "contents", "toc"];

/// A TOC line containing any of these is a running header, watermark, or
/// boilerplate, never a subsection title.
const BANNED_KEYWORDS: [&str; 4] = ["download", "wowebook", "copyright", "page"];

/// Derives the canonical chapter title from a filename or path.
///
/// Takes the filename stem, strips a leading `<digits>_` ordinal prefix,
/// turns underscores into spaces, lowercases, then strips a leading
/// `chapter`/`ch` tag with its number and optional separator, and finally a
/// leading article. `03_The_Great_Escape.txt` becomes `great escape`.
pub fn extract_chapter_title(path_or_name: &str) -> String {
    let stem = Path::new(path_or_name)
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or(path_or_name);

    let mut rest = stem;
    if let Some(position) = rest.find('_') {
        if position > 0 && rest[..position].chars().all(|character| character.is_ascii_digit()) {
            rest = &rest[position + 1..];
        }
    }

    let spaced = rest.replace('_', " ");
    let lowered = collapse_whitespace(&spaced).to_lowercase();
    let untagged = strip_chapter_tag(&lowered);
    strip_leading_article(&untagged).to_string()
}

static CHAPTER_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:chapter|ch)\s*(?:[0-9]+|[ivxlcdm]+)\b\s*[:.\-]?\s*")
        .expect("chapter tag pattern is valid")
});

fn strip_chapter_tag(title: &str) -> String {
    CHAPTER_TAG.replace(title, "").trim().to_string()
}

/// True when the normalized text contains a table-of-contents label.
pub fn is_toc_label(text: &str) -> bool {
    let key = normalize_key(text);
    TOC_LABELS.iter().any(|label| key.contains(label))
}

/// Removes a leading "the " case-insensitively, also trimming leading
/// whitespace. Applied uniformly wherever titles are compared.
pub fn strip_leading_article(input: &str) -> &str {
    let trimmed = input.trim_start();
    if trimmed.len() >= 4 && trimmed[..4].eq_ignore_ascii_case("the ") {
        &trimmed[4..]
    } else {
        trimmed
    }
}

/// Noise rules for printed-TOC lines inside one chapter's slice.
///
/// A line is dropped when it echoes the chapter's own title, carries a banned
/// keyword, contains `()` or `//`, has no letters at all, or is mostly
/// uppercase (running headers). `uppercase_threshold` defaults to 0.6 at the
/// CLI.
pub fn is_noise_line(line: &str, chapter_title: &str, uppercase_threshold: f64) -> bool {
    let collapsed = collapse_whitespace(line);
    if collapsed.is_empty() {
        return true;
    }

    let lowered = collapsed.to_lowercase();
    let title = collapse_whitespace(chapter_title).to_lowercase();
    if !title.is_empty() && lowered.contains(&title) {
        return true;
    }

    if BANNED_KEYWORDS.iter().any(|keyword| lowered.contains(keyword)) {
        return true;
    }

    if collapsed.contains("()") || collapsed.contains("//") {
        return true;
    }

    if !collapsed.chars().any(|character| character.is_alphabetic()) {
        return true;
    }

    uppercase_ratio(&collapsed) >= uppercase_threshold
}

/// Whitespace-collapsed, case-insensitive containment of the
/// article-stripped TOC line in the body line.
pub fn is_subtitle_match(toc_line: &str, body_line: &str) -> bool {
    let collapsed = collapse_whitespace(toc_line);
    let needle = strip_leading_article(&collapsed).to_lowercase();
    if needle.is_empty() {
        return false;
    }
    collapse_whitespace(body_line).to_lowercase().contains(&needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chapter_title_round_trip() {
        assert_eq!(extract_chapter_title("03_The_Great_Escape.txt"), "great escape");
    }

    #[test]
    fn chapter_title_strips_chapter_tags() {
        assert_eq!(
            extract_chapter_title("01_Chapter_1_Intro_to_Design_Patterns.txt"),
            "intro to design patterns"
        );
        assert_eq!(extract_chapter_title("ch_IV_strategy.txt"), "strategy");
        assert_eq!(extract_chapter_title("observer_pattern.txt"), "observer pattern");
    }

    #[test]
    fn chapter_title_accepts_bare_fragments() {
        assert_eq!(extract_chapter_title("The  Factory   Method"), "factory method");
    }

    #[test]
    fn toc_labels_are_detected_after_normalization() {
        assert!(is_toc_label("00_Table_of_Contents.txt"));
        assert!(is_toc_label("Contents"));
        assert!(is_toc_label("toc.txt"));
        assert!(!is_toc_label("05_Decorator.txt"));
    }

    #[test]
    fn leading_article_is_stripped_case_insensitively() {
        assert_eq!(strip_leading_article("The Observer"), "Observer");
        assert_eq!(strip_leading_article("the observer"), "observer");
        assert_eq!(strip_leading_article("  THE observer"), "observer");
        assert_eq!(strip_leading_article("Theater"), "Theater");
    }

    #[test]
    fn noise_rules_drop_title_echo_and_banned_keywords() {
        assert!(is_noise_line("The   Strategy  Pattern", "strategy pattern", 0.6));
        assert!(is_noise_line("Copyright 2004 O'Reilly", "strategy", 0.6));
        assert!(is_noise_line("Download at WoweBook.com", "strategy", 0.6));
        assert!(is_noise_line("see page 12", "strategy", 0.6));
        assert!(!is_noise_line("Designing the menus", "strategy", 0.6));
    }

    #[test]
    fn noise_rules_drop_suspicious_and_letterless_lines() {
        assert!(is_noise_line("doSomething()", "strategy", 0.6));
        assert!(is_noise_line("http://example.com", "strategy", 0.6));
        assert!(is_noise_line("12 - 14", "strategy", 0.6));
        assert!(is_noise_line("   ", "strategy", 0.6));
    }

    #[test]
    fn noise_rules_drop_mostly_uppercase_lines() {
        assert!(is_noise_line("RUNNING HEADER TEXT", "strategy", 0.6));
        assert!(is_noise_line("MOSTLY CAPS here", "strategy", 0.6));
        assert!(!is_noise_line("Mixed Case Heading", "strategy", 0.6));
    }

    #[test]
    fn subtitle_match_collapses_whitespace_and_articles() {
        assert!(is_subtitle_match("The  Observer  Pattern", "4.2 observer pattern in depth"));
        assert!(is_subtitle_match("Decorator", "The Decorator pattern"));
        assert!(!is_subtitle_match("Decorator", "The Factory pattern"));
        assert!(!is_subtitle_match("   ", "anything"));
    }
}
