//! Line-level string utilities shared by the indexer, slicer, and matcher.
//!
//! Two normalization policies coexist on purpose: `normalize_key` reduces a
//! title to lowercase alphanumerics for substring containment against the
//! printed TOC, while `collapse_whitespace` keeps words separated for
//! body-line comparisons. They are not interchangeable; conflating them
//! changes matching results.

/// Lowercase, alphanumeric-only reduction used as the title comparison key.
pub fn normalize_key(input: &str) -> String {
    input
        .to_lowercase()
        .chars()
        .filter(|character| character.is_alphanumeric())
        .collect()
}

/// Applies `normalize_key` to every line, preserving positions.
pub fn normalize_lines(lines: &[String]) -> Vec<String> {
    lines.iter().map(|line| normalize_key(line)).collect()
}

/// Runs of whitespace become a single space, trimmed at both ends.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

/// True when the trimmed line is made up entirely of decimal digits or
/// roman-numeral characters (either case). Printed TOCs interleave folio
/// lines like `17` or `xii` with the entry titles; those carry no title text.
pub fn looks_like_page_number(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return false;
    }
    trimmed.chars().all(|character| {
        character.is_ascii_digit() || "ivxlcdm".contains(character.to_ascii_lowercase())
    })
}

/// Replaces every non-alphanumeric character with `_` for dump filenames.
pub fn slugify(input: &str) -> String {
    input
        .chars()
        .map(|character| {
            if character.is_alphanumeric() {
                character
            } else {
                '_'
            }
        })
        .collect()
}

/// Share of uppercase letters among all letters; 0 when there are none.
pub fn uppercase_ratio(input: &str) -> f64 {
    let mut letters = 0usize;
    let mut uppercase = 0usize;
    for character in input.chars() {
        if character.is_alphabetic() {
            letters += 1;
            if character.is_uppercase() {
                uppercase += 1;
            }
        }
    }
    if letters == 0 {
        0.0
    } else {
        uppercase as f64 / letters as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_key_drops_everything_but_alphanumerics() {
        assert_eq!(normalize_key("The Great Escape!"), "thegreatescape");
        assert_eq!(normalize_key("  Chapter 3: Décor  "), "chapter3décor");
        assert_eq!(normalize_key("---"), "");
    }

    #[test]
    fn collapse_whitespace_squeezes_runs_and_trims() {
        assert_eq!(collapse_whitespace("  a \t b\n\nc "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
        assert_eq!(collapse_whitespace(" \t "), "");
    }

    #[test]
    fn page_number_lines_cover_digits_and_roman_numerals() {
        assert!(looks_like_page_number("42"));
        assert!(looks_like_page_number("  xii "));
        assert!(looks_like_page_number("XIV"));
        assert!(looks_like_page_number("12iv"));
        assert!(!looks_like_page_number("12a"));
        assert!(!looks_like_page_number("Chapter 12"));
        assert!(!looks_like_page_number(""));
    }

    #[test]
    fn slugify_keeps_alphanumerics_only() {
        assert_eq!(slugify("Intro to Design: Patterns"), "Intro_to_Design__Patterns");
    }

    #[test]
    fn uppercase_ratio_ignores_non_letters() {
        assert_eq!(uppercase_ratio("ABCD"), 1.0);
        assert_eq!(uppercase_ratio("abcd"), 0.0);
        assert_eq!(uppercase_ratio("AbCd 123"), 0.5);
        assert_eq!(uppercase_ratio("123 ..."), 0.0);
    }
}
