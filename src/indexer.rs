//! Locates each chapter's first line inside the normalized printed TOC.
//!
//! Chapter titles appear in the printed TOC in document order, so the search
//! cursor only moves forward. That stops a chapter whose title is a substring
//! of a later chapter's title from re-matching an earlier line. Callers must
//! supply chapter keys in document order; the catalog's numeric-prefix sort
//! guarantees that for dump filenames.

/// Returns, per chapter key, the index of the first TOC line at or after the
/// cursor that contains the key as a substring.
///
/// A miss is retried once with the leading article stripped from the key. A
/// definitive miss records `None` and leaves the cursor where it was, so the
/// next key searches from the same position.
pub fn index_chapters(toc_keys: &[String], chapter_keys: &[String]) -> Vec<Option<usize>> {
    let mut positions = Vec::with_capacity(chapter_keys.len());
    let mut cursor = 0usize;

    for key in chapter_keys {
        let mut found = find_first_toc_match(toc_keys, key, cursor);

        if found.is_none() {
            let stripped = strip_leading_the_key(key);
            if stripped.len() != key.len() {
                found = find_first_toc_match(toc_keys, stripped, cursor);
            }
        }

        if let Some(position) = found {
            cursor = position + 1;
        }
        positions.push(found);
    }
    positions
}

fn find_first_toc_match(toc_keys: &[String], key: &str, start_at: usize) -> Option<usize> {
    if key.is_empty() {
        return None;
    }
    toc_keys
        .iter()
        .enumerate()
        .skip(start_at)
        .find(|(_, line)| !line.is_empty() && line.contains(key))
        .map(|(index, _)| index)
}

// Keys are already normalized (lowercase, no spaces), so the article prefix
// is a bare "the".
fn strip_leading_the_key(key: &str) -> &str {
    key.strip_prefix("the").unwrap_or(key)
}
