//! Catalogs chapter text dumps and their TOC-slice counterparts on disk.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::text::normalize_key;
use crate::title::{extract_chapter_title, is_toc_label};

/// Pairs one extracted chapter-text file with its normalized title key.
#[derive(Debug, Clone)]
pub struct ChapterMatch {
    pub file: PathBuf,
    pub key: String,
}

/// Collects chapter `.txt` dumps in document order.
///
/// The indexer needs chapters in document order, so the sort key is the
/// numeric `<digits>_` filename prefix written by the extractor, with the
/// filename as a tie-break. Plain alphabetical order would only work for
/// zero-padded prefixes.
pub fn collect_chapters(chapters_dir: &Path) -> Result<Vec<ChapterMatch>> {
    let mut chapters = Vec::new();
    if !chapters_dir.exists() {
        return Ok(chapters);
    }

    let entries = fs::read_dir(chapters_dir)
        .with_context(|| format!("failed to read {}", chapters_dir.display()))?;

    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read entry in {}", chapters_dir.display()))?;
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|value| value.to_str()) != Some("txt") {
            continue;
        }

        let Some(file_name) = path.file_name().and_then(|value| value.to_str()) else {
            continue;
        };
        if is_toc_label(file_name) {
            continue;
        }

        let key = normalize_key(&extract_chapter_title(file_name));
        chapters.push(ChapterMatch { file: path, key });
    }

    chapters.sort_by(|a, b| order_key(&a.file).cmp(&order_key(&b.file)));
    Ok(chapters)
}

fn order_key(path: &Path) -> (u64, String) {
    let name = path
        .file_name()
        .and_then(|value| value.to_str())
        .unwrap_or_default()
        .to_string();

    let index = name
        .split_once('_')
        .and_then(|(prefix, _)| prefix.parse::<u64>().ok())
        .unwrap_or(u64::MAX);

    (index, name)
}

/// Finds the chapter dump holding the printed table of contents, if any.
pub fn find_toc_file(chapters_dir: &Path) -> Result<Option<PathBuf>> {
    let entries = fs::read_dir(chapters_dir)
        .with_context(|| format!("failed to read {}", chapters_dir.display()))?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read entry in {}", chapters_dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|value| value.to_str()) else {
            continue;
        };
        if is_toc_label(file_name) {
            candidates.push(path);
        }
    }

    candidates.sort();
    Ok(candidates.into_iter().next())
}

/// Maps extracted chapter titles to the TOC-slice files carrying their
/// subsection lines. Several slices per title are possible; callers take the
/// first.
pub fn toc_lookup(toc_dir: &Path) -> Result<HashMap<String, Vec<PathBuf>>> {
    let mut lookup: HashMap<String, Vec<PathBuf>> = HashMap::new();
    if !toc_dir.exists() {
        return Ok(lookup);
    }

    let entries =
        fs::read_dir(toc_dir).with_context(|| format!("failed to read {}", toc_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", toc_dir.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|value| value.to_str()) else {
            continue;
        };
        if is_toc_label(file_name) {
            continue;
        }

        let title = extract_chapter_title(file_name);
        if is_toc_label(&title) {
            continue;
        }

        lookup.entry(title).or_default().push(path);
    }

    for paths in lookup.values_mut() {
        paths.sort();
    }
    Ok(lookup)
}
