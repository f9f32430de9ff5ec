use serde::{Deserialize, Serialize};

/// One entry from the PDF's embedded outline, page index 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub title: String,
    pub page_index: usize,
}

/// A chapter's 1-based page range, derived from adjacent outline entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterInfo {
    pub title: String,
    pub page_start: usize,
    pub page_end: usize,
    pub page_count: usize,
}

/// Computes chapter page ranges from outline entries sorted by page.
///
/// Chapter `i` ends one page before chapter `i + 1` starts; the last chapter
/// runs to the end of the document. A chapter is never shorter than one page
/// even when two entries share a start page.
pub fn compute_chapters(outline: &[OutlineEntry], total_pages: usize) -> Vec<ChapterInfo> {
    if outline.is_empty() {
        return Vec::new();
    }

    let mut sorted = outline.to_vec();
    sorted.sort_by_key(|entry| entry.page_index);

    let mut chapters = Vec::with_capacity(sorted.len());
    for (position, entry) in sorted.iter().enumerate() {
        let start = entry.page_index;
        let mut end = match sorted.get(position + 1) {
            Some(next) => next.page_index.saturating_sub(1),
            None => total_pages.saturating_sub(1),
        };
        if end < start {
            end = start;
        }

        chapters.push(ChapterInfo {
            title: entry.title.clone(),
            page_start: start + 1,
            page_end: end + 1,
            page_count: end - start + 1,
        });
    }
    chapters
}

/// An inclusive body-text line range inside one chapter. `toc_index` is the
/// index of the TOC-slice line that opened the section; `None` marks the
/// unmatched leading introduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub start_line: usize,
    pub end_line: usize,
    pub toc_index: Option<usize>,
}

/// One element of a chapter's sections JSON artifact. Field defaults mirror
/// the lenient reads on ingest: an artifact with missing fields still loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionRow {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub startline: usize,
    #[serde(default)]
    pub endline: usize,
    #[serde(default)]
    pub content: String,
}

/// Book title plus where it came from (PDF metadata key or filename).
#[derive(Debug, Clone)]
pub struct BookTitle {
    pub value: String,
    pub from_metadata: bool,
    pub source: String,
}

impl BookTitle {
    /// Provenance string stored with every record.
    pub fn provenance(&self) -> String {
        if self.from_metadata {
            format!("metadata:{}", self.source)
        } else {
            "filename".to_string()
        }
    }
}

/// One persisted section row; upsert-unique on `(book_title, chapter, title)`.
#[derive(Debug, Clone)]
pub struct SectionRecord {
    pub book_title: String,
    pub book_title_src: String,
    pub book_path: String,
    pub book_sha256: String,
    pub chapter_file: String,
    pub chapter: String,
    pub chapter_title: String,
    pub section_index: usize,
    pub title: String,
    pub startline: usize,
    pub endline: usize,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunCounts {
    pub total_pages: usize,
    pub chapters_extracted: usize,
    pub toc_slices_written: usize,
    pub section_files_written: usize,
    pub sections_total: usize,
    pub section_files_ingested: usize,
    pub records_changed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: String,
    pub pdf_path: String,
    pub pdf_sha256: String,
    pub work_dir: String,
    pub failed_step: Option<String>,
    pub failure_reason: Option<String>,
    pub counts: RunCounts,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, page_index: usize) -> OutlineEntry {
        OutlineEntry {
            title: title.to_string(),
            page_index,
        }
    }

    #[test]
    fn adjacent_entries_split_the_page_space() {
        let chapters = compute_chapters(&[entry("A", 0), entry("B", 5)], 10);
        assert_eq!(chapters.len(), 2);
        assert_eq!(
            (chapters[0].page_start, chapters[0].page_end, chapters[0].page_count),
            (1, 5, 5)
        );
        assert_eq!(
            (chapters[1].page_start, chapters[1].page_end, chapters[1].page_count),
            (6, 10, 5)
        );
    }

    #[test]
    fn single_entry_runs_to_the_last_page() {
        let chapters = compute_chapters(&[entry("Only", 3)], 12);
        assert_eq!(chapters.len(), 1);
        assert_eq!((chapters[0].page_start, chapters[0].page_end), (4, 12));
    }

    #[test]
    fn entries_are_sorted_by_page_before_ranging() {
        let chapters = compute_chapters(&[entry("B", 5), entry("A", 0)], 10);
        assert_eq!(chapters[0].title, "A");
        assert_eq!(chapters[1].title, "B");
    }

    #[test]
    fn shared_start_pages_never_go_negative() {
        let chapters = compute_chapters(&[entry("A", 4), entry("B", 4)], 10);
        assert_eq!(
            (chapters[0].page_start, chapters[0].page_end, chapters[0].page_count),
            (5, 5, 1)
        );
    }

    #[test]
    fn empty_outline_yields_no_chapters() {
        assert!(compute_chapters(&[], 10).is_empty());
    }
}
