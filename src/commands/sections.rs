use std::path::Path;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::catalog;
use crate::cli::{SectionsArgs, WorkPaths};
use crate::matcher::match_indices;
use crate::model::{Section, SectionRow};
use crate::segmenter::build_sections;
use crate::title::extract_chapter_title;
use crate::util::{ensure_directory, read_lines, write_json_pretty};

pub fn run(args: SectionsArgs) -> Result<()> {
    let paths = WorkPaths::for_work_dir(&args.work_dir);
    let chapters_dir = args.chapters_dir.unwrap_or(paths.chapters_dir);
    let toc_dir = args.toc_dir.unwrap_or(paths.toc_dir);
    let sections_dir = args.sections_dir.unwrap_or(paths.sections_dir);

    let outcome = build(
        &chapters_dir,
        &toc_dir,
        &sections_dir,
        args.min_gap,
        args.uppercase_ratio,
    )?;
    info!(
        files_written = outcome.files_written,
        sections_total = outcome.sections_total,
        chapters_skipped = outcome.chapters_skipped,
        "sections completed"
    );
    Ok(())
}

pub(crate) struct SectionsOutcome {
    pub files_written: usize,
    pub sections_total: usize,
    pub chapters_skipped: usize,
    pub warnings: Vec<String>,
}

/// Aligns each chapter's TOC slice against its body text and writes the
/// per-chapter section rows as pretty-printed JSON.
///
/// A chapter without a TOC slice is reported and skipped; a failing read or
/// write skips that one chapter too. The command fails only when no chapter
/// produced an artifact.
pub(crate) fn build(
    chapters_dir: &Path,
    toc_dir: &Path,
    sections_dir: &Path,
    min_gap: usize,
    uppercase_threshold: f64,
) -> Result<SectionsOutcome> {
    let chapters = catalog::collect_chapters(chapters_dir)?;
    if chapters.is_empty() {
        bail!("no chapter text files found in {}", chapters_dir.display());
    }

    let lookup = catalog::toc_lookup(toc_dir)?;
    ensure_directory(sections_dir)?;

    let mut files_written = 0usize;
    let mut sections_total = 0usize;
    let mut chapters_skipped = 0usize;
    let mut warnings = Vec::new();

    for chapter in &chapters {
        let file_name = chapter
            .file
            .file_name()
            .and_then(|value| value.to_str())
            .unwrap_or_default();
        let chapter_title = extract_chapter_title(file_name);

        let Some(toc_path) = lookup.get(&chapter_title).and_then(|paths| paths.first()) else {
            warn!(chapter = %chapter_title, "no TOC slice found for chapter");
            chapters_skipped += 1;
            continue;
        };

        let loaded = read_lines(toc_path).and_then(|toc_lines| {
            let body_lines = read_lines(&chapter.file)?;
            Ok((toc_lines, body_lines))
        });
        let (toc_lines, body_lines) = match loaded {
            Ok(pair) => pair,
            Err(error) => {
                warn!(chapter = %chapter_title, error = %format!("{error:#}"), "skipping chapter");
                warnings.push(format!("chapter '{chapter_title}' skipped: {error:#}"));
                chapters_skipped += 1;
                continue;
            }
        };
        if body_lines.is_empty() {
            warn!(chapter = %chapter_title, "chapter body is empty");
            chapters_skipped += 1;
            continue;
        }

        let matches = match_indices(&toc_lines, &body_lines, &chapter_title, uppercase_threshold);
        let sections = build_sections(&matches, body_lines.len(), min_gap);
        let rows = make_rows(&sections, &body_lines);

        let stem = chapter
            .file
            .file_stem()
            .and_then(|value| value.to_str())
            .unwrap_or(&chapter.key);
        let out_path = sections_dir.join(format!("{stem}.json"));

        match write_json_pretty(&out_path, &rows) {
            Ok(()) => {
                info!(segments = rows.len(), path = %out_path.display(), "wrote section rows");
                sections_total += rows.len();
                files_written += 1;
            }
            Err(error) => {
                warn!(chapter = %chapter_title, error = %format!("{error:#}"), "section rows not written");
                warnings.push(format!("chapter '{chapter_title}' not written: {error:#}"));
                chapters_skipped += 1;
            }
        }
    }

    if files_written == 0 {
        bail!("no section artifacts could be written to {}", sections_dir.display());
    }

    Ok(SectionsOutcome {
        files_written,
        sections_total,
        chapters_skipped,
        warnings,
    })
}

/// Converts sections into serializable rows. The introduction keeps its
/// fixed name; matched sections are numbered `subsection1..N` per chapter.
pub(crate) fn make_rows(sections: &[Section], lines: &[String]) -> Vec<SectionRow> {
    let mut rows = Vec::with_capacity(sections.len());
    let mut subsection_number = 1usize;

    for section in sections {
        let title = match section.toc_index {
            None => "introduction".to_string(),
            Some(_) => {
                let numbered = format!("subsection{subsection_number}");
                subsection_number += 1;
                numbered
            }
        };

        let content = lines[section.start_line..=section.end_line].join("\n");
        rows.push(SectionRow {
            title,
            startline: section.start_line,
            endline: section.end_line,
            content: content.trim().to_string(),
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    fn section(start_line: usize, end_line: usize, toc_index: Option<usize>) -> Section {
        Section {
            start_line,
            end_line,
            toc_index,
        }
    }

    #[test]
    fn rows_number_subsections_and_trim_content() {
        let body = lines(&["", "intro line", "First Topic", "text", "Second Topic", "more"]);
        let sections = vec![
            section(0, 1, None),
            section(2, 3, Some(0)),
            section(4, 5, Some(2)),
        ];

        let rows = make_rows(&sections, &body);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].title, "introduction");
        assert_eq!(rows[0].content, "intro line");
        assert_eq!(rows[1].title, "subsection1");
        assert_eq!((rows[1].startline, rows[1].endline), (2, 3));
        assert_eq!(rows[2].title, "subsection2");
        assert_eq!(rows[2].content, "Second Topic\nmore");
    }

    #[test]
    fn whole_chapter_without_matches_is_one_introduction_row() {
        let body = lines(&["a", "b", "c"]);
        let rows = make_rows(&[section(0, 2, None)], &body);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "introduction");
        assert_eq!((rows[0].startline, rows[0].endline), (0, 2));
    }

    #[test]
    fn chapters_without_slices_are_skipped_not_fatal() {
        let work = TempDir::new().unwrap();
        let chapters_dir = work.path().join("chapters");
        let toc_dir = work.path().join("toc_sections");
        let sections_dir = work.path().join("sections");
        fs::create_dir_all(&chapters_dir).unwrap();
        fs::create_dir_all(&toc_dir).unwrap();

        fs::write(
            chapters_dir.join("01_Strategy.txt"),
            "intro text\nmore intro\nDucks in flight\nduck body text\n",
        )
        .unwrap();
        fs::write(chapters_dir.join("02_Observer.txt"), "body\n").unwrap();
        fs::write(toc_dir.join("01_Strategy.txt"), "Ducks in flight\n").unwrap();

        let outcome = build(&chapters_dir, &toc_dir, &sections_dir, 1, 0.6).unwrap();
        assert_eq!(outcome.files_written, 1);
        assert_eq!(outcome.chapters_skipped, 1);

        let raw = fs::read_to_string(sections_dir.join("01_Strategy.json")).unwrap();
        let rows: Vec<SectionRow> = serde_json::from_str(&raw).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "introduction");
        assert_eq!((rows[0].startline, rows[0].endline), (0, 1));
        assert_eq!(rows[1].title, "subsection1");
        assert_eq!((rows[1].startline, rows[1].endline), (2, 3));
    }
}
