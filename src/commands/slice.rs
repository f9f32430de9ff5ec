use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::catalog;
use crate::cli::{SliceArgs, WorkPaths};
use crate::indexer::index_chapters;
use crate::text::{looks_like_page_number, normalize_lines};
use crate::util::{ensure_directory, read_lines};

pub fn run(args: SliceArgs) -> Result<()> {
    let paths = WorkPaths::for_work_dir(&args.work_dir);
    let chapters_dir = args.chapters_dir.unwrap_or(paths.chapters_dir);
    let toc_dir = args.toc_dir.unwrap_or(paths.toc_dir);

    let outcome = slice(&chapters_dir, &toc_dir, args.min_slice_lines)?;
    info!(
        chapters = outcome.chapters_seen,
        slices_written = outcome.slices_written,
        "slice completed"
    );
    Ok(())
}

pub(crate) struct SliceOutcome {
    pub chapters_seen: usize,
    pub slices_written: usize,
    pub warnings: Vec<String>,
}

/// Cuts the printed-TOC dump into one slice per chapter.
///
/// Chapter positions come from the monotonic indexer over the normalized TOC
/// lines. An unresolved, out-of-order, or too-small pair is a structural
/// mismatch: the slice is silently skipped and the batch continues. The last
/// catalog entry never gets a slice since it has no successor position.
pub(crate) fn slice(
    chapters_dir: &Path,
    toc_dir: &Path,
    min_slice_lines: usize,
) -> Result<SliceOutcome> {
    let chapters = catalog::collect_chapters(chapters_dir)?;
    if chapters.is_empty() {
        bail!("no chapter text files found in {}", chapters_dir.display());
    }

    let Some(toc_path) = catalog::find_toc_file(chapters_dir)? else {
        bail!("no TOC-labeled file found in {}", chapters_dir.display());
    };
    info!(path = %toc_path.display(), "using printed TOC dump");

    let toc_lines: Vec<String> = read_lines(&toc_path)?
        .iter()
        .map(|line| line.trim().to_string())
        .collect();
    if toc_lines.is_empty() {
        bail!("printed TOC dump is empty: {}", toc_path.display());
    }

    let toc_keys = normalize_lines(&toc_lines);
    let chapter_keys: Vec<String> = chapters.iter().map(|chapter| chapter.key.clone()).collect();
    let positions = index_chapters(&toc_keys, &chapter_keys);

    ensure_directory(toc_dir)?;

    let mut slices_written = 0usize;
    let mut warnings = Vec::new();
    for index in 0..chapters.len().saturating_sub(1) {
        let key = &chapters[index].key;
        let (Some(start), Some(end)) = (positions[index], positions[index + 1]) else {
            debug!(chapter = %key, "chapter position unresolved in TOC");
            continue;
        };
        if end <= start || end - start < min_slice_lines {
            debug!(chapter = %key, start, end, "TOC slice too small or out of order");
            continue;
        }

        let stem = chapters[index]
            .file
            .file_stem()
            .and_then(|value| value.to_str())
            .unwrap_or(key);
        let out_path = toc_dir.join(format!("{stem}.txt"));
        let body = slice_lines(&toc_lines, start, end);

        match fs::write(&out_path, body.join("\n") + "\n")
            .with_context(|| format!("failed to write {}", out_path.display()))
        {
            Ok(()) => {
                info!(
                    lines = body.len(),
                    slice_start = start,
                    slice_end = end - 1,
                    path = %out_path.display(),
                    "wrote toc slice"
                );
                slices_written += 1;
            }
            Err(error) => {
                warn!(error = %format!("{error:#}"), "toc slice not written");
                warnings.push(format!("slice for '{key}' skipped: {error:#}"));
            }
        }
    }

    Ok(SliceOutcome {
        chapters_seen: chapters.len(),
        slices_written,
        warnings,
    })
}

/// Lines `[start, end)` of the raw TOC, minus empties and folio lines.
fn slice_lines(toc_lines: &[String], start: usize, end: usize) -> Vec<String> {
    toc_lines[start..end]
        .iter()
        .filter(|line| !line.is_empty() && !looks_like_page_number(line))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn slice_lines_drops_empties_and_folios() {
        let toc = lines(&["Strategy basics", "", "12", "xii", "Ducks revisited"]);
        assert_eq!(
            slice_lines(&toc, 0, 5),
            lines(&["Strategy basics", "Ducks revisited"])
        );
    }

    #[test]
    fn slices_are_cut_between_resolved_chapter_positions() {
        let work = TempDir::new().unwrap();
        let chapters_dir = work.path().join("chapters");
        let toc_dir = work.path().join("toc_sections");
        fs::create_dir_all(&chapters_dir).unwrap();

        fs::write(
            chapters_dir.join("00_Table_of_Contents.txt"),
            "Intro to Strategy\nfirst topic\nsecond topic\n42\nthird topic\nThe Observer\nlater topic\n",
        )
        .unwrap();
        fs::write(chapters_dir.join("01_Intro_to_Strategy.txt"), "body\n").unwrap();
        fs::write(chapters_dir.join("02_The_Observer.txt"), "body\n").unwrap();

        let outcome = slice(&chapters_dir, &toc_dir, 3).unwrap();
        assert_eq!(outcome.slices_written, 1);

        let written = fs::read_to_string(toc_dir.join("01_Intro_to_Strategy.txt")).unwrap();
        assert_eq!(
            written,
            "Intro to Strategy\nfirst topic\nsecond topic\nthird topic\n"
        );
    }

    #[test]
    fn too_small_gaps_produce_no_slice() {
        let work = TempDir::new().unwrap();
        let chapters_dir = work.path().join("chapters");
        let toc_dir = work.path().join("toc_sections");
        fs::create_dir_all(&chapters_dir).unwrap();

        fs::write(
            chapters_dir.join("00_Table_of_Contents.txt"),
            "Alpha\nBeta\n",
        )
        .unwrap();
        fs::write(chapters_dir.join("01_Alpha.txt"), "body\n").unwrap();
        fs::write(chapters_dir.join("02_Beta.txt"), "body\n").unwrap();

        let outcome = slice(&chapters_dir, &toc_dir, 5).unwrap();
        assert_eq!(outcome.slices_written, 0);
    }

    #[test]
    fn missing_toc_dump_is_an_error() {
        let work = TempDir::new().unwrap();
        let chapters_dir = work.path().join("chapters");
        fs::create_dir_all(&chapters_dir).unwrap();
        fs::write(chapters_dir.join("01_Alpha.txt"), "body\n").unwrap();

        let result = slice(&chapters_dir, &work.path().join("toc"), 5);
        assert!(result.is_err());
    }
}
