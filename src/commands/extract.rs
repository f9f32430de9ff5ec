use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::{ExtractArgs, WorkPaths};
use crate::model::{ChapterInfo, compute_chapters};
use crate::pdf;
use crate::text::slugify;
use crate::util::ensure_directory;

pub fn run(args: ExtractArgs) -> Result<()> {
    let paths = WorkPaths::for_work_dir(&args.work_dir);
    let chapters_dir = args.chapters_dir.unwrap_or(paths.chapters_dir);

    let outcome = extract(&args.pdf, &chapters_dir, args.all_outline_levels)?;
    info!(
        total_pages = outcome.total_pages,
        chapters = outcome.chapters.len(),
        written = outcome.written,
        "extract completed"
    );
    Ok(())
}

pub(crate) struct ExtractOutcome {
    pub total_pages: usize,
    pub chapters: Vec<ChapterInfo>,
    pub written: usize,
    pub warnings: Vec<String>,
}

/// Reads the outline, computes chapter page ranges, and dumps one
/// `<index>_<slug>.txt` per chapter. A chapter whose pages cannot be
/// extracted is skipped with a warning; the command fails only when nothing
/// at all could be written.
pub(crate) fn extract(
    pdf_path: &Path,
    chapters_dir: &Path,
    all_outline_levels: bool,
) -> Result<ExtractOutcome> {
    let document = pdf::open_document(pdf_path)?;
    let total_pages = pdf::page_count(&document);

    let outline = pdf::read_outline(&document, !all_outline_levels);
    if outline.is_empty() {
        bail!("no outline found in {}", pdf_path.display());
    }

    let chapters = compute_chapters(&outline, total_pages);
    for chapter in &chapters {
        info!(
            title = %chapter.title,
            page_start = chapter.page_start,
            page_end = chapter.page_end,
            page_count = chapter.page_count,
            "outline chapter"
        );
    }

    ensure_directory(chapters_dir)?;

    let mut written = 0usize;
    let mut warnings = Vec::new();
    for (position, chapter) in chapters.iter().enumerate() {
        let file_name = format!("{:02}_{}.txt", position + 1, slugify(&chapter.title));
        let out_path = chapters_dir.join(&file_name);

        let result = pdf::chapter_page_text(pdf_path, chapter).and_then(|body| {
            fs::write(&out_path, &body)
                .with_context(|| format!("failed to write {}", out_path.display()))
        });

        match result {
            Ok(()) => {
                info!(path = %out_path.display(), "saved chapter text");
                written += 1;
            }
            Err(error) => {
                warn!(chapter = %chapter.title, error = %format!("{error:#}"), "skipping chapter");
                warnings.push(format!("chapter '{}' skipped: {error:#}", chapter.title));
            }
        }
    }

    if written == 0 {
        bail!("no chapter text could be extracted from {}", pdf_path.display());
    }

    Ok(ExtractOutcome {
        total_pages,
        chapters,
        written,
        warnings,
    })
}
