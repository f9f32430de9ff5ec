use std::fs;
use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::{StatusArgs, WorkPaths};
use crate::db;

pub fn run(args: StatusArgs) -> Result<()> {
    let paths = WorkPaths::for_work_dir(&args.work_dir);
    let db_path = args.db_path.unwrap_or(paths.db_path);

    info!(work_dir = %args.work_dir.display(), "status requested");

    report_artifact_dir("chapters", &paths.chapters_dir, "txt");
    report_artifact_dir("toc_slices", &paths.toc_dir, "txt");
    report_artifact_dir("sections", &paths.sections_dir, "json");

    if db_path.exists() {
        let connection = db::open(&db_path)?;
        let sections = db::query_count(&connection, "SELECT COUNT(*) FROM sections").unwrap_or(0);
        let books = db::query_count(
            &connection,
            "SELECT COUNT(DISTINCT book_title) FROM sections",
        )
        .unwrap_or(0);
        let chapters = db::query_count(
            &connection,
            "SELECT COUNT(DISTINCT book_title || '/' || chapter) FROM sections",
        )
        .unwrap_or(0);

        info!(
            path = %db_path.display(),
            books,
            chapters,
            sections,
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database missing");
    }

    Ok(())
}

fn report_artifact_dir(label: &str, dir: &Path, extension: &str) {
    if !dir.exists() {
        warn!(artifact = label, path = %dir.display(), "artifact directory missing");
        return;
    }

    let count = fs::read_dir(dir)
        .map(|entries| {
            entries
                .flatten()
                .filter(|entry| {
                    entry
                        .path()
                        .extension()
                        .and_then(|value| value.to_str())
                        .is_some_and(|value| value == extension)
                })
                .count()
        })
        .unwrap_or(0);

    info!(artifact = label, path = %dir.display(), files = count, "artifact directory");
}
