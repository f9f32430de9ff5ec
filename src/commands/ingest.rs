use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rusqlite::Connection;
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::{IngestArgs, WorkPaths};
use crate::db;
use crate::model::{BookTitle, SectionRecord, SectionRow};
use crate::pdf;
use crate::title::extract_chapter_title;
use crate::util::sha256_file;

pub fn run(args: IngestArgs) -> Result<()> {
    let paths = WorkPaths::for_work_dir(&args.work_dir);
    let sections_dir = args.sections_dir.unwrap_or(paths.sections_dir);
    let db_path = args.db_path.unwrap_or(paths.db_path);

    let outcome = ingest(&sections_dir, &args.pdf, &db_path)?;
    info!(
        files = outcome.files,
        sections_seen = outcome.sections_seen,
        records_changed = outcome.records_changed,
        book_title = %outcome.book_title,
        "ingest completed"
    );
    Ok(())
}

pub(crate) struct IngestOutcome {
    pub files: usize,
    pub sections_seen: usize,
    pub records_changed: usize,
    pub book_title: String,
    pub warnings: Vec<String>,
}

/// Upserts every `<chapter stem>.json` artifact into the SQLite index.
///
/// Book provenance (title, source, sha256) is resolved once from the PDF. A
/// malformed artifact is reported and counts as zero; an empty directory is
/// an error.
pub(crate) fn ingest(sections_dir: &Path, pdf_path: &Path, db_path: &Path) -> Result<IngestOutcome> {
    let document = pdf::open_document(pdf_path)?;
    let book = pdf::book_title(&document, pdf_path);
    let book_sha256 = sha256_file(pdf_path)?;
    info!(book_title = %book.value, source = %book.provenance(), "resolved book title");

    let connection = db::open(db_path)?;

    let mut json_paths = Vec::new();
    let entries = fs::read_dir(sections_dir)
        .with_context(|| format!("failed to read {}", sections_dir.display()))?;
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read entry in {}", sections_dir.display()))?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|value| value.to_str()) == Some("json") {
            json_paths.push(path);
        }
    }
    json_paths.sort();

    if json_paths.is_empty() {
        bail!("no section JSON files found in {}", sections_dir.display());
    }

    let mut files = 0usize;
    let mut sections_seen = 0usize;
    let mut records_changed = 0usize;
    let mut warnings = Vec::new();

    for json_path in &json_paths {
        files += 1;
        let (changed, total) = match ingest_chapter_file(
            &connection,
            json_path,
            pdf_path,
            &book,
            &book_sha256,
        ) {
            Ok(counts) => counts,
            Err(error) => {
                warn!(path = %json_path.display(), error = %format!("{error:#}"), "artifact skipped");
                warnings.push(format!("{} skipped: {error:#}", json_path.display()));
                (0, 0)
            }
        };
        info!(
            path = %json_path.display(),
            changed,
            total,
            "upserted chapter sections"
        );
        sections_seen += total;
        records_changed += changed;
    }

    Ok(IngestOutcome {
        files,
        sections_seen,
        records_changed,
        book_title: book.value,
        warnings,
    })
}

fn ingest_chapter_file(
    connection: &Connection,
    json_path: &Path,
    pdf_path: &Path,
    book: &BookTitle,
    book_sha256: &str,
) -> Result<(usize, usize)> {
    let raw = fs::read(json_path)
        .with_context(|| format!("failed to read {}", json_path.display()))?;
    let value: Value = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", json_path.display()))?;

    if !value.is_array() {
        warn!(path = %json_path.display(), "sections JSON is not an array, skipping");
        return Ok((0, 0));
    }
    let rows: Vec<SectionRow> = serde_json::from_value(value)
        .with_context(|| format!("failed to decode section rows in {}", json_path.display()))?;

    let chapter_file = json_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();
    let chapter = json_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string();
    let chapter_title = extract_chapter_title(&chapter_file);

    let total = rows.len();
    let mut changed = 0usize;
    for (section_index, row) in rows.into_iter().enumerate() {
        let record = SectionRecord {
            book_title: book.value.clone(),
            book_title_src: book.provenance(),
            book_path: pdf_path.display().to_string(),
            book_sha256: book_sha256.to_string(),
            chapter_file: chapter_file.clone(),
            chapter: chapter.clone(),
            chapter_title: chapter_title.clone(),
            section_index,
            title: row.title,
            startline: row.startline,
            endline: row.endline,
            content: row.content,
        };
        if db::upsert_section(connection, &record)? {
            changed += 1;
        }
    }

    Ok((changed, total))
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use tempfile::TempDir;

    use super::*;
    use crate::db::{ensure_schema, query_count};

    fn memory_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        ensure_schema(&connection).unwrap();
        connection
    }

    fn sample_book() -> BookTitle {
        BookTitle {
            value: "Sample Book".to_string(),
            from_metadata: false,
            source: "filename".to_string(),
        }
    }

    fn row_count(connection: &Connection) -> i64 {
        query_count(connection, "SELECT COUNT(*) FROM sections").unwrap()
    }

    #[test]
    fn non_array_artifact_counts_zero_and_inserts_nothing() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("01_Strategy.json");
        fs::write(&json_path, "{\"title\": \"introduction\"}").unwrap();

        let connection = memory_connection();
        let counts = ingest_chapter_file(
            &connection,
            &json_path,
            Path::new("/books/sample.pdf"),
            &sample_book(),
            "abc123",
        )
        .unwrap();
        assert_eq!(counts, (0, 0));
        assert_eq!(row_count(&connection), 0);
    }

    #[test]
    fn unparseable_artifact_is_an_error_with_no_rows() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("01_Strategy.json");
        fs::write(&json_path, "not json at all").unwrap();

        let connection = memory_connection();
        let result = ingest_chapter_file(
            &connection,
            &json_path,
            Path::new("/books/sample.pdf"),
            &sample_book(),
            "abc123",
        );
        assert!(result.is_err());
        assert_eq!(row_count(&connection), 0);
    }

    #[test]
    fn array_artifact_upserts_one_record_per_row() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("02_The_Observer.json");
        fs::write(
            &json_path,
            r#"[
              {"title": "introduction", "startline": 0, "endline": 4, "content": "intro"},
              {"title": "subsection1", "startline": 5, "endline": 9, "content": "body"}
            ]"#,
        )
        .unwrap();

        let connection = memory_connection();
        let counts = ingest_chapter_file(
            &connection,
            &json_path,
            Path::new("/books/sample.pdf"),
            &sample_book(),
            "abc123",
        )
        .unwrap();
        assert_eq!(counts, (2, 2));
        assert_eq!(row_count(&connection), 2);

        let chapter_title: String = connection
            .query_row(
                "SELECT chapter_title FROM sections WHERE title='subsection1'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(chapter_title, "observer");
    }
}
