//! SQLite persistence for section records, upsert-keyed by
//! `(book_title, chapter, title)`.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::model::SectionRecord;
use crate::util::now_utc_string;

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

pub fn open(db_path: &Path) -> Result<Connection> {
    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;
    Ok(connection)
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sections (
              book_title TEXT NOT NULL,
              chapter TEXT NOT NULL,
              title TEXT NOT NULL,
              book_title_src TEXT NOT NULL,
              book_path TEXT NOT NULL,
              book_sha256 TEXT NOT NULL,
              chapter_file TEXT NOT NULL,
              chapter_title TEXT NOT NULL,
              section_index INTEGER NOT NULL,
              startline INTEGER NOT NULL,
              endline INTEGER NOT NULL,
              content TEXT NOT NULL,
              updated_at TEXT NOT NULL,
              PRIMARY KEY(book_title, chapter, title)
            );

            CREATE INDEX IF NOT EXISTS idx_sections_book_chapter
              ON sections(book_title, chapter);
            ",
        )
        .context("failed to create schema")?;

    record_schema_metadata(connection)?;
    Ok(())
}

fn record_schema_metadata(connection: &Connection) -> Result<()> {
    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;
    Ok(())
}

/// Upserts one record; returns whether the stored row actually changed.
pub fn upsert_section(connection: &Connection, record: &SectionRecord) -> Result<bool> {
    let changed = connection
        .execute(
            "INSERT INTO sections(
               book_title, chapter, title,
               book_title_src, book_path, book_sha256,
               chapter_file, chapter_title, section_index,
               startline, endline, content, updated_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(book_title, chapter, title) DO UPDATE SET
               book_title_src=excluded.book_title_src,
               book_path=excluded.book_path,
               book_sha256=excluded.book_sha256,
               chapter_file=excluded.chapter_file,
               chapter_title=excluded.chapter_title,
               section_index=excluded.section_index,
               startline=excluded.startline,
               endline=excluded.endline,
               content=excluded.content,
               updated_at=excluded.updated_at
             WHERE sections.content != excluded.content
                OR sections.startline != excluded.startline
                OR sections.endline != excluded.endline
                OR sections.section_index != excluded.section_index
                OR sections.book_sha256 != excluded.book_sha256",
            params![
                record.book_title,
                record.chapter,
                record.title,
                record.book_title_src,
                record.book_path,
                record.book_sha256,
                record.chapter_file,
                record.chapter_title,
                record.section_index as i64,
                record.startline as i64,
                record.endline as i64,
                record.content,
                now_utc_string(),
            ],
        )
        .context("failed to upsert section record")?;

    Ok(changed > 0)
}

pub fn query_count(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection
        .query_row(sql, [], |row| row.get::<_, i64>(0))
        .with_context(|| format!("failed to run count query: {sql}"))?;
    Ok(count)
}
