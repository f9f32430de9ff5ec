//! Document-access boundary: outline and metadata come from `lopdf`, page
//! text comes from the external `pdftotext` binary. Everything downstream of
//! this module works on plain strings and page ranges.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::warn;

use crate::model::{BookTitle, ChapterInfo, OutlineEntry};
use crate::text::collapse_whitespace;

pub fn open_document(path: &Path) -> Result<Document> {
    let document =
        Document::load(path).with_context(|| format!("failed to open PDF {}", path.display()))?;
    if document.is_encrypted() {
        bail!("PDF is password-protected: {}", path.display());
    }
    Ok(document)
}

pub fn page_count(document: &Document) -> usize {
    document.get_pages().len()
}

/// Reads the outline tree into a flat, document-ordered entry list.
///
/// With `top_level_only` (the default for chapter ranges) only depth-0 nodes
/// are kept; deeper nodes are still visited so ordering stays intact for the
/// all-levels mode. Entries whose destination cannot be resolved to a page
/// are dropped.
pub fn read_outline(document: &Document, top_level_only: bool) -> Vec<OutlineEntry> {
    let Ok(catalog) = document.catalog() else {
        return Vec::new();
    };
    let Ok(outlines_id) = catalog.get(b"Outlines").and_then(Object::as_reference) else {
        return Vec::new();
    };
    let Ok(outlines) = document.get_dictionary(outlines_id) else {
        return Vec::new();
    };
    let Ok(first) = outlines.get(b"First").and_then(Object::as_reference) else {
        return Vec::new();
    };

    let page_indexes = page_index_by_object(document);
    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    collect_outline_nodes(
        document,
        first,
        &page_indexes,
        top_level_only,
        0,
        &mut visited,
        &mut entries,
    );
    entries
}

fn page_index_by_object(document: &Document) -> HashMap<ObjectId, usize> {
    document
        .get_pages()
        .into_iter()
        .map(|(page_number, object_id)| (object_id, page_number.saturating_sub(1) as usize))
        .collect()
}

fn collect_outline_nodes(
    document: &Document,
    first: ObjectId,
    page_indexes: &HashMap<ObjectId, usize>,
    top_level_only: bool,
    depth: usize,
    visited: &mut HashSet<ObjectId>,
    entries: &mut Vec<OutlineEntry>,
) {
    let mut node_id = Some(first);

    while let Some(id) = node_id {
        // Malformed files can loop their sibling or child chains; the
        // visited set is shared across the whole walk so a node is never
        // entered twice at any level.
        if !visited.insert(id) {
            break;
        }
        let Ok(node) = document.get_dictionary(id) else {
            break;
        };

        if !top_level_only || depth == 0 {
            let title = node
                .get(b"Title")
                .ok()
                .and_then(string_bytes)
                .map(decode_pdf_string)
                .map(|value| value.trim().to_string())
                .unwrap_or_default();

            if !title.is_empty() {
                if let Some(page_index) = destination_page_index(document, node, page_indexes) {
                    entries.push(OutlineEntry { title, page_index });
                }
            }
        }

        if let Ok(child) = node.get(b"First").and_then(Object::as_reference) {
            collect_outline_nodes(
                document,
                child,
                page_indexes,
                top_level_only,
                depth + 1,
                visited,
                entries,
            );
        }

        node_id = node.get(b"Next").and_then(Object::as_reference).ok();
    }
}

/// Resolves a node's target page via its `Dest` entry or a `GoTo` action.
/// Named destinations are not chased; such entries are dropped upstream.
fn destination_page_index(
    document: &Document,
    node: &Dictionary,
    page_indexes: &HashMap<ObjectId, usize>,
) -> Option<usize> {
    let destination = match node.get(b"Dest") {
        Ok(object) => object.clone(),
        Err(_) => action_destination(document, node)?,
    };

    let resolved = match destination {
        Object::Reference(id) => document.get_object(id).ok()?.clone(),
        other => other,
    };

    let Object::Array(items) = resolved else {
        return None;
    };
    let page_object = items.first()?.as_reference().ok()?;
    page_indexes.get(&page_object).copied()
}

fn action_destination(document: &Document, node: &Dictionary) -> Option<Object> {
    let action = node.get(b"A").ok()?;
    let dictionary = match action {
        Object::Reference(id) => document.get_dictionary(*id).ok()?,
        Object::Dictionary(dictionary) => dictionary,
        _ => return None,
    };
    dictionary.get(b"D").ok().cloned()
}

/// Outline title strings are UTF-16BE with a BOM or PDFDocEncoding.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let code_units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&code_units)
    } else {
        bytes.iter().map(|&byte| pdf_doc_char(byte)).collect()
    }
}

/// PDFDocEncoding tracks Latin-1 except in 0x18-0x1F (accents) and
/// 0x80-0x9F (typographic punctuation, ligatures), which outline titles
/// use for bullets, dashes, and curly quotes.
fn pdf_doc_char(byte: u8) -> char {
    match byte {
        0x18 => '\u{02D8}',
        0x19 => '\u{02C7}',
        0x1A => '\u{02C6}',
        0x1B => '\u{02D9}',
        0x1C => '\u{02DD}',
        0x1D => '\u{02DB}',
        0x1E => '\u{02DA}',
        0x1F => '\u{02DC}',
        0x80 => '\u{2022}',
        0x81 => '\u{2020}',
        0x82 => '\u{2021}',
        0x83 => '\u{2026}',
        0x84 => '\u{2014}',
        0x85 => '\u{2013}',
        0x86 => '\u{0192}',
        0x87 => '\u{2044}',
        0x88 => '\u{2039}',
        0x89 => '\u{203A}',
        0x8A => '\u{2212}',
        0x8B => '\u{2030}',
        0x8C => '\u{201E}',
        0x8D => '\u{201C}',
        0x8E => '\u{201D}',
        0x8F => '\u{2018}',
        0x90 => '\u{2019}',
        0x91 => '\u{201A}',
        0x92 => '\u{2122}',
        0x93 => '\u{FB01}',
        0x94 => '\u{FB02}',
        0x95 => '\u{0141}',
        0x96 => '\u{0152}',
        0x97 => '\u{0160}',
        0x98 => '\u{0178}',
        0x99 => '\u{017D}',
        0x9A => '\u{0131}',
        0x9B => '\u{0142}',
        0x9C => '\u{0153}',
        0x9D => '\u{0161}',
        0x9E => '\u{017E}',
        // 0x9F is unassigned in PDFDocEncoding.
        0x9F => '\u{FFFD}',
        other => other as char,
    }
}

fn document_info_title(document: &Document) -> Option<String> {
    let info = document.trailer.get(b"Info").ok()?;
    let dictionary = match info {
        Object::Reference(id) => document.get_dictionary(*id).ok()?,
        Object::Dictionary(dictionary) => dictionary,
        _ => return None,
    };

    let bytes = dictionary.get(b"Title").ok().and_then(string_bytes)?;
    let title = collapse_whitespace(&decode_pdf_string(bytes));
    if title.is_empty() { None } else { Some(title) }
}

fn string_bytes(object: &Object) -> Option<&[u8]> {
    match object {
        Object::String(bytes, _) => Some(bytes.as_slice()),
        _ => None,
    }
}

/// Infers the book title from PDF metadata, falling back to the filename.
///
/// Metadata titles are often junk (tool artifacts, bare ids); the validity
/// rules reject those and the filename stem takes over, separators turned
/// into spaces and title-cased.
pub fn book_title(document: &Document, pdf_path: &Path) -> BookTitle {
    if let Some(title) = document_info_title(document) {
        if !title_looks_invalid(&title) {
            return BookTitle {
                value: title,
                from_metadata: true,
                source: "Title".to_string(),
            };
        }
        warn!(title = %title, "PDF metadata title looks invalid, falling back to filename");
    }

    let stem = pdf_path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("book");
    let spaced: String = stem
        .chars()
        .map(|character| {
            if matches!(character, '_' | '-' | '.') {
                ' '
            } else {
                character
            }
        })
        .collect();

    BookTitle {
        value: title_case(&collapse_whitespace(&spaced)),
        from_metadata: false,
        source: "filename".to_string(),
    }
}

fn title_looks_invalid(title: &str) -> bool {
    if title.is_empty() {
        return true;
    }

    let lowered = title.to_lowercase();
    if lowered == "untitled" || lowered == "unknown" || lowered == "null" {
        return true;
    }

    let has_space = title.contains(' ');
    let mut digits = 0usize;
    let mut alphanumerics = 0usize;
    for character in title.chars() {
        if character.is_alphanumeric() {
            alphanumerics += 1;
            if character.is_ascii_digit() {
                digits += 1;
            }
        }
    }

    if !has_space && alphanumerics > 0 && digits as f64 / alphanumerics as f64 >= 0.7 {
        return true;
    }

    !has_space && title.chars().count() <= 6
}

fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut new_word = true;
    for character in input.chars() {
        if character.is_whitespace() {
            new_word = true;
            out.push(character);
        } else if new_word {
            out.extend(character.to_uppercase());
            new_word = false;
        } else {
            out.extend(character.to_lowercase());
        }
    }
    out
}

/// Extracts one chapter's text via `pdftotext` over its page range; pages are
/// joined with newlines.
pub fn chapter_page_text(pdf_path: &Path, chapter: &ChapterInfo) -> Result<String> {
    let output = Command::new("pdftotext")
        .arg("-enc")
        .arg("UTF-8")
        .arg("-f")
        .arg(chapter.page_start.to_string())
        .arg("-l")
        .arg(chapter.page_end.to_string())
        .arg(pdf_path)
        .arg("-")
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {} pages {}-{}: {}",
            pdf_path.display(),
            chapter.page_start,
            chapter.page_end,
            stderr.trim()
        );
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();
    Ok(pages.join("\n"))
}
