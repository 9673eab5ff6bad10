//! DOCX paragraph extraction.
//!
//! A `.docx` is a ZIP archive; the body lives in `word/document.xml`. We walk
//! it with quick-xml, collect the `w:t` runs of every top-level `w:p`, and
//! join non-empty paragraphs with newlines. Tabs and breaks inside a
//! paragraph become `\t` / `\n`; the normaliser strips them later anyway.

use crate::error::FileError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Extract the paragraph text of `docx_path`.
pub async fn extract_docx_text(docx_path: &Path) -> Result<String, FileError> {
    let path = docx_path.to_path_buf();
    tokio::task::spawn_blocking(move || extract_blocking(&path))
        .await
        .map_err(|e| FileError::DocxFailed {
            path: docx_path.to_path_buf(),
            detail: format!("DOCX task panicked: {e}"),
        })?
}

fn extract_blocking(path: &Path) -> Result<String, FileError> {
    let fail = |detail: String| FileError::DocxFailed {
        path: path.to_path_buf(),
        detail,
    };

    let file = File::open(path).map_err(|e| FileError::ReadFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let mut archive = ZipArchive::new(file).map_err(|e| fail(format!("not a zip archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| fail(format!("missing word/document.xml: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| fail(format!("unreadable word/document.xml: {e}")))?;

    Ok(paragraphs(&xml).map_err(fail)?.join("\n"))
}

/// Non-empty paragraph texts of a WordprocessingML body, in document order.
///
/// Paragraphs nested in text boxes are folded into the enclosing one.
/// Tabs and breaks count only inside runs, so tab-stop definitions in
/// paragraph properties add nothing.
fn paragraphs(xml: &str) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut runs = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => depth += 1,
                b"w:r" => runs += 1,
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) if depth > 0 && runs > 0 => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| e.to_string())?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:r" => runs = runs.saturating_sub(1),
                b"w:p" => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 && !current.is_empty() {
                        out.push(std::mem::take(&mut current));
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "word/document.xml at byte {}: {e}",
                    reader.buffer_position()
                ))
            }
            _ => {}
        }
    }
    Ok(out)
}
