//! Row assembly: every normalised text file above the size threshold becomes
//! one CSV row appended to the output table.
//!
//! Each line of a text file is one field. After normalisation a file holds a
//! single line, so in practice rows have one field; the writer is flexible
//! regardless. No header is written and nothing is deduplicated.

use crate::error::Doc2CsvError;
use crate::pipeline::encoding::decode_lossy;
use crate::pipeline::normalize::list_files;
use encoding_rs::Encoding;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::debug;

/// Rows appended and files skipped by one [`append_rows`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub rows_written: usize,
    pub rows_skipped: usize,
}

/// Append one row per qualifying file in `text_dir` to `table_path`.
///
/// Creates the table and its parent directories if missing, so a run that
/// extracted nothing still leaves an (empty) table behind. Files smaller
/// than `min_row_bytes` are skipped silently.
pub fn append_rows(
    text_dir: &Path,
    table_path: &Path,
    encoding: &'static Encoding,
    min_row_bytes: u64,
) -> Result<TableCounts, Doc2CsvError> {
    let fail = |detail: String| Doc2CsvError::TableWriteFailed {
        path: table_path.to_path_buf(),
        detail,
    };

    if let Some(parent) = table_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| fail(format!("cannot create '{}': {e}", parent.display())))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(table_path)
        .map_err(|e| fail(e.to_string()))?;
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::CRLF)
        .from_writer(file);

    let mut counts = TableCounts::default();
    for path in list_files(text_dir)? {
        let read_fail = |e: std::io::Error| fail(format!("'{}': {e}", path.display()));

        let size = std::fs::metadata(&path).map_err(read_fail)?.len();
        if size < min_row_bytes {
            debug!("Skipping {} ({} bytes)", path.display(), size);
            counts.rows_skipped += 1;
            continue;
        }

        let bytes = std::fs::read(&path).map_err(read_fail)?;
        let text = decode_lossy(&bytes, encoding);
        writer
            .write_record(row_fields(&text))
            .map_err(|e| fail(e.to_string()))?;
        counts.rows_written += 1;
    }

    writer.flush().map_err(|e| fail(e.to_string()))?;
    Ok(counts)
}

/// One field per line, line terminators included.
fn row_fields(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}
