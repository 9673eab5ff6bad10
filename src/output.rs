//! Result types returned by a run.

use crate::error::FileError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Format bucket a source file was classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// `png`, `jpg`, `jpeg`
    Image,
    /// `pdf`
    Pdf,
    /// `doc`, converted to docx before extraction
    LegacyDocument,
    /// `docx`
    Document,
    /// `html`
    Markup,
}

impl SourceKind {
    /// Classify a file by its extension. Matching is case-sensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "png" | "jpg" | "jpeg" => Some(SourceKind::Image),
            "pdf" => Some(SourceKind::Pdf),
            "doc" => Some(SourceKind::LegacyDocument),
            "docx" => Some(SourceKind::Document),
            "html" => Some(SourceKind::Markup),
            _ => None,
        }
    }
}

/// Outcome of extracting one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileResult {
    /// Source path as classified.
    pub source: PathBuf,
    /// Bucket the source came from.
    pub kind: SourceKind,
    /// Text file written, if any.
    pub text_path: Option<PathBuf>,
    /// Encoded size of the text file.
    pub text_bytes: usize,
    /// Wall-clock time spent on this file.
    pub duration_ms: u64,
    /// Set when the file produced no text.
    pub error: Option<FileError>,
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Files per bucket after legacy conversion: images, pdfs, legacy docs, docx, html.
    pub images: usize,
    pub pdfs: usize,
    pub legacy_documents: usize,
    pub documents: usize,
    pub markup: usize,
    /// Text files written in this run.
    pub extracted_files: usize,
    /// Source files that produced no text.
    pub failed_files: usize,
    /// Rows appended to the table.
    pub rows_written: usize,
    /// Text files below the size threshold.
    pub rows_skipped: usize,
    pub total_duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Working directory the text files were written to.
    pub text_dir: PathBuf,
    /// Table the rows were appended to.
    pub table_path: PathBuf,
    /// One entry per extracted source file, in processing order.
    pub files: Vec<FileResult>,
    pub stats: RunStats,
}

impl RunReport {
    /// Results that carry an error.
    pub fn failures(&self) -> impl Iterator<Item = &FileResult> {
        self.files.iter().filter(|f| f.error.is_some())
    }
}
