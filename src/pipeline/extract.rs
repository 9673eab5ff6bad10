//! Per-file extraction: source file → encoded text file in the working dir.
//!
//! Every format goes through the same loop. A failing file is logged and
//! recorded in its [`FileResult`]; the run carries on with the next one
//! unless `strict` is set.

use crate::config::RunConfig;
use crate::error::{Doc2CsvError, FileError};
use crate::output::{FileResult, SourceKind};
use crate::pipeline::encoding::encode_lossy;
use crate::pipeline::naming::{create_text_file, pair_with_text_paths};
use crate::pipeline::ocr::TextRecognizer;
use crate::pipeline::pdf::PdfEngine;
use crate::pipeline::{docx, html};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

/// Drives the extractors for one run and collects their results.
pub struct Extractor<'a> {
    config: &'a RunConfig,
    recognizer: &'a dyn TextRecognizer,
    pdf: Option<&'a PdfEngine>,
    total: usize,
    index: usize,
    results: Vec<FileResult>,
}

impl<'a> Extractor<'a> {
    /// `total` is the number of files that will be handed over across all
    /// buckets; it is only used for progress events.
    pub fn new(config: &'a RunConfig, recognizer: &'a dyn TextRecognizer, total: usize) -> Self {
        Self {
            config,
            recognizer,
            pdf: None,
            total,
            index: 0,
            results: Vec::with_capacity(total),
        }
    }

    /// Use `engine` for PDFs. Without one, every PDF fails.
    pub fn with_pdf_engine(mut self, engine: &'a PdfEngine) -> Self {
        self.pdf = Some(engine);
        self
    }

    /// Extract every file of one bucket into `config.text_dir`.
    ///
    /// Fails only when the text directory is unusable, or on the first file
    /// error in strict mode.
    pub async fn extract_bucket(
        &mut self,
        kind: SourceKind,
        sources: &[PathBuf],
    ) -> Result<(), Doc2CsvError> {
        let pairs = pair_with_text_paths(sources, &self.config.text_dir)?;

        for (source, proposed) in pairs {
            self.index += 1;
            if let Some(ref cb) = self.config.progress_callback {
                cb.on_file_start(self.index, self.total, &source);
            }

            let start = Instant::now();
            let outcome = match self.extract_one(kind, &source).await {
                Ok(text) => self.write_text(&source, &proposed, &text),
                Err(e) => Err(e),
            };
            let duration_ms = start.elapsed().as_millis() as u64;

            let result = match outcome {
                Ok((text_path, text_bytes)) => {
                    debug!(
                        "{} → {} ({} bytes, {}ms)",
                        source.display(),
                        text_path.display(),
                        text_bytes,
                        duration_ms
                    );
                    if let Some(ref cb) = self.config.progress_callback {
                        cb.on_file_complete(self.index, self.total, &source, text_bytes);
                    }
                    FileResult {
                        source,
                        kind,
                        text_path: Some(text_path),
                        text_bytes,
                        duration_ms,
                        error: None,
                    }
                }
                Err(e) => {
                    warn!("Skipping {}", e);
                    if let Some(ref cb) = self.config.progress_callback {
                        cb.on_file_error(self.index, self.total, &source, &e.to_string());
                    }
                    if self.config.strict {
                        return Err(Doc2CsvError::FileFailed(e));
                    }
                    FileResult {
                        source,
                        kind,
                        text_path: None,
                        text_bytes: 0,
                        duration_ms,
                        error: Some(e),
                    }
                }
            };
            self.results.push(result);
        }
        Ok(())
    }

    pub fn into_results(self) -> Vec<FileResult> {
        self.results
    }

    async fn extract_one(&self, kind: SourceKind, source: &Path) -> Result<String, FileError> {
        match kind {
            SourceKind::Image => self.recognizer.recognize(source).await,
            SourceKind::Pdf => match self.pdf {
                Some(engine) => engine.extract_text(source).await,
                None => Err(FileError::PdfFailed {
                    path: source.to_path_buf(),
                    detail: "no PDF engine for this run".into(),
                }),
            },
            SourceKind::Document | SourceKind::LegacyDocument => {
                docx::extract_docx_text(source).await
            }
            SourceKind::Markup => html::extract_html_text(source, self.config.encoding).await,
        }
    }

    /// Encode `text` and write it to `proposed` or its next free marker name.
    fn write_text(
        &self,
        source: &Path,
        proposed: &Path,
        text: &str,
    ) -> Result<(PathBuf, usize), FileError> {
        let bytes = encode_lossy(text, self.config.encoding);
        let fail = |e: std::io::Error| FileError::WriteFailed {
            path: source.to_path_buf(),
            detail: format!("{}: {e}", proposed.display()),
        };

        let (path, file) = create_text_file(proposed).map_err(fail)?;
        write_or_discard(&path, file, &bytes).map_err(fail)?;
        Ok((path, bytes.len()))
    }
}

/// Write `bytes` to the freshly created `path`, removing it if that fails.
///
/// A half-written file would otherwise be picked up by the table stage.
fn write_or_discard(path: &Path, mut out: impl Write, bytes: &[u8]) -> std::io::Result<()> {
    let written = out.write_all(bytes).and_then(|()| out.flush());
    if written.is_err() {
        drop(out);
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove partial {}: {}", path.display(), e);
        }
    }
    written
}
