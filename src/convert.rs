//! Run orchestration: one pass from input directory to appended table rows.

use crate::config::{OcrMode, RunConfig};
use crate::error::Doc2CsvError;
use crate::output::{FileResult, RunReport, RunStats, SourceKind};
use crate::pipeline::classify::{self, Classified};
use crate::pipeline::cloud::{CloudCredentials, CloudRecognizer};
use crate::pipeline::extract::Extractor;
use crate::pipeline::legacy::{self, DocumentConverter, SofficeConverter};
use crate::pipeline::ocr::TextRecognizer;
use crate::pipeline::pdf::PdfEngine;
use crate::pipeline::{normalize, table};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Extract every recognised file under `config.input_dir` and append the
/// results to `config.table_path`.
///
/// # Returns
/// `Ok(RunReport)` when the table was written, even if some files failed
/// (check `report.stats.failed_files`).
///
/// # Errors
/// Returns `Err(Doc2CsvError)` only for fatal errors:
/// - input directory missing or unreadable
/// - a legacy document could not be converted
/// - the text directory or table could not be written
/// - any file failure when `strict` is set
///
/// Text files written before a fatal error stay on disk.
pub async fn convert(config: &RunConfig) -> Result<RunReport, Doc2CsvError> {
    let total_start = Instant::now();
    info!("Starting run: {}", config.input_dir.display());

    // ── Step 1: Classify ─────────────────────────────────────────────────
    let mut classified = classify::classify_tree(&config.input_dir)?;

    // ── Step 2: Convert legacy documents ─────────────────────────────────
    if !classified.legacy_documents.is_empty() {
        classified = convert_legacy(config, classified).await?;
    }

    // ── Step 3: Pick the recogniser, bind pdfium ─────────────────────────
    let recognizer = resolve_recognizer(config)?;
    debug!("Image recogniser: {}", recognizer.name());

    let pdf_engine = if classified.pdfs.is_empty() {
        None
    } else {
        let engine = PdfEngine::bind(config.pdfium_lib_path.as_deref()).await;
        if let Some(e) = engine.bind_error() {
            warn!("Cannot bind pdfium ({}); PDFs will be skipped", e);
        }
        Some(engine)
    };

    // ── Step 4: Extract, bucket by bucket ────────────────────────────────
    let total_files = classified.extractable();
    if let Some(ref cb) = config.progress_callback {
        cb.on_run_start(total_files);
    }

    let mut extractor = Extractor::new(config, recognizer.as_ref(), total_files);
    if let Some(ref engine) = pdf_engine {
        extractor = extractor.with_pdf_engine(engine);
    }
    for kind in [
        SourceKind::Image,
        SourceKind::Pdf,
        SourceKind::Document,
        SourceKind::Markup,
    ] {
        extractor
            .extract_bucket(kind, classified.bucket(kind))
            .await?;
    }
    let files = extractor.into_results();

    // ── Step 5: Normalise ────────────────────────────────────────────────
    let text_dir = config.text_dir.clone();
    let normalised = tokio::task::spawn_blocking(move || normalize::normalize_dir(&text_dir))
        .await
        .map_err(|e| Doc2CsvError::Internal(format!("normalise task panicked: {e}")))??;
    debug!("Normalised {} text files", normalised);

    // ── Step 6: Append rows ──────────────────────────────────────────────
    let counts = {
        let text_dir = config.text_dir.clone();
        let table_path = config.table_path.clone();
        let encoding = config.encoding;
        let min_row_bytes = config.min_row_bytes;
        tokio::task::spawn_blocking(move || {
            table::append_rows(&text_dir, &table_path, encoding, min_row_bytes)
        })
        .await
        .map_err(|e| Doc2CsvError::Internal(format!("table task panicked: {e}")))??
    };

    // ── Step 7: Stats ────────────────────────────────────────────────────
    let stats = compute_stats(&classified, &files, counts, total_start);

    info!(
        "Run complete: {} rows appended to {}, {} files extracted, {} failed, {}ms total",
        stats.rows_written,
        config.table_path.display(),
        stats.extracted_files,
        stats.failed_files,
        stats.total_duration_ms
    );
    if stats.failed_files > 0 {
        warn!("{} files produced no text", stats.failed_files);
    }

    if let Some(ref cb) = config.progress_callback {
        cb.on_run_complete(stats.rows_written, stats.failed_files);
    }

    Ok(RunReport {
        text_dir: config.text_dir.clone(),
        table_path: config.table_path.clone(),
        files,
        stats,
    })
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(config: &RunConfig) -> Result<RunReport, Doc2CsvError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Doc2CsvError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(config))
}

/// Classify `input_dir` without touching any file.
///
/// Legacy documents are listed as found; nothing is converted.
pub fn inspect(input_dir: impl AsRef<std::path::Path>) -> Result<Classified, Doc2CsvError> {
    classify::classify_tree(input_dir.as_ref())
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Run the legacy converter on the blocking pool.
///
/// The default LibreOffice converter is created here and dropped with its
/// profile directory once every document is converted.
async fn convert_legacy(
    config: &RunConfig,
    mut classified: Classified,
) -> Result<Classified, Doc2CsvError> {
    let converter: Arc<dyn DocumentConverter> = match config.converter {
        Some(ref c) => Arc::clone(c),
        None => Arc::new(SofficeConverter::new(&config.soffice)?),
    };

    tokio::task::spawn_blocking(move || {
        legacy::convert_legacy_documents(&mut classified, converter.as_ref())?;
        Ok::<_, Doc2CsvError>(classified)
    })
    .await
    .map_err(|e| Doc2CsvError::Internal(format!("conversion task panicked: {e}")))?
}

/// Pick the image recogniser, from most-specific to least-specific:
///
/// 1. **Injected** (`config.recognizer`), used as-is.
/// 2. **Local** (`OcrMode::Local`): tesseract when built with the
///    `tesseract` feature, otherwise a stand-in that fails each image.
/// 3. **Cloud** (`OcrMode::Cloud`): credentials from the environment.
///    Missing credentials fail each image, not the run.
fn resolve_recognizer(config: &RunConfig) -> Result<Arc<dyn TextRecognizer>, Doc2CsvError> {
    if let Some(ref r) = config.recognizer {
        return Ok(Arc::clone(r));
    }

    match config.ocr_mode {
        OcrMode::Local => local_recognizer(config),
        OcrMode::Cloud => {
            let credentials = CloudCredentials::from_env();
            if credentials.is_none() {
                warn!("Cloud OCR credentials not set; images will be skipped");
            }
            Ok(Arc::new(CloudRecognizer::new(
                &config.cloud_endpoint,
                &config.cloud_region,
                credentials,
                config.request_timeout_secs,
            )?))
        }
    }
}

#[cfg(feature = "tesseract")]
fn local_recognizer(config: &RunConfig) -> Result<Arc<dyn TextRecognizer>, Doc2CsvError> {
    use crate::pipeline::ocr::TesseractRecognizer;
    Ok(Arc::new(TesseractRecognizer::new(
        config.tessdata_dir.clone(),
        &config.ocr_lang,
    )?))
}

#[cfg(not(feature = "tesseract"))]
fn local_recognizer(_config: &RunConfig) -> Result<Arc<dyn TextRecognizer>, Doc2CsvError> {
    warn!("Built without the `tesseract` feature; images will be skipped");
    Ok(Arc::new(crate::pipeline::ocr::LocalOcrUnavailable))
}

fn compute_stats(
    classified: &Classified,
    files: &[FileResult],
    counts: table::TableCounts,
    start: Instant,
) -> RunStats {
    let failed_files = files.iter().filter(|f| f.error.is_some()).count();
    RunStats {
        images: classified.images.len(),
        pdfs: classified.pdfs.len(),
        legacy_documents: classified.legacy_documents.len(),
        documents: classified.documents.len(),
        markup: classified.markup.len(),
        extracted_files: files.len() - failed_files,
        failed_files,
        rows_written: counts.rows_written,
        rows_skipped: counts.rows_skipped,
        total_duration_ms: start.elapsed().as_millis() as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileError;
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};

    struct Fixed;

    #[async_trait]
    impl TextRecognizer for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }
        async fn recognize(&self, _image: &Path) -> Result<String, FileError> {
            Ok(String::new())
        }
    }

    #[test]
    fn injected_recognizer_wins() {
        let config = RunConfig::builder()
            .ocr_mode(OcrMode::Local)
            .recognizer(Arc::new(Fixed))
            .build()
            .unwrap();
        assert_eq!(resolve_recognizer(&config).unwrap().name(), "fixed");
    }

    #[test]
    fn cloud_mode_builds_without_credentials() {
        let config = RunConfig::builder().ocr_mode(OcrMode::Cloud).build().unwrap();
        assert_eq!(resolve_recognizer(&config).unwrap().name(), "tencentcloud");
    }

    #[test]
    fn stats_split_success_and_failure() {
        let classified = Classified {
            images: vec![PathBuf::from("a.png")],
            markup: vec![PathBuf::from("b.html")],
            ..Default::default()
        };
        let files = vec![
            FileResult {
                source: PathBuf::from("a.png"),
                kind: SourceKind::Image,
                text_path: None,
                text_bytes: 0,
                duration_ms: 1,
                error: Some(FileError::MissingCredentials {
                    path: PathBuf::from("a.png"),
                }),
            },
            FileResult {
                source: PathBuf::from("b.html"),
                kind: SourceKind::Markup,
                text_path: Some(PathBuf::from("txts/b.txt")),
                text_bytes: 80,
                duration_ms: 1,
                error: None,
            },
        ];
        let counts = table::TableCounts {
            rows_written: 1,
            rows_skipped: 0,
        };

        let stats = compute_stats(&classified, &files, counts, Instant::now());
        assert_eq!(stats.images, 1);
        assert_eq!(stats.markup, 1);
        assert_eq!(stats.extracted_files, 1);
        assert_eq!(stats.failed_files, 1);
        assert_eq!(stats.rows_written, 1);
    }
}
