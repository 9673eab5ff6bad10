//! # edgequake-doc2csv
//!
//! Bulk-extract text from a directory of scanned images, PDFs, Word documents
//! and HTML pages into a flat CSV corpus.
//!
//! ## Pipeline Overview
//!
//! ```text
//! directory
//!  │
//!  ├─ 1. Classify   recursive walk, bucket by extension
//!  ├─ 2. Legacy     .doc → .docx via LibreOffice (blocking pool)
//!  ├─ 3. Extract    OCR (tesseract / Tencent Cloud), pdfium, docx, html
//!  │                → one GBK text file per source in txts/
//!  ├─ 4. Normalise  strip \n \r \t from every text file in place
//!  └─ 5. Table      one CSV row per text file of at least 50 bytes
//! ```
//!
//! A file that fails to extract is logged, recorded in the
//! [`RunReport`], and skipped; everything else keeps going.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_doc2csv::{convert, OcrMode, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Cloud OCR reads TENCENTCLOUD_SECRET_ID / TENCENTCLOUD_SECRET_KEY
//!     let config = RunConfig::builder()
//!         .input_dir("archive")
//!         .table_path("csv/a.csv")
//!         .ocr_mode(OcrMode::Cloud)
//!         .build()?;
//!     let report = convert(&config).await?;
//!     eprintln!("{} rows, {} failed files",
//!         report.stats.rows_written,
//!         report.stats.failed_files);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature     | Default | Description |
//! |-------------|---------|-------------|
//! | `cli`       | on      | Enables the `doc2csv` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `tesseract` | off     | Local OCR through leptess; needs libtesseract and libleptonica |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-doc2csv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{OcrMode, RunConfig, RunConfigBuilder};
pub use convert::{convert, convert_sync, inspect};
pub use error::{Doc2CsvError, FileError};
pub use output::{FileResult, RunReport, RunStats, SourceKind};
pub use pipeline::classify::Classified;
pub use pipeline::cloud::{CloudCredentials, CloudRecognizer};
pub use pipeline::legacy::{DocumentConverter, SofficeConverter};
pub use pipeline::ocr::TextRecognizer;
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
