//! Error types for the edgequake-doc2csv library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Doc2CsvError`]: **Fatal**: the run cannot proceed at all (input
//!   directory missing, legacy conversion failed, table not writable).
//!   Returned as `Err(Doc2CsvError)` from the top-level `convert*` functions.
//!
//! * [`FileError`]: **Non-fatal**: a single source file failed (OCR service
//!   rejected the image, corrupt PDF, broken DOCX) while every other file is
//!   fine. Stored inside [`crate::output::FileResult`] so callers can inspect
//!   partial success. With `strict` enabled the first one is promoted to
//!   [`Doc2CsvError::FileFailed`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-doc2csv library.
#[derive(Debug, Error)]
pub enum Doc2CsvError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The directory to scan does not exist.
    #[error("Input directory not found: '{path}'")]
    DirectoryNotFound { path: PathBuf },

    /// Listing a directory during the walk failed.
    #[error("Failed to read directory '{path}': {source}")]
    WalkFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Legacy document conversion ────────────────────────────────────────
    /// Renaming a legacy document ahead of conversion failed.
    #[error("Failed to rename '{from}' to '{to}': {source}")]
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document converter could not produce a modern document.
    #[error("Failed to convert '{path}' to docx: {detail}")]
    ConversionFailed { path: PathBuf, detail: String },

    // ── Working directory / table errors ──────────────────────────────────
    /// Could not create or list the text working directory.
    #[error("Text directory '{path}' is unusable: {source}")]
    TextDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rewriting a text file during normalisation failed.
    #[error("Failed to normalise '{path}': {source}")]
    NormalizeFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create, open or append to the output table.
    #[error("Failed to write table '{path}': {detail}")]
    TableWriteFailed { path: PathBuf, detail: String },

    // ── Strict mode ───────────────────────────────────────────────────────
    /// A file failed while `strict` was enabled.
    #[error("{0}")]
    FileFailed(FileError),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single source file.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum FileError {
    /// Reading the source file failed.
    #[error("'{path}': read failed: {detail}")]
    ReadFailed { path: PathBuf, detail: String },

    /// Writing the extracted text file failed.
    #[error("'{path}': write failed: {detail}")]
    WriteFailed { path: PathBuf, detail: String },

    /// The local OCR engine could not be initialised or failed on the image.
    #[error("'{path}': OCR failed: {detail}")]
    OcrFailed { path: PathBuf, detail: String },

    /// Cloud credentials were not supplied.
    #[error("'{path}': cloud OCR credentials missing (set TENCENTCLOUD_SECRET_ID and TENCENTCLOUD_SECRET_KEY)")]
    MissingCredentials { path: PathBuf },

    /// The cloud service answered with an error code.
    #[error("'{path}': {code} {message}")]
    ServiceError {
        path: PathBuf,
        code: String,
        message: String,
    },

    /// The request never produced a usable response (network, TLS, JSON).
    #[error("'{path}': cloud request failed: {detail}")]
    RequestFailed { path: PathBuf, detail: String },

    /// The image payload is not a format the service accepts.
    #[error("'{path}': unsupported image payload ({detail})")]
    UnsupportedImage { path: PathBuf, detail: String },

    /// pdfium could not be bound or the PDF could not be read.
    #[error("'{path}': PDF extraction failed: {detail}")]
    PdfFailed { path: PathBuf, detail: String },

    /// The DOCX archive or its document.xml is broken.
    #[error("'{path}': DOCX extraction failed: {detail}")]
    DocxFailed { path: PathBuf, detail: String },
}

impl FileError {
    /// Source file the error belongs to.
    pub fn path(&self) -> &std::path::Path {
        match self {
            FileError::ReadFailed { path, .. }
            | FileError::WriteFailed { path, .. }
            | FileError::OcrFailed { path, .. }
            | FileError::MissingCredentials { path }
            | FileError::ServiceError { path, .. }
            | FileError::RequestFailed { path, .. }
            | FileError::UnsupportedImage { path, .. }
            | FileError::PdfFailed { path, .. }
            | FileError::DocxFailed { path, .. } => path,
        }
    }
}
