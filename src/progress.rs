//! Progress-callback trait for per-file extraction events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive events
//! as the pipeline processes each source file.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doc2csv::{RunConfig, RunProgressCallback};
//! use std::path::Path;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl RunProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, _source: &Path, text_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} done ({} bytes)", index, total, text_len);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = RunConfig::builder()
//!     .progress_callback(counter as Arc<dyn RunProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::path::Path;
use std::sync::Arc;

/// Called by the pipeline as it extracts each source file.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Files are processed one at a time, but the trait is
/// `Send + Sync` so implementations can be shared with other threads.
pub trait RunProgressCallback: Send + Sync {
    /// Called once after classification, before any extraction.
    ///
    /// # Arguments
    /// * `total_files`: number of source files that will be extracted
    fn on_run_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called just before a file is handed to its extractor.
    ///
    /// `index` is 1-based across all formats.
    fn on_file_start(&self, index: usize, total_files: usize, source: &Path) {
        let _ = (index, total_files, source);
    }

    /// Called when a file's text has been written.
    ///
    /// `text_len` is the byte length of the encoded text file.
    fn on_file_complete(&self, index: usize, total_files: usize, source: &Path, text_len: usize) {
        let _ = (index, total_files, source, text_len);
    }

    /// Called when a file failed and was skipped.
    fn on_file_error(&self, index: usize, total_files: usize, source: &Path, error: &str) {
        let _ = (index, total_files, source, error);
    }

    /// Called once after the table has been written.
    ///
    /// # Arguments
    /// * `rows_written`: rows appended to the table in this run
    /// * `failed_files`: files that produced no text
    fn on_run_complete(&self, rows_written: usize, failed_files: usize) {
        let _ = (rows_written, failed_files);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;
