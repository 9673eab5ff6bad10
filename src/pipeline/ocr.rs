//! Image recognition strategies.
//!
//! [`TextRecognizer`] is the seam between the image extractor and whatever
//! engine reads the pixels: the local tesseract engine (`--mod 0`) or the
//! cloud service in [`crate::pipeline::cloud`] (`--mod 1`). Recognisers are
//! built once per run and shared by reference.

use crate::error::FileError;
use async_trait::async_trait;
use std::path::Path;

/// Turns one image file into text.
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    /// Recognise the text in `image`.
    async fn recognize(&self, image: &Path) -> Result<String, FileError>;
}

#[cfg(feature = "tesseract")]
pub use local::TesseractRecognizer;

#[cfg(feature = "tesseract")]
mod local {
    use super::TextRecognizer;
    use crate::error::{Doc2CsvError, FileError};
    use async_trait::async_trait;
    use leptess::LepTess;
    use std::path::{Path, PathBuf};
    use tracing::debug;

    /// Local tesseract engine via leptess.
    ///
    /// The engine is probed once at construction so a missing language pack
    /// fails the run before any file is touched. Each image then gets its own
    /// engine handle on the blocking pool.
    pub struct TesseractRecognizer {
        tessdata_dir: Option<String>,
        lang: String,
    }

    impl TesseractRecognizer {
        pub fn new(tessdata_dir: Option<PathBuf>, lang: impl Into<String>) -> Result<Self, Doc2CsvError> {
            let recognizer = Self {
                tessdata_dir: tessdata_dir.map(|p| p.to_string_lossy().into_owned()),
                lang: lang.into(),
            };
            LepTess::new(recognizer.tessdata_dir.as_deref(), &recognizer.lang).map_err(|e| {
                Doc2CsvError::InvalidConfig(format!(
                    "tesseract could not load '{}': {e:?}",
                    recognizer.lang
                ))
            })?;
            debug!("tesseract ready ({})", recognizer.lang);
            Ok(recognizer)
        }
    }

    #[async_trait]
    impl TextRecognizer for TesseractRecognizer {
        fn name(&self) -> &'static str {
            "tesseract"
        }

        async fn recognize(&self, image: &Path) -> Result<String, FileError> {
            let datapath = self.tessdata_dir.clone();
            let lang = self.lang.clone();
            let path = image.to_path_buf();

            tokio::task::spawn_blocking(move || {
                let fail = |detail: String| FileError::OcrFailed {
                    path: path.clone(),
                    detail,
                };
                let mut engine =
                    LepTess::new(datapath.as_deref(), &lang).map_err(|e| fail(format!("{e:?}")))?;
                engine
                    .set_image(&path)
                    .map_err(|e| fail(format!("{e:?}")))?;
                engine.get_utf8_text().map_err(|e| fail(format!("{e:?}")))
            })
            .await
            .map_err(|e| FileError::OcrFailed {
                path: image.to_path_buf(),
                detail: format!("OCR task panicked: {e}"),
            })?
        }
    }
}

/// Stand-in for `--mod 0` when the crate is built without `tesseract`.
///
/// Fails every image instead of the whole run.
pub struct LocalOcrUnavailable;

#[async_trait]
impl TextRecognizer for LocalOcrUnavailable {
    fn name(&self) -> &'static str {
        "tesseract (unavailable)"
    }

    async fn recognize(&self, image: &Path) -> Result<String, FileError> {
        Err(FileError::OcrFailed {
            path: image.to_path_buf(),
            detail: "built without the `tesseract` feature; rebuild with --features tesseract or use --mod 1".into(),
        })
    }
}
