//! Configuration types for a directory-to-CSV run.
//!
//! All run behaviour is controlled through [`RunConfig`], built via its
//! [`RunConfigBuilder`]. Collaborators that wrap external engines (the OCR
//! recogniser, the legacy document converter) can be injected here; when
//! they are absent the run builds the default ones and drops them when it
//! finishes.

use crate::error::Doc2CsvError;
use crate::pipeline::legacy::DocumentConverter;
use crate::pipeline::ocr::TextRecognizer;
use crate::progress::ProgressCallback;
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default table path, relative to the working directory.
pub const DEFAULT_TABLE_PATH: &str = "csv/a.csv";

/// Default directory for intermediate per-file text.
pub const DEFAULT_TEXT_DIR: &str = "txts";

/// Text files smaller than this many bytes never become table rows.
pub const DEFAULT_MIN_ROW_BYTES: u64 = 50;

/// Tesseract languages for mixed simplified Chinese and Latin text.
pub const DEFAULT_OCR_LANG: &str = "chi_sim+eng";

/// Configuration for one run over a directory tree.
///
/// # Example
/// ```rust
/// use edgequake_doc2csv::{OcrMode, RunConfig};
///
/// let config = RunConfig::builder()
///     .input_dir("archive")
///     .table_path("out/corpus.csv")
///     .ocr_mode(OcrMode::Local)
///     .build()
///     .unwrap();
/// assert_eq!(config.min_row_bytes, 50);
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Root of the tree to scan.
    pub input_dir: PathBuf,

    /// CSV file rows are appended to. Default: `csv/a.csv`.
    pub table_path: PathBuf,

    /// Working directory for extracted text. Default: `txts`.
    ///
    /// Files from earlier runs stay here and are normalised and tabled again.
    pub text_dir: PathBuf,

    /// Image recognition strategy. Default: [`OcrMode::Cloud`].
    pub ocr_mode: OcrMode,

    /// Tesseract language string for [`OcrMode::Local`].
    pub ocr_lang: String,

    /// Directory holding `*.traineddata`. If None, tesseract's own default.
    pub tessdata_dir: Option<PathBuf>,

    /// Encoding of the extracted text files. Default: GBK.
    ///
    /// Characters the encoding cannot represent are dropped. Must be
    /// ASCII-compatible so that newline and tab bytes never occur inside a
    /// multi-byte sequence.
    pub encoding: &'static Encoding,

    /// Minimum text file size (bytes) for a table row. Default: 50.
    pub min_row_bytes: u64,

    /// Cloud OCR region. Default: `ap-shanghai`.
    pub cloud_region: String,

    /// Cloud OCR host. Default: `ocr.tencentcloudapi.com`.
    pub cloud_endpoint: String,

    /// Per-request timeout for the cloud service in seconds. Default: 60.
    pub request_timeout_secs: u64,

    /// LibreOffice binary used for `.doc` → `.docx`. Default: `soffice`.
    pub soffice: PathBuf,

    /// Explicit pdfium shared library. If None, `./` then the system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Abort on the first per-file failure instead of recording it. Default: false.
    pub strict: bool,

    /// Pre-constructed recogniser. Takes precedence over `ocr_mode`.
    pub recognizer: Option<Arc<dyn TextRecognizer>>,

    /// Pre-constructed legacy document converter. Takes precedence over `soffice`.
    pub converter: Option<Arc<dyn DocumentConverter>>,

    /// Optional per-file progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            table_path: PathBuf::from(DEFAULT_TABLE_PATH),
            text_dir: PathBuf::from(DEFAULT_TEXT_DIR),
            ocr_mode: OcrMode::default(),
            ocr_lang: DEFAULT_OCR_LANG.to_string(),
            tessdata_dir: None,
            encoding: encoding_rs::GBK,
            min_row_bytes: DEFAULT_MIN_ROW_BYTES,
            cloud_region: "ap-shanghai".to_string(),
            cloud_endpoint: "ocr.tencentcloudapi.com".to_string(),
            request_timeout_secs: 60,
            soffice: PathBuf::from("soffice"),
            pdfium_lib_path: None,
            strict: false,
            recognizer: None,
            converter: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("input_dir", &self.input_dir)
            .field("table_path", &self.table_path)
            .field("text_dir", &self.text_dir)
            .field("ocr_mode", &self.ocr_mode)
            .field("ocr_lang", &self.ocr_lang)
            .field("tessdata_dir", &self.tessdata_dir)
            .field("encoding", &self.encoding.name())
            .field("min_row_bytes", &self.min_row_bytes)
            .field("cloud_region", &self.cloud_region)
            .field("cloud_endpoint", &self.cloud_endpoint)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("soffice", &self.soffice)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("strict", &self.strict)
            .field("recognizer", &self.recognizer.as_ref().map(|r| r.name()))
            .field("converter", &self.converter.as_ref().map(|_| "<dyn DocumentConverter>"))
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RunConfig`].
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    pub fn table_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.table_path = path.into();
        self
    }

    pub fn text_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.text_dir = dir.into();
        self
    }

    pub fn ocr_mode(mut self, mode: OcrMode) -> Self {
        self.config.ocr_mode = mode;
        self
    }

    pub fn ocr_lang(mut self, lang: impl Into<String>) -> Self {
        self.config.ocr_lang = lang.into();
        self
    }

    pub fn tessdata_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.tessdata_dir = Some(dir.into());
        self
    }

    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.config.encoding = encoding;
        self
    }

    /// Look the encoding up by WHATWG label (`gbk`, `gb18030`, `big5`, …).
    pub fn encoding_label(mut self, label: &str) -> Result<Self, Doc2CsvError> {
        let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
            Doc2CsvError::InvalidConfig(format!("Unknown encoding label '{label}'"))
        })?;
        self.config.encoding = encoding;
        Ok(self)
    }

    pub fn min_row_bytes(mut self, n: u64) -> Self {
        self.config.min_row_bytes = n;
        self
    }

    pub fn cloud_region(mut self, region: impl Into<String>) -> Self {
        self.config.cloud_region = region.into();
        self
    }

    pub fn cloud_endpoint(mut self, host: impl Into<String>) -> Self {
        self.config.cloud_endpoint = host.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs.max(1);
        self
    }

    pub fn soffice(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.soffice = path.into();
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn strict(mut self, v: bool) -> Self {
        self.config.strict = v;
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.config.recognizer = Some(recognizer);
        self
    }

    pub fn converter(mut self, converter: Arc<dyn DocumentConverter>) -> Self {
        self.config.converter = Some(converter);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RunConfig, Doc2CsvError> {
        let c = &self.config;
        if c.input_dir.as_os_str().is_empty() {
            return Err(Doc2CsvError::InvalidConfig(
                "Input directory must not be empty".into(),
            ));
        }
        if c.table_path.file_name().is_none() {
            return Err(Doc2CsvError::InvalidConfig(format!(
                "Table path '{}' has no file name",
                c.table_path.display()
            )));
        }
        if c.text_dir.as_os_str().is_empty() {
            return Err(Doc2CsvError::InvalidConfig(
                "Text directory must not be empty".into(),
            ));
        }
        if !c.encoding.is_ascii_compatible() {
            return Err(Doc2CsvError::InvalidConfig(format!(
                "Encoding {} is not ASCII-compatible",
                c.encoding.name()
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How images are turned into text.
///
/// The numeric values are the ones accepted by `--mod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OcrMode {
    /// Local tesseract engine (`0`). Needs the `tesseract` feature.
    Local,
    /// Tencent Cloud GeneralAccurateOCR (`1`). (default)
    #[default]
    Cloud,
}

impl TryFrom<u8> for OcrMode {
    type Error = Doc2CsvError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(OcrMode::Local),
            1 => Ok(OcrMode::Cloud),
            other => Err(Doc2CsvError::InvalidConfig(format!(
                "OCR mode must be 0 (local) or 1 (cloud), got {other}"
            ))),
        }
    }
}
