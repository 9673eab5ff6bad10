//! Integration tests for edgequake-doc2csv.
//!
//! Every run works in a fresh temporary directory. Engines that live outside
//! the process (tesseract, pdfium, LibreOffice, the cloud service) are
//! replaced by fakes through `RunConfig::recognizer` / `RunConfig::converter`;
//! HTML and DOCX go through the real extractors.

use async_trait::async_trait;
use edgequake_doc2csv::{
    convert, inspect, CloudRecognizer, Doc2CsvError, DocumentConverter, FileError,
    RunConfig, RunConfigBuilder, RunProgressCallback, SourceKind, TextRecognizer,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Text long enough to clear the default 50-byte threshold on its own.
const FILLER: &str = "0123456789abcdefghijklmnopqrstuvwxyz0123456789abcdefghij";

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        std::fs::create_dir(root.path().join("in")).unwrap();
        Self { root }
    }

    fn input(&self) -> PathBuf {
        self.root.path().join("in")
    }

    fn text_dir(&self) -> PathBuf {
        self.root.path().join("txts")
    }

    fn table(&self) -> PathBuf {
        self.root.path().join("csv").join("a.csv")
    }

    fn write(&self, rel: &str, bytes: &[u8]) -> PathBuf {
        let p = self.input().join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(&p, bytes).unwrap();
        p
    }

    fn builder(&self) -> RunConfigBuilder {
        RunConfig::builder()
            .input_dir(self.input())
            .text_dir(self.text_dir())
            .table_path(self.table())
    }

    fn rows(&self) -> Vec<Vec<String>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(self.table())
            .unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }
}

fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{p}</w:t></w:r></w:p>"))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
    );

    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let opts = zip::write::SimpleFileOptions::default();
    zip.start_file("word/document.xml", opts).unwrap();
    zip.write_all(xml.as_bytes()).unwrap();
    zip.finish().unwrap().into_inner()
}

/// Recognises every image as a fixed sentence tagged with its file name.
struct FakeOcr;

#[async_trait]
impl TextRecognizer for FakeOcr {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn recognize(&self, image: &Path) -> Result<String, FileError> {
        let name = image.file_name().unwrap().to_string_lossy();
        Ok(format!("{name}\n{FILLER}"))
    }
}

/// Writes a docx next to the legacy file, as LibreOffice would.
struct FakeSoffice;

impl DocumentConverter for FakeSoffice {
    fn convert_to_docx(&self, doc: &Path) -> Result<PathBuf, Doc2CsvError> {
        let docx = doc.with_extension("docx");
        std::fs::write(&docx, docx_bytes(&["converted from doc", FILLER])).unwrap();
        Ok(docx)
    }
}

#[derive(Default)]
struct Counting {
    started: AtomicUsize,
    completed: AtomicUsize,
    errored: AtomicUsize,
    rows: AtomicUsize,
}

impl RunProgressCallback for Counting {
    fn on_run_start(&self, total_files: usize) {
        self.started.store(total_files, Ordering::SeqCst);
    }
    fn on_file_complete(&self, _: usize, _: usize, _: &Path, _: usize) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
    fn on_file_error(&self, _: usize, _: usize, _: &Path, _: &str) {
        self.errored.fetch_add(1, Ordering::SeqCst);
    }
    fn on_run_complete(&self, rows_written: usize, _: usize) {
        self.rows.store(rows_written, Ordering::SeqCst);
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_html_row_has_tags_and_newlines_stripped() {
    let ws = Workspace::new();
    ws.write(
        "page.html",
        format!("<p>Hello\nWorld</p><p>{FILLER}</p>").as_bytes(),
    );

    let config = ws.builder().recognizer(Arc::new(FakeOcr)).build().unwrap();
    let report = convert(&config).await.unwrap();

    assert_eq!(report.stats.rows_written, 1);
    let rows = ws.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].concat(), format!("HelloWorld{FILLER}"));
}

#[tokio::test]
async fn test_empty_directory_creates_empty_table() {
    let ws = Workspace::new();
    ws.write("notes.md", b"# not a recognised type");

    let config = ws.builder().recognizer(Arc::new(FakeOcr)).build().unwrap();
    let report = convert(&config).await.unwrap();

    assert!(report.files.is_empty());
    assert_eq!(report.stats.rows_written, 0);
    assert!(ws.table().exists());
    assert!(ws.rows().is_empty());
    assert!(ws.text_dir().is_dir());
}

#[tokio::test]
async fn test_duplicate_stems_get_collision_markers() {
    let ws = Workspace::new();
    ws.write("x/a.jpg", b"\xFF\xD8\xFF");
    ws.write("y/a.jpg", b"\xFF\xD8\xFF");

    let config = ws.builder().recognizer(Arc::new(FakeOcr)).build().unwrap();
    let report = convert(&config).await.unwrap();

    assert!(ws.text_dir().join("a.txt").is_file());
    assert!(ws.text_dir().join("a#.txt").is_file());
    assert_eq!(report.stats.images, 2);
    assert_eq!(report.stats.rows_written, 2);
}

#[tokio::test]
async fn test_text_files_are_normalised_gbk() {
    let ws = Workspace::new();
    ws.write("memo.docx", &docx_bytes(&["第一段\t制表", FILLER]));

    let config = ws.builder().recognizer(Arc::new(FakeOcr)).build().unwrap();
    convert(&config).await.unwrap();

    let bytes = std::fs::read(ws.text_dir().join("memo.txt")).unwrap();
    assert!(!bytes.contains(&b'\n'));
    assert!(!bytes.contains(&b'\t'));
    let (text, _, had_errors) = encoding_rs::GBK.decode(&bytes);
    assert!(!had_errors);
    assert_eq!(text, format!("第一段制表{FILLER}"));

    // The table itself is UTF-8.
    assert_eq!(ws.rows()[0].concat(), format!("第一段制表{FILLER}"));
}

#[tokio::test]
async fn test_short_text_is_kept_but_not_tabled() {
    let ws = Workspace::new();
    ws.write("tiny.html", b"<p>short</p>");
    ws.write("long.html", format!("<p>{FILLER}</p>").as_bytes());

    let config = ws.builder().recognizer(Arc::new(FakeOcr)).build().unwrap();
    let report = convert(&config).await.unwrap();

    assert!(ws.text_dir().join("tiny.txt").is_file());
    assert_eq!(report.stats.rows_written, 1);
    assert_eq!(report.stats.rows_skipped, 1);
    assert_eq!(ws.rows()[0].concat(), FILLER);
}

#[tokio::test]
async fn test_missing_cloud_credentials_only_drop_images() {
    let ws = Workspace::new();
    ws.write("scan.png", b"\x89PNG\r\n\x1a\n");
    ws.write("memo.docx", &docx_bytes(&[FILLER]));
    ws.write("page.html", format!("<p>{FILLER}</p>").as_bytes());

    let cloud = CloudRecognizer::new("ocr.tencentcloudapi.com", "ap-shanghai", None, 5).unwrap();
    let config = ws.builder().recognizer(Arc::new(cloud)).build().unwrap();
    let report = convert(&config).await.unwrap();

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind, SourceKind::Image);
    assert!(matches!(
        failures[0].error,
        Some(FileError::MissingCredentials { .. })
    ));
    assert_eq!(report.stats.rows_written, 2);
    assert!(!ws.text_dir().join("scan.txt").exists());
}

#[tokio::test]
async fn test_strict_mode_aborts_on_first_failure() {
    let ws = Workspace::new();
    ws.write("scan.png", b"\x89PNG\r\n\x1a\n");
    ws.write("page.html", format!("<p>{FILLER}</p>").as_bytes());

    let cloud = CloudRecognizer::new("ocr.tencentcloudapi.com", "ap-shanghai", None, 5).unwrap();
    let config = ws
        .builder()
        .recognizer(Arc::new(cloud))
        .strict(true)
        .build()
        .unwrap();
    let err = convert(&config).await.unwrap_err();

    assert!(matches!(
        err,
        Doc2CsvError::FileFailed(FileError::MissingCredentials { .. })
    ));
    assert!(!ws.table().exists());
}

#[tokio::test]
async fn test_legacy_document_is_converted_and_tabled() {
    let ws = Workspace::new();
    let doc = ws.write("old/report.doc", b"\xD0\xCF\x11\xE0");

    let config = ws
        .builder()
        .recognizer(Arc::new(FakeOcr))
        .converter(Arc::new(FakeSoffice))
        .build()
        .unwrap();
    let report = convert(&config).await.unwrap();

    assert!(doc.exists());
    assert!(ws.input().join("old/report.docx").is_file());
    assert_eq!(report.stats.legacy_documents, 1);
    assert_eq!(report.stats.documents, 1);
    assert_eq!(ws.rows()[0].concat(), format!("converted from doc{FILLER}"));
}

#[tokio::test]
async fn test_broken_docx_is_recorded_and_run_continues() {
    let ws = Workspace::new();
    ws.write("broken.docx", b"not a zip");
    ws.write("page.html", format!("<p>{FILLER}</p>").as_bytes());

    let config = ws.builder().recognizer(Arc::new(FakeOcr)).build().unwrap();
    let report = convert(&config).await.unwrap();

    assert_eq!(report.stats.failed_files, 1);
    assert!(matches!(
        report.failures().next().unwrap().error,
        Some(FileError::DocxFailed { .. })
    ));
    assert_eq!(report.stats.rows_written, 1);
}

#[tokio::test]
async fn test_second_run_appends_again() {
    let ws = Workspace::new();
    ws.write("page.html", format!("<p>{FILLER}</p>").as_bytes());

    let config = ws.builder().recognizer(Arc::new(FakeOcr)).build().unwrap();
    convert(&config).await.unwrap();
    let second = convert(&config).await.unwrap();

    // The text dir keeps page.txt from the first run, so the second run
    // writes page#.txt and tables both.
    assert!(ws.text_dir().join("page#.txt").is_file());
    assert_eq!(second.stats.rows_written, 2);
    assert_eq!(ws.rows().len(), 3);
}

#[tokio::test]
async fn test_progress_callback_sees_every_file() {
    let ws = Workspace::new();
    ws.write("a.jpg", b"\xFF\xD8\xFF");
    ws.write("b.html", format!("<p>{FILLER}</p>").as_bytes());
    ws.write("c.docx", b"broken");

    let cb = Arc::new(Counting::default());
    let config = ws
        .builder()
        .recognizer(Arc::new(FakeOcr))
        .progress_callback(cb.clone())
        .build()
        .unwrap();
    convert(&config).await.unwrap();

    assert_eq!(cb.started.load(Ordering::SeqCst), 3);
    assert_eq!(cb.completed.load(Ordering::SeqCst), 2);
    assert_eq!(cb.errored.load(Ordering::SeqCst), 1);
    assert_eq!(cb.rows.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_missing_input_directory_is_fatal() {
    let ws = Workspace::new();
    let config = RunConfig::builder()
        .input_dir(ws.root.path().join("nope"))
        .text_dir(ws.text_dir())
        .table_path(ws.table())
        .build()
        .unwrap();

    let err = convert(&config).await.unwrap_err();
    assert!(matches!(err, Doc2CsvError::DirectoryNotFound { .. }));
}

#[test]
fn test_inspect_buckets_by_extension() {
    let ws = Workspace::new();
    ws.write("a.png", b"");
    ws.write("b.JPG", b"");
    ws.write("deep/c.pdf", b"");
    ws.write("d.doc", b"");
    ws.write("e.docx", b"");
    ws.write("f.html", b"");
    ws.write("g.htm", b"");

    let c = inspect(ws.input()).unwrap();
    assert_eq!(c.images.len(), 1);
    assert_eq!(c.pdfs, vec![ws.input().join("deep/c.pdf")]);
    assert_eq!(c.legacy_documents.len(), 1);
    assert_eq!(c.documents.len(), 1);
    assert_eq!(c.markup.len(), 1);
}
