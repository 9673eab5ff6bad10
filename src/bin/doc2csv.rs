//! CLI binary for edgequake-doc2csv.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RunConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_doc2csv::{
    convert, inspect, OcrMode, ProgressCallback, RunConfig, RunProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per file.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the file currently being extracted.
    current: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    /// Spinner until `on_run_start` tells us how many files there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Scanning directory…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            current: Mutex::new(None),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} files  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }

    fn take_elapsed(&self) -> f64 {
        self.current
            .lock()
            .ok()
            .and_then(|mut c| c.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

fn file_label(source: &Path) -> String {
    source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string())
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_files: usize) {
        self.activate_bar(total_files);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting text from {total_files} files…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, source: &Path) {
        if let Ok(mut c) = self.current.lock() {
            *c = Some(Instant::now());
        }
        self.bar.set_message(file_label(source));
    }

    fn on_file_complete(&self, index: usize, total: usize, source: &Path, text_len: usize) {
        let elapsed = self.take_elapsed();
        self.bar.println(format!(
            "  {} {:>4}/{:<4}  {:<32}  {}  {}",
            green("✓"),
            index,
            total,
            file_label(source),
            dim(&format!("{text_len:>7} bytes")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, source: &Path, error: &str) {
        let elapsed = self.take_elapsed();

        // Keep lines tidy.
        let msg: String = if error.chars().count() > 80 {
            let mut s: String = error.chars().take(79).collect();
            s.push('\u{2026}');
            s
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>4}/{:<4}  {:<32}  {}  {}",
            red("✗"),
            index,
            total,
            file_label(source),
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, rows_written: usize, failed_files: usize) {
        self.bar.finish_and_clear();
        if failed_files == 0 {
            eprintln!("{} {} rows appended", green("✔"), bold(&rows_written.to_string()));
        } else {
            eprintln!(
                "{} {} rows appended  ({} files failed)",
                cyan("⚠"),
                bold(&rows_written.to_string()),
                red(&failed_files.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Cloud OCR (default), table at csv/a.csv
  doc2csv ./archive

  # Local tesseract engine, custom table
  doc2csv ./archive -m 0 -s out/corpus.csv

  # Abort on the first unreadable file
  doc2csv ./archive --strict

  # List what would be processed
  doc2csv ./archive --inspect-only

  # Machine-readable run report
  doc2csv ./archive --json > report.json

SUPPORTED INPUTS:
  png, jpg, jpeg   OCR (local tesseract or Tencent Cloud GeneralAccurateOCR)
  pdf              text layer via pdfium
  doc              converted to docx with LibreOffice, then as docx
  docx             paragraph text
  html             tag-stripped text

ENVIRONMENT VARIABLES:
  TENCENTCLOUD_SECRET_ID   Cloud OCR secret id (--mod 1)
  TENCENTCLOUD_SECRET_KEY  Cloud OCR secret key (--mod 1)
  PDFIUM_LIB_PATH          Path to libpdfium; otherwise ./ then the system library
  TESSDATA_PREFIX          Tesseract language data (--mod 0)
  RUST_LOG                 Log filter, overrides -v / -q
"#;

/// Extract text from an archive of images, PDFs, Word and HTML files into a CSV table.
#[derive(Parser, Debug)]
#[command(
    name = "doc2csv",
    version,
    about = "Extract text from images, PDFs, Word and HTML files into a CSV table",
    long_about = "Walk a directory, extract text from every png/jpg/jpeg, pdf, doc, docx and html \
file into GBK text files under txts/, strip line breaks and tabs, and append one CSV row per \
text file of at least 50 bytes.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Directory containing the files to convert.
    dir: PathBuf,

    /// CSV file rows are appended to.
    #[arg(short, long, env = "DOC2CSV_SAVE", default_value = "csv/a.csv")]
    save: PathBuf,

    /// OCR engine: 0 = local tesseract, 1 = Tencent Cloud.
    #[arg(short = 'm', long = "mod", env = "DOC2CSV_MOD", default_value_t = 1,
          value_parser = clap::value_parser!(u8).range(0..=1))]
    mode: u8,

    /// Working directory for extracted text files.
    #[arg(long, env = "DOC2CSV_TEXT_DIR", default_value = "txts")]
    text_dir: PathBuf,

    /// Tesseract language(s) for --mod 0.
    #[arg(long, env = "DOC2CSV_OCR_LANG", default_value = "chi_sim+eng")]
    ocr_lang: String,

    /// Tesseract tessdata directory for --mod 0.
    #[arg(long, env = "DOC2CSV_TESSDATA")]
    tessdata: Option<PathBuf>,

    /// Encoding of the text files (must be ASCII-compatible).
    #[arg(long, env = "DOC2CSV_ENCODING", default_value = "gbk")]
    encoding: String,

    /// Text files smaller than this many bytes get no row.
    #[arg(long, env = "DOC2CSV_MIN_BYTES", default_value_t = 50)]
    min_bytes: u64,

    /// Cloud OCR region.
    #[arg(long, env = "DOC2CSV_REGION", default_value = "ap-shanghai")]
    region: String,

    /// Cloud OCR endpoint host.
    #[arg(long, env = "DOC2CSV_ENDPOINT", default_value = "ocr.tencentcloudapi.com")]
    endpoint: String,

    /// Per-request cloud timeout in seconds.
    #[arg(long, env = "DOC2CSV_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// LibreOffice binary used to convert .doc files.
    #[arg(long, env = "DOC2CSV_SOFFICE", default_value = "soffice")]
    soffice: PathBuf,

    /// Explicit pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Abort on the first file that fails to extract.
    #[arg(long, env = "DOC2CSV_STRICT")]
    strict: bool,

    /// Output the run report as JSON on stdout.
    #[arg(long, env = "DOC2CSV_JSON")]
    json: bool,

    /// Classify the directory and print the buckets, nothing else.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOC2CSV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOC2CSV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOC2CSV_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO-level library logs.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let classified = inspect(&cli.dir).context("Failed to scan directory")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&classified).context("Failed to serialise buckets")?
            );
        } else {
            let buckets: [(&str, &[PathBuf]); 5] = [
                ("images", &classified.images),
                ("pdf", &classified.pdfs),
                ("doc", &classified.legacy_documents),
                ("docx", &classified.documents),
                ("html", &classified.markup),
            ];
            for (label, paths) in buckets {
                println!("{label:<8} {}", paths.len());
                for p in paths {
                    println!("  {}", p.display());
                }
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn RunProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let report = convert(&config).await.context("Run failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    }

    if !cli.quiet && !show_progress && !cli.json {
        eprintln!(
            "Appended {} rows to {} ({} files extracted, {} failed, {} below {} bytes)",
            report.stats.rows_written,
            report.table_path.display(),
            report.stats.extracted_files,
            report.stats.failed_files,
            report.stats.rows_skipped,
            config.min_row_bytes,
        );
    }

    if !cli.quiet && !cli.json {
        eprintln!("{}", dim(&format!("time: {:.2}s", start.elapsed().as_secs_f64())));
    }

    Ok(())
}

/// Map CLI args to `RunConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RunConfig> {
    let mode = OcrMode::try_from(cli.mode).context("Invalid --mod")?;

    let mut builder = RunConfig::builder()
        .input_dir(&cli.dir)
        .table_path(&cli.save)
        .text_dir(&cli.text_dir)
        .ocr_mode(mode)
        .ocr_lang(&cli.ocr_lang)
        .encoding_label(&cli.encoding)
        .context("Invalid --encoding")?
        .min_row_bytes(cli.min_bytes)
        .cloud_region(&cli.region)
        .cloud_endpoint(&cli.endpoint)
        .request_timeout_secs(cli.timeout)
        .soffice(&cli.soffice)
        .strict(cli.strict);

    if let Some(ref dir) = cli.tessdata {
        builder = builder.tessdata_dir(dir);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
