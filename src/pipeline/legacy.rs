//! Legacy `.doc` handling: rename out of the way, convert to `.docx`.
//!
//! Conversion is delegated to a [`DocumentConverter`]. The default one drives
//! LibreOffice in headless mode with a private profile directory that lives
//! exactly as long as the converter, so one instance serves the whole run
//! and nothing is left behind afterwards.

use crate::error::Doc2CsvError;
use crate::pipeline::classify::Classified;
use crate::pipeline::naming::resolve_collision_with;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, info};

/// Converts a legacy word-processor document to `.docx`.
///
/// Implementations block; the pipeline calls them from the blocking pool.
pub trait DocumentConverter: Send + Sync {
    /// Convert `doc` and return the path of the new `.docx`.
    ///
    /// The result is expected next to `doc` with the same stem.
    fn convert_to_docx(&self, doc: &Path) -> Result<PathBuf, Doc2CsvError>;
}

/// LibreOffice (`soffice --headless --convert-to docx`).
pub struct SofficeConverter {
    program: PathBuf,
    profile: TempDir,
}

impl SofficeConverter {
    pub fn new(program: impl Into<PathBuf>) -> Result<Self, Doc2CsvError> {
        let profile = tempfile::Builder::new()
            .prefix("doc2csv-soffice-")
            .tempdir()
            .map_err(|e| Doc2CsvError::Internal(format!("soffice profile dir: {e}")))?;
        Ok(Self {
            program: program.into(),
            profile,
        })
    }

    fn profile_arg(&self) -> String {
        let p = self.profile.path().to_string_lossy().replace('\\', "/");
        if p.starts_with('/') {
            format!("-env:UserInstallation=file://{p}")
        } else {
            format!("-env:UserInstallation=file:///{p}")
        }
    }
}

impl DocumentConverter for SofficeConverter {
    fn convert_to_docx(&self, doc: &Path) -> Result<PathBuf, Doc2CsvError> {
        let outdir = doc
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let output = Command::new(&self.program)
            .arg("--headless")
            .arg(self.profile_arg())
            .args(["--convert-to", "docx", "--outdir"])
            .arg(outdir)
            .arg(doc)
            .output()
            .map_err(|e| Doc2CsvError::ConversionFailed {
                path: doc.to_path_buf(),
                detail: format!("could not run '{}': {e}", self.program.display()),
            })?;

        if !output.status.success() {
            return Err(Doc2CsvError::ConversionFailed {
                path: doc.to_path_buf(),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let docx = doc.with_extension("docx");
        if !docx.exists() {
            return Err(Doc2CsvError::ConversionFailed {
                path: doc.to_path_buf(),
                detail: format!("'{}' was not produced", docx.display()),
            });
        }
        Ok(docx)
    }
}

/// Rename and convert every legacy document, merging the results into
/// `classified.documents`.
///
/// Each `.doc` is first renamed (with collision markers) so that its `.docx`
/// twin cannot clash with a docx already in the list or on disk. The legacy
/// bucket is updated to the renamed paths. The first conversion failure
/// aborts.
pub fn convert_legacy_documents(
    classified: &mut Classified,
    converter: &dyn DocumentConverter,
) -> Result<usize, Doc2CsvError> {
    let legacy = std::mem::take(&mut classified.legacy_documents);
    let total = legacy.len();

    for doc in legacy {
        let planned = resolve_collision_with(doc.with_extension("docx"), |p| {
            let renamed = p.with_extension("doc");
            classified.documents.iter().any(|d| d == p)
                || p.exists()
                || (renamed != doc && renamed.exists())
        });
        let renamed = planned.with_extension("doc");

        if renamed != doc {
            debug!("Renaming {} → {}", doc.display(), renamed.display());
            std::fs::rename(&doc, &renamed).map_err(|e| Doc2CsvError::RenameFailed {
                from: doc.clone(),
                to: renamed.clone(),
                source: e,
            })?;
        }

        let docx = converter.convert_to_docx(&renamed)?;
        debug!("Converted {} → {}", renamed.display(), docx.display());

        classified.documents.push(docx);
        classified.legacy_documents.push(renamed);
    }

    if total > 0 {
        info!("Converted {} legacy documents to docx", total);
    }
    Ok(total)
}
