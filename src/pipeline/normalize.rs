//! In-place normalisation of the text working directory.
//!
//! Every regular file in the directory loses its `\n`, `\r` and `\t` bytes.
//! The stripped content goes to a temporary file in the same directory which
//! then replaces the original, so a crash never leaves a half-written text
//! file behind.
//!
//! Working on bytes is safe for the ASCII-compatible encodings accepted by
//! [`crate::config::RunConfigBuilder::build`]: those bytes never appear
//! inside a multi-byte sequence.

use crate::error::Doc2CsvError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Bytes removed from every text file.
const STRIPPED: [u8; 3] = [b'\n', b'\r', b'\t'];

/// `bytes` without line breaks and tabs.
pub fn strip_breaks(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .copied()
        .filter(|b| !STRIPPED.contains(b))
        .collect()
}

/// Normalise every file in `text_dir`. Returns how many were rewritten.
///
/// Files without anything to strip are left untouched.
pub fn normalize_dir(text_dir: &Path) -> Result<usize, Doc2CsvError> {
    let mut rewritten = 0;
    for path in list_files(text_dir)? {
        let fail = |e| Doc2CsvError::NormalizeFailed {
            path: path.clone(),
            source: e,
        };

        let original = std::fs::read(&path).map_err(fail)?;
        let stripped = strip_breaks(&original);
        if stripped.len() == original.len() {
            continue;
        }

        let mut tmp = NamedTempFile::new_in(text_dir).map_err(fail)?;
        tmp.write_all(&stripped).map_err(fail)?;
        tmp.persist(&path).map_err(|e| fail(e.error))?;

        debug!(
            "Normalised {} ({} → {} bytes)",
            path.display(),
            original.len(),
            stripped.len()
        );
        rewritten += 1;
    }
    Ok(rewritten)
}

/// Regular files directly inside `dir`, in listing order.
pub(crate) fn list_files(dir: &Path) -> Result<Vec<PathBuf>, Doc2CsvError> {
    let fail = |e| Doc2CsvError::TextDirFailed {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(fail)? {
        let entry = entry.map_err(fail)?;
        if entry.file_type().map_err(fail)?.is_file() {
            files.push(entry.path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn strips_breaks_and_tabs_only() {
        assert_eq!(strip_breaks(b"a b\r\nc\td\n"), b"a bcd");
    }

    #[test]
    fn gbk_trail_bytes_survive() {
        // 中文 in GBK; no byte is a break or tab.
        let gbk = [0xD6, 0xD0, b'\n', 0xCE, 0xC4];
        assert_eq!(strip_breaks(&gbk), vec![0xD6, 0xD0, 0xCE, 0xC4]);
    }

    #[test]
    fn rewrites_files_in_place() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, b"line one\nline\ttwo\n").unwrap();
        std::fs::write(&b, b"already flat").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        assert_eq!(normalize_dir(dir.path()).unwrap(), 1);
        assert_eq!(std::fs::read(&a).unwrap(), b"line onelinetwo");
        assert_eq!(std::fs::read(&b).unwrap(), b"already flat");

        // No temporaries left behind.
        assert_eq!(list_files(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn missing_dir_is_fatal() {
        let err = normalize_dir(Path::new("/no/such/txts")).unwrap_err();
        assert!(matches!(err, Doc2CsvError::TextDirFailed { .. }));
    }
}
