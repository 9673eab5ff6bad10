//! Collision-safe naming for extracted text files.
//!
//! A name that is already taken gets [`COLLISION_MARKER`] appended to its
//! stem (`a.txt` → `a#.txt` → `a##.txt` …) until it is free. Existence checks
//! are not atomic, so the final create uses `create_new` and probes again if
//! it loses a race: an existing file is never overwritten.

use crate::error::Doc2CsvError;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Appended to a file stem to make it unique.
pub const COLLISION_MARKER: char = '#';

/// Extension of extracted text files.
pub const TEXT_EXTENSION: &str = "txt";

/// Insert one marker before the extension: `dir/a.txt` → `dir/a#.txt`.
pub fn with_collision_marker(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
    name.push(COLLISION_MARKER.to_string());
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

/// Probe with markers until `is_taken` rejects the candidate.
pub fn resolve_collision_with(path: PathBuf, is_taken: impl Fn(&Path) -> bool) -> PathBuf {
    let mut candidate = path;
    while is_taken(&candidate) {
        candidate = with_collision_marker(&candidate);
    }
    candidate
}

/// Probe with markers until no file exists at the candidate path.
pub fn resolve_collision(path: PathBuf) -> PathBuf {
    resolve_collision_with(path, |p| p.exists())
}

/// Text path for `source` inside `text_dir`: same stem, `.txt` extension.
pub fn text_path_for(source: &Path, text_dir: &Path) -> PathBuf {
    let mut name: OsString = source.file_stem().map(|s| s.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(TEXT_EXTENSION);
    text_dir.join(name)
}

/// Pair every source with a proposed text path in `text_dir`.
///
/// Creates `text_dir` if needed. Proposed paths are collision-free at the
/// time of the call only; two sources sharing a stem get the same proposal
/// and are separated by [`create_text_file`] when written.
pub fn pair_with_text_paths(
    sources: &[PathBuf],
    text_dir: &Path,
) -> Result<Vec<(PathBuf, PathBuf)>, Doc2CsvError> {
    std::fs::create_dir_all(text_dir).map_err(|e| Doc2CsvError::TextDirFailed {
        path: text_dir.to_path_buf(),
        source: e,
    })?;

    Ok(sources
        .iter()
        .map(|source| {
            let proposed = resolve_collision(text_path_for(source, text_dir));
            (source.clone(), proposed)
        })
        .collect())
}

/// Create the text file at `proposed`, or at the next free marker name.
///
/// Returns the path actually created together with the open handle.
pub fn create_text_file(proposed: &Path) -> io::Result<(PathBuf, File)> {
    let mut candidate = resolve_collision(proposed.to_path_buf());
    loop {
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => {
                if candidate != proposed {
                    debug!(
                        "Renamed {} → {} to avoid a collision",
                        proposed.display(),
                        candidate.display()
                    );
                }
                return Ok((candidate, file));
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                candidate = resolve_collision(with_collision_marker(&candidate));
            }
            Err(e) => return Err(e),
        }
    }
}
