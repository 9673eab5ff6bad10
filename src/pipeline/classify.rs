//! Classification: walk the input tree and bucket files by extension.

use crate::error::Doc2CsvError;
use crate::output::SourceKind;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Source paths grouped by format.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classified {
    pub images: Vec<PathBuf>,
    pub pdfs: Vec<PathBuf>,
    pub legacy_documents: Vec<PathBuf>,
    pub documents: Vec<PathBuf>,
    pub markup: Vec<PathBuf>,
}

impl Classified {
    pub fn push(&mut self, kind: SourceKind, path: PathBuf) {
        self.bucket_mut(kind).push(path);
    }

    pub fn bucket(&self, kind: SourceKind) -> &[PathBuf] {
        match kind {
            SourceKind::Image => &self.images,
            SourceKind::Pdf => &self.pdfs,
            SourceKind::LegacyDocument => &self.legacy_documents,
            SourceKind::Document => &self.documents,
            SourceKind::Markup => &self.markup,
        }
    }

    fn bucket_mut(&mut self, kind: SourceKind) -> &mut Vec<PathBuf> {
        match kind {
            SourceKind::Image => &mut self.images,
            SourceKind::Pdf => &mut self.pdfs,
            SourceKind::LegacyDocument => &mut self.legacy_documents,
            SourceKind::Document => &mut self.documents,
            SourceKind::Markup => &mut self.markup,
        }
    }

    /// Files that go through an extractor. Legacy documents are counted
    /// through the docx they were converted to.
    pub fn extractable(&self) -> usize {
        self.images.len() + self.pdfs.len() + self.documents.len() + self.markup.len()
    }
}

/// Recursively classify every file under `root`.
///
/// Unrecognised extensions are skipped. Symbolic links to directories are
/// not followed, so a link cycle cannot recurse forever.
pub fn classify_tree(root: &Path) -> Result<Classified, Doc2CsvError> {
    if !root.is_dir() {
        return Err(Doc2CsvError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut classified = Classified::default();
    walk(root, &mut classified)?;

    info!(
        "Classified {}: {} images, {} pdfs, {} doc, {} docx, {} html",
        root.display(),
        classified.images.len(),
        classified.pdfs.len(),
        classified.legacy_documents.len(),
        classified.documents.len(),
        classified.markup.len()
    );
    Ok(classified)
}

fn walk(dir: &Path, out: &mut Classified) -> Result<(), Doc2CsvError> {
    let walk_err = |e| Doc2CsvError::WalkFailed {
        path: dir.to_path_buf(),
        source: e,
    };

    for entry in std::fs::read_dir(dir).map_err(walk_err)? {
        let entry = entry.map_err(walk_err)?;
        let path = entry.path();

        if entry.file_type().map_err(walk_err)?.is_dir() {
            walk(&path, out)?;
            continue;
        }

        let kind = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(SourceKind::from_extension);
        match kind {
            Some(kind) => {
                debug!("{:?}: {}", kind, path.display());
                out.push(kind, path);
            }
            None => debug!("Skipping unrecognised file {}", path.display()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let p = root.join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(&p, b"x").unwrap();
        p
    }

    #[test]
    fn every_recognised_file_lands_in_one_bucket() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let files = [
            "a.png", "b.jpg", "c.jpeg", "d.pdf", "e.doc", "f.docx", "g.html",
            "sub/h.png", "sub/deeper/i.pdf", "sub/j.html",
        ];
        for f in files {
            touch(root, f);
        }
        for ignored in ["notes.txt", "IMG.PNG", "page.htm", "archive.zip", "sub/noext"] {
            touch(root, ignored);
        }

        let c = classify_tree(root).unwrap();
        assert_eq!(c.images.len(), 4);
        assert_eq!(c.pdfs.len(), 2);
        assert_eq!(c.legacy_documents.len(), 1);
        assert_eq!(c.documents.len(), 1);
        assert_eq!(c.markup.len(), 2);

        let mut all: Vec<_> = [
            &c.images,
            &c.pdfs,
            &c.legacy_documents,
            &c.documents,
            &c.markup,
        ]
        .iter()
        .flat_map(|b| b.iter().cloned())
        .collect();
        all.sort();
        let mut expected: Vec<_> = files.iter().map(|f| root.join(f)).collect();
        expected.sort();
        assert_eq!(all, expected);
    }

    #[test]
    fn empty_tree_has_empty_buckets() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "readme.md");
        let c = classify_tree(dir.path()).unwrap();
        assert_eq!(c.extractable(), 0);
        assert!(c.legacy_documents.is_empty());
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = classify_tree(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Doc2CsvError::DirectoryNotFound { .. }));
    }
}
