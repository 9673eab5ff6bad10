//! PDF text extraction via pdfium's text layer.
//!
//! Pages are concatenated in order; no page markers are kept. Scanned PDFs
//! without a text layer simply yield empty text and fall under the table's
//! size threshold.
//!
//! pdfium is a C++ library with thread-local state, so binding and
//! extraction run on tokio's blocking pool like every other native
//! collaborator. The library is bound once per run through [`PdfEngine`].

use crate::error::FileError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A pdfium binding shared by every PDF of a run.
///
/// A failed bind is kept, and each PDF handed to the engine fails with it.
#[derive(Clone)]
pub struct PdfEngine {
    pdfium: Result<Arc<Pdfium>, String>,
}

impl PdfEngine {
    /// Bind pdfium: explicit library, then `./`, then the system library.
    pub async fn bind(pdfium_lib: Option<&Path>) -> Self {
        let lib = pdfium_lib.map(Path::to_path_buf);
        let pdfium = tokio::task::spawn_blocking(move || bind_pdfium(lib.as_deref()))
            .await
            .map_err(|e| format!("bind task panicked: {e}"))
            .and_then(|bound| bound.map_err(|e| format!("{e:?}")))
            .map(Arc::new);
        Self { pdfium }
    }

    /// The bind error, if pdfium could not be loaded.
    pub fn bind_error(&self) -> Option<&str> {
        self.pdfium.as_ref().err().map(String::as_str)
    }

    /// Extract all text from `pdf_path`.
    pub async fn extract_text(&self, pdf_path: &Path) -> Result<String, FileError> {
        let pdfium = match self.pdfium {
            Ok(ref p) => Arc::clone(p),
            Err(ref e) => {
                return Err(FileError::PdfFailed {
                    path: pdf_path.to_path_buf(),
                    detail: format!("cannot bind pdfium: {e}"),
                })
            }
        };
        let path = pdf_path.to_path_buf();

        tokio::task::spawn_blocking(move || extract_blocking(&pdfium, &path))
            .await
            .map_err(|e| FileError::PdfFailed {
                path: pdf_path.to_path_buf(),
                detail: format!("PDF task panicked: {e}"),
            })?
    }
}

impl std::fmt::Debug for PdfEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfEngine")
            .field("bound", &self.pdfium.is_ok())
            .finish()
    }
}

fn bind_pdfium(lib: Option<&Path>) -> Result<Pdfium, PdfiumError> {
    let bindings = match lib {
        Some(path) => Pdfium::bind_to_library(path)?,
        None => Pdfium::bind_to_library(&Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())?,
    };
    Ok(Pdfium::new(bindings))
}

fn extract_blocking(pdfium: &Pdfium, pdf_path: &Path) -> Result<String, FileError> {
    let fail = |detail: String| FileError::PdfFailed {
        path: PathBuf::from(pdf_path),
        detail,
    };

    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| fail(format!("{e:?}")))?;

    let mut text = String::new();
    for (idx, page) in document.pages().iter().enumerate() {
        let page_text = page
            .text()
            .map_err(|e| fail(format!("page {}: {e:?}", idx + 1)))?;
        text.push_str(&page_text.all());
        text.push('\n');
    }

    debug!("{}: {} chars of text", pdf_path.display(), text.len());
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unbindable_library_is_a_file_error() {
        let engine = PdfEngine::bind(Some(Path::new("/definitely/not/libpdfium.so"))).await;
        assert!(engine.bind_error().is_some());

        let err = engine.extract_text(Path::new("missing.pdf")).await.unwrap_err();
        assert!(matches!(err, FileError::PdfFailed { .. }));
        assert!(err.to_string().contains("cannot bind pdfium"), "got: {err}");
    }

    #[tokio::test]
    async fn bind_failure_is_reported_for_every_pdf() {
        let engine = PdfEngine::bind(Some(Path::new("/definitely/not/libpdfium.so"))).await;

        for name in ["a.pdf", "b.pdf"] {
            match engine.extract_text(Path::new(name)).await {
                Err(FileError::PdfFailed { path, detail }) => {
                    assert_eq!(path, Path::new(name));
                    assert!(detail.starts_with("cannot bind pdfium"), "got: {detail}");
                }
                other => panic!("expected PdfFailed, got {other:?}"),
            }
        }
    }

    #[test]
    fn debug_hides_the_binding() {
        let engine = PdfEngine {
            pdfium: Err("gone".into()),
        };
        assert_eq!(format!("{engine:?}"), "PdfEngine { bound: false }");
    }
}
