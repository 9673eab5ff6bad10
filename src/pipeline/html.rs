//! HTML to plain text: parse, drop every tag, drop embedded newlines.

use crate::error::FileError;
use crate::pipeline::encoding::decode_markup;
use encoding_rs::Encoding;
use scraper::Html;
use std::path::Path;

/// Read `html_path` and return its tag-stripped text with `\n` removed.
///
/// The input encoding is sniffed (see [`decode_markup`]); `fallback` is
/// only used when nothing else settles it.
pub async fn extract_html_text(
    html_path: &Path,
    fallback: &'static Encoding,
) -> Result<String, FileError> {
    let bytes = tokio::fs::read(html_path)
        .await
        .map_err(|e| FileError::ReadFailed {
            path: html_path.to_path_buf(),
            detail: e.to_string(),
        })?;
    Ok(strip_markup(&decode_markup(&bytes, fallback)))
}

/// All text nodes of `markup` in document order, newlines removed.
pub fn strip_markup(markup: &str) -> String {
    let document = Html::parse_document(markup);
    document
        .root_element()
        .text()
        .flat_map(str::chars)
        .filter(|&c| c != '\n')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{BIG5, GBK, WINDOWS_1252};
    use tempfile::TempDir;

    #[test]
    fn tags_and_newlines_are_removed() {
        assert_eq!(strip_markup("<p>Hello\nWorld</p>"), "HelloWorld");
    }

    #[test]
    fn nested_elements_keep_document_order() {
        let html = "<html><head><title>T</title></head><body><div>a<b>b</b>c</div>\n<p>d</p></body></html>";
        assert_eq!(strip_markup(html), "Tabcd");
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(strip_markup("<p>1 &lt; 2 &amp;&amp; 3</p>"), "1 < 2 && 3");
    }

    #[tokio::test]
    async fn gbk_file_without_meta_is_decoded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("page.html");
        let (bytes, _, _) = GBK.encode("<p>我们的资料\n都是中文的文本</p>");
        std::fs::write(&path, &bytes).unwrap();

        assert_eq!(
            extract_html_text(&path, GBK).await.unwrap(),
            "我们的资料都是中文的文本"
        );
    }

    #[tokio::test]
    async fn big5_page_with_meta_charset_is_decoded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big5.html");
        let (bytes, _, _) =
            BIG5.encode("<html><head><meta charset=\"big5\"></head><body><p>中文資料</p></body></html>");
        std::fs::write(&path, &bytes).unwrap();

        assert_eq!(extract_html_text(&path, GBK).await.unwrap(), "中文資料");
    }

    #[tokio::test]
    async fn windows_1252_page_is_decoded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin.html");
        let (bytes, _, _) =
            WINDOWS_1252.encode("<html><body><p>Un café très célèbre, même en été.</p></body></html>");
        std::fs::write(&path, &bytes).unwrap();

        assert_eq!(
            extract_html_text(&path, GBK).await.unwrap(),
            "Un café très célèbre, même en été."
        );
    }

    #[tokio::test]
    async fn unreadable_file_is_a_file_error() {
        let err = extract_html_text(Path::new("/no/such/page.html"), GBK)
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::ReadFailed { .. }));
    }
}
