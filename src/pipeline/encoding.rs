//! Lossy transcoding between UTF-8 and the legacy text-file encoding.
//!
//! Text files are written in a legacy encoding (GBK by default). Characters
//! it cannot represent are dropped rather than replaced with `?` or numeric
//! character references, and undecodable bytes are dropped on the way back.

use chardetng::EncodingDetector;
use encoding_rs::{DecoderResult, Encoding, EncoderResult, UTF_16BE, UTF_16LE, UTF_8};

/// Encode `text`, silently dropping unmappable characters.
pub fn encode_lossy(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    let mut encoder = encoding.new_encoder();
    let mut out = Vec::with_capacity(
        encoder
            .max_buffer_length_from_utf8_without_replacement(text.len())
            .unwrap_or(text.len() * 2),
    );
    let mut src = text;
    loop {
        let (result, read) = encoder.encode_from_utf8_to_vec_without_replacement(src, &mut out, true);
        src = &src[read..];
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::Unmappable(_) => continue,
            EncoderResult::OutputFull => {
                let extra = encoder
                    .max_buffer_length_from_utf8_without_replacement(src.len())
                    .unwrap_or(src.len() * 2);
                out.reserve(extra.max(16));
            }
        }
    }
    out
}

/// Decode `bytes`, silently dropping malformed sequences. No BOM sniffing.
pub fn decode_lossy(bytes: &[u8], encoding: &'static Encoding) -> String {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let mut out = String::with_capacity(
        decoder
            .max_utf8_buffer_length_without_replacement(bytes.len())
            .unwrap_or(bytes.len() * 3),
    );
    let mut src = bytes;
    loop {
        let (result, read) = decoder.decode_to_string_without_replacement(src, &mut out, true);
        src = &src[read..];
        match result {
            DecoderResult::InputEmpty => break,
            DecoderResult::Malformed(_, _) => continue,
            DecoderResult::OutputFull => {
                let extra = decoder
                    .max_utf8_buffer_length_without_replacement(src.len())
                    .unwrap_or(src.len() * 3);
                out.reserve(extra.max(16));
            }
        }
    }
    out
}

/// Decode an HTML file of unknown encoding.
///
/// Detection order:
/// 1. BOM
/// 2. valid UTF-8
/// 3. a `<meta charset>` or `http-equiv` declaration in the first 1024 bytes
/// 4. chardetng, when it is confident
/// 5. `fallback`, when it decodes the bytes without errors
/// 6. chardetng's best guess
pub fn decode_markup(bytes: &[u8], fallback: &'static Encoding) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_lossy(&bytes[bom_len..], encoding);
    }
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }
    if let Some(declared) = declared_charset(bytes).filter(|e| *e != UTF_8) {
        return decode_lossy(bytes, declared);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let (guess, confident) = detector.guess_assess(None, false);
    if !confident {
        if let Some(text) = fallback.decode_without_bom_handling_and_without_replacement(bytes) {
            return text.into_owned();
        }
    }
    decode_lossy(bytes, guess)
}

/// Bytes scanned for a `<meta>` charset declaration.
const META_PRESCAN_LEN: usize = 1024;

/// The encoding named by the first `<meta>` tag carrying a charset.
///
/// UTF-16 labels map to UTF-8: a page that reached this point is not UTF-16.
fn declared_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = bytes[..bytes.len().min(META_PRESCAN_LEN)].to_ascii_lowercase();
    let mut rest = head.as_slice();
    while let Some(start) = find(rest, b"<meta") {
        let tag = &rest[start..];
        let tag = &tag[..find(tag, b">").unwrap_or(tag.len())];
        if let Some(label) = charset_label(tag) {
            if let Some(encoding) = Encoding::for_label(label) {
                return Some(if encoding == UTF_16LE || encoding == UTF_16BE {
                    UTF_8
                } else {
                    encoding
                });
            }
        }
        rest = &rest[start + 5..];
    }
    None
}

/// Value of `charset=` inside a lowercased tag, unquoted.
fn charset_label(tag: &[u8]) -> Option<&[u8]> {
    let at = find(tag, b"charset")?;
    let value = tag[at + 7..].trim_ascii_start();
    let value = value.strip_prefix(b"=")?.trim_ascii_start();
    let value = value
        .strip_prefix(b"\"")
        .or_else(|| value.strip_prefix(b"'"))
        .unwrap_or(value);
    let end = value
        .iter()
        .position(|b| matches!(b, b'"' | b'\'' | b';' | b'/' | b'>') || b.is_ascii_whitespace())
        .unwrap_or(value.len());
    (end > 0).then(|| &value[..end])
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
