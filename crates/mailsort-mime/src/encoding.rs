//! Transfer and header decoding.
//!
//! Supports Base64, Quoted-Printable, RFC 2047 encoded words and any charset
//! label known to the WHATWG Encoding Standard. Decoding is lenient where
//! RFC 2045 allows it: malformed quoted-printable escapes are kept literally
//! and unknown charsets are read as UTF-8 with replacement characters.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use encoding_rs::{Encoding, REPLACEMENT, UTF_8};

use crate::error::Result;

/// Decodes Base64 data, ignoring embedded whitespace and line breaks.
///
/// # Errors
///
/// Returns an error if the input is not valid Base64.
pub fn decode_base64(data: &str) -> Result<Vec<u8>> {
    let cleaned: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// Soft line breaks are removed. An `=` not followed by two hex digits is
/// kept as-is.
#[must_use]
pub fn decode_quoted_printable(data: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(data.len());
    let mut i = 0;

    while i < data.len() {
        let byte = data[i];
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        match (data.get(i + 1), data.get(i + 2)) {
            // Soft line breaks
            (Some(b'\r'), Some(b'\n')) => i += 3,
            (Some(b'\n'), _) => i += 2,
            (Some(&hi), Some(&lo)) => match (hex_value(hi), hex_value(lo)) {
                (Some(hi), Some(lo)) => {
                    result.push((hi << 4) | lo);
                    i += 3;
                }
                _ => {
                    result.push(b'=');
                    i += 1;
                }
            },
            _ => {
                result.push(b'=');
                i += 1;
            }
        }
    }

    result
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Converts bytes in the given charset to a string.
///
/// The label is resolved the way browsers do (`ks_c_5601-1987` is EUC-KR,
/// `iso-8859-1` is Windows-1252). Missing and unknown labels, and labels that
/// map to the replacement encoding such as `iso-2022-kr`, fall back to UTF-8.
/// Invalid sequences become U+FFFD.
#[must_use]
pub fn decode_charset(bytes: &[u8], charset: Option<&str>) -> String {
    let encoding = charset
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .filter(|&encoding| encoding != REPLACEMENT)
        .unwrap_or(UTF_8);
    let (text, _) = encoding.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Decodes every RFC 2047 encoded word in a header value.
///
/// Format: `=?charset?encoding?encoded-text?=`. Whitespace between two
/// adjacent encoded words is dropped; words that fail to decode are left
/// untouched.
#[must_use]
pub fn decode_rfc2047(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut rest = value;
    let mut pending_space = String::new();
    let mut last_was_encoded = false;

    while !rest.is_empty() {
        let Some(start) = rest.find("=?") else {
            flush_space(&mut result, &mut pending_space);
            result.push_str(rest);
            break;
        };

        let (before, candidate) = rest.split_at(start);
        let Some((decoded, consumed)) = decode_encoded_word(candidate) else {
            flush_space(&mut result, &mut pending_space);
            result.push_str(before);
            result.push_str("=?");
            rest = &candidate[2..];
            last_was_encoded = false;
            continue;
        };

        if before.chars().all(char::is_whitespace) && last_was_encoded {
            pending_space.clear();
        } else {
            flush_space(&mut result, &mut pending_space);
            result.push_str(before);
        }
        result.push_str(&decoded);
        last_was_encoded = true;
        rest = &candidate[consumed..];

        // Hold trailing whitespace until we know whether another word follows.
        let trimmed = rest.trim_start();
        pending_space.push_str(&rest[..rest.len() - trimmed.len()]);
        rest = trimmed;
    }

    flush_space(&mut result, &mut pending_space);
    result
}

fn flush_space(result: &mut String, pending: &mut String) {
    result.push_str(pending);
    pending.clear();
}

/// Decodes one encoded word at the start of `input`, returning the text and
/// the number of bytes consumed.
fn decode_encoded_word(input: &str) -> Option<(String, usize)> {
    let inner = input.strip_prefix("=?")?;
    let (charset, rest) = inner.split_once('?')?;
    let (encoding, rest) = rest.split_once('?')?;
    let end = rest.find("?=")?;
    let text = &rest[..end];
    if text.contains(char::is_whitespace) {
        return None;
    }

    // RFC 2231 language suffix: charset*language
    let charset = charset.split('*').next().unwrap_or(charset);
    let bytes = match encoding.to_ascii_uppercase().as_str() {
        "B" => decode_base64(text).ok()?,
        "Q" => decode_quoted_printable(text.replace('_', " ").as_bytes()),
        _ => return None,
    };

    let consumed = input.len() - rest.len() + end + 2;
    Some((decode_charset(&bytes, Some(charset)), consumed))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_ignores_line_breaks() {
        let decoded = decode_base64("SGVsbG8s\r\nIFdvcmxkIQ==").unwrap();
        assert_eq!(decoded, b"Hello, World!");
        assert!(decode_base64("not base64!").is_err());
    }

    #[test]
    fn test_quoted_printable() {
        assert_eq!(decode_quoted_printable(b"H=C3=A9llo"), "Héllo".as_bytes());
        assert_eq!(decode_quoted_printable(b"soft=\r\nbreak"), b"softbreak");
        assert_eq!(decode_quoted_printable(b"soft=\nbreak"), b"softbreak");
    }

    #[test]
    fn test_quoted_printable_is_lenient() {
        assert_eq!(decode_quoted_printable(b"a=zz"), b"a=zz");
        assert_eq!(decode_quoted_printable(b"50% = half="), b"50% = half=");
    }

    #[test]
    fn test_charsets() {
        assert_eq!(decode_charset(&[0x63, 0x61, 0x66, 0xE9], Some("ISO-8859-1")), "café");
        assert_eq!(decode_charset("긴급".as_bytes(), Some("utf-8")), "긴급");
        assert_eq!(decode_charset(&[0xFF], None), "\u{FFFD}");
        assert_eq!(decode_charset(b"plain", Some("x-unknown")), "plain");
    }

    #[test]
    fn test_korean_charsets() {
        // "할인 이벤트" in EUC-KR
        let bytes = [
            0xC7, 0xD2, 0xC0, 0xCE, 0x20, 0xC0, 0xCC, 0xBA, 0xA5, 0xC6, 0xAE,
        ];
        assert_eq!(decode_charset(&bytes, Some("euc-kr")), "할인 이벤트");
        assert_eq!(decode_charset(&bytes, Some("EUC-KR")), "할인 이벤트");
        assert_eq!(decode_charset(&bytes, Some("ks_c_5601-1987")), "할인 이벤트");
    }

    #[test]
    fn test_windows_1252_smart_quotes() {
        let bytes = [0x93, b'h', b'i', 0x94, 0x80];
        assert_eq!(decode_charset(&bytes, Some("windows-1252")), "\u{201C}hi\u{201D}\u{20AC}");
        assert_eq!(decode_charset(&bytes, Some("cp1252")), "\u{201C}hi\u{201D}\u{20AC}");
    }

    #[test]
    fn test_replacement_labels_read_as_utf8() {
        assert_eq!(decode_charset(b"hello", Some("iso-2022-kr")), "hello");
    }

    #[test]
    fn test_rfc2047_base64() {
        // "긴급 공지" in UTF-8
        assert_eq!(decode_rfc2047("=?UTF-8?B?6ri06riJIOqzteyngA==?="), "긴급 공지");
    }

    #[test]
    fn test_rfc2047_euc_kr() {
        // "긴급 공지" in EUC-KR
        assert_eq!(decode_rfc2047("=?euc-kr?B?seSx3iCw+MH2?="), "긴급 공지");
        assert_eq!(
            decode_rfc2047("=?ks_c_5601-1987?Q?=B1=E4=B1=DE?="),
            "긴급"
        );
    }

    #[test]
    fn test_rfc2047_q_encoding() {
        assert_eq!(decode_rfc2047("=?utf-8?Q?Caf=C3=A9_menu?="), "Café menu");
    }

    #[test]
    fn test_rfc2047_mixed_text() {
        assert_eq!(
            decode_rfc2047("Re: =?utf-8?Q?urgent?= offer"),
            "Re: urgent offer"
        );
    }

    #[test]
    fn test_rfc2047_adjacent_words_join() {
        assert_eq!(
            decode_rfc2047("=?utf-8?Q?Big?= =?utf-8?Q?_Sale?="),
            "Big Sale"
        );
    }

    #[test]
    fn test_rfc2047_plain_and_broken() {
        assert_eq!(decode_rfc2047("Hello"), "Hello");
        assert_eq!(decode_rfc2047("=?broken"), "=?broken");
        assert_eq!(decode_rfc2047("=?utf-8?X?abc?="), "=?utf-8?X?abc?=");
    }
}
