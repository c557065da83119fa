//! MIME message structure and text extraction.

use std::fmt;

use crate::content_type::{ContentType, Disposition};
use crate::encoding::{decode_base64, decode_charset, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;

/// Maximum multipart nesting depth.
const MAX_DEPTH: usize = 16;

/// `Content-Transfer-Encoding` of a part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// `7bit`, also assumed when the header is absent or unknown.
    SevenBit,
    /// `8bit`.
    EightBit,
    /// `base64`.
    Base64,
    /// `quoted-printable`.
    QuotedPrintable,
    /// `binary`.
    Binary,
}

impl TransferEncoding {
    /// Reads a header value, case-insensitively.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "8bit" => Self::EightBit,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }

    /// Returns the header token for this encoding.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SevenBit => "7bit",
            Self::EightBit => "8bit",
            Self::Base64 => "base64",
            Self::QuotedPrintable => "quoted-printable",
            Self::Binary => "binary",
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message entity: headers plus either a body or child parts.
#[derive(Debug, Clone)]
pub struct Part {
    /// Part headers.
    pub headers: Headers,
    /// Raw (still transfer-encoded) body of a leaf part.
    pub body: Vec<u8>,
    /// Child parts of a multipart entity.
    pub parts: Vec<Part>,
}

impl Part {
    fn parse(raw: &[u8], depth: usize) -> Result<Self> {
        if depth > MAX_DEPTH {
            return Err(Error::TooDeep { max: MAX_DEPTH });
        }

        let (head, body) = split_head_body(raw);
        let headers = Headers::parse(&String::from_utf8_lossy(head));
        let mut part = Self {
            headers,
            body: Vec::new(),
            parts: Vec::new(),
        };

        let content_type = part.content_type();
        if content_type.is_multipart() {
            let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
            for section in split_multipart(body, boundary) {
                part.parts.push(Self::parse(section, depth + 1)?);
            }
        } else {
            part.body = body.to_vec();
        }

        Ok(part)
    }

    /// Returns the content type, defaulting to `text/plain` when absent or malformed.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.headers
            .get("content-type")
            .and_then(|value| ContentType::parse(value).ok())
            .unwrap_or_else(ContentType::text_plain)
    }

    /// Returns the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse)
    }

    /// Returns the content disposition, if present.
    #[must_use]
    pub fn disposition(&self) -> Option<Disposition> {
        self.headers.get("content-disposition").map(Disposition::parse)
    }

    /// Returns true if this part is an attachment rather than message text.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.disposition().is_some_and(|d| d.is_attachment())
    }

    /// Undoes the transfer encoding of a leaf body.
    ///
    /// # Errors
    ///
    /// Returns an error if a Base64 body is malformed.
    pub fn decode_body(&self) -> Result<Vec<u8>> {
        match self.transfer_encoding() {
            TransferEncoding::Base64 => decode_base64(&String::from_utf8_lossy(&self.body)),
            TransferEncoding::QuotedPrintable => Ok(decode_quoted_printable(&self.body)),
            _ => Ok(self.body.clone()),
        }
    }

    /// Decodes the body as text using the part's charset.
    ///
    /// # Errors
    ///
    /// Returns an error if a Base64 body is malformed.
    pub fn body_text(&self) -> Result<String> {
        let bytes = self.decode_body()?;
        Ok(decode_charset(&bytes, self.content_type().charset()))
    }

    /// Iterates over this part and all descendants, depth first.
    pub fn walk(&self) -> Box<dyn Iterator<Item = &Self> + '_> {
        Box::new(std::iter::once(self).chain(self.parts.iter().flat_map(Self::walk)))
    }

    fn is_leaf(&self) -> bool {
        self.parts.is_empty() && !self.content_type().is_multipart()
    }
}

/// Parsed MIME message.
#[derive(Debug, Clone)]
pub struct Message {
    root: Part,
}

impl Message {
    /// Parses a message from text.
    ///
    /// # Errors
    ///
    /// Returns an error if the input has no header section, a multipart
    /// entity has no boundary, or nesting is too deep.
    pub fn parse(raw: &str) -> Result<Self> {
        Self::parse_bytes(raw.as_bytes())
    }

    /// Parses a message from raw bytes (8-bit bodies need not be UTF-8).
    ///
    /// # Errors
    ///
    /// Returns an error if the input has no header section, a multipart
    /// entity has no boundary, or nesting is too deep.
    pub fn parse_bytes(raw: &[u8]) -> Result<Self> {
        let root = Part::parse(raw, 0)?;
        if root.headers.is_empty() {
            return Err(Error::NoHeaders);
        }
        Ok(Self { root })
    }

    /// Returns the top-level headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.root.headers
    }

    /// Returns the top-level entity.
    #[must_use]
    pub const fn root(&self) -> &Part {
        &self.root
    }

    /// Returns the decoded Subject header, or an empty string if absent.
    #[must_use]
    pub fn subject(&self) -> String {
        self.root.headers.get_decoded("subject").unwrap_or_default()
    }

    /// Returns the decoded From header.
    #[must_use]
    pub fn from(&self) -> Option<String> {
        self.root.headers.get_decoded("from")
    }

    /// Returns the message text.
    ///
    /// Prefers the first `text/plain` part, falls back to the first
    /// `text/html` part converted to text, and returns an empty string when
    /// the message has neither. Attachments are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the chosen part cannot be decoded or converted.
    pub fn body_text(&self) -> Result<String> {
        let text_leaves = || {
            self.root
                .walk()
                .filter(|part| part.is_leaf() && !part.is_attachment())
        };

        if let Some(plain) = text_leaves().find(|p| p.content_type().is("text", "plain")) {
            return plain.body_text();
        }
        if let Some(html) = text_leaves().find(|p| p.content_type().is("text", "html")) {
            return htmd::convert(&html.body_text()?).map_err(Error::Html);
        }
        Ok(String::new())
    }

    /// Returns the file names of all attachments.
    #[must_use]
    pub fn attachments(&self) -> Vec<String> {
        self.root
            .walk()
            .filter_map(|part| {
                let from_disposition = part
                    .disposition()
                    .filter(Disposition::is_attachment)
                    .and_then(|d| d.filename().map(ToString::to_string));
                from_disposition.or_else(|| {
                    part.content_type()
                        .parameters
                        .get("name")
                        .cloned()
                })
            })
            .collect()
    }
}

/// Splits an entity at the first empty line.
fn split_head_body(raw: &[u8]) -> (&[u8], &[u8]) {
    // An entity that starts with an empty line has no headers.
    if raw.starts_with(b"\r\n") {
        return (&[], &raw[2..]);
    }
    if raw.starts_with(b"\n") {
        return (&[], &raw[1..]);
    }

    let mut line_start = 0;
    while line_start < raw.len() {
        let line_end = raw[line_start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(raw.len(), |pos| line_start + pos + 1);
        let line = &raw[line_start..line_end];
        if line == b"\n" || line == b"\r\n" {
            return (&raw[..line_start], &raw[line_end..]);
        }
        line_start = line_end;
    }

    (raw, &[])
}

/// Splits a multipart body into its sections, dropping preamble and epilogue.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let mut sections = Vec::new();
    let mut section_start: Option<usize> = None;
    let mut line_start = 0;

    while line_start < body.len() {
        let line_end = body[line_start..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(body.len(), |pos| line_start + pos + 1);
        let line = trim_line_end(&body[line_start..line_end]);

        if let Some(rest) = line.strip_prefix(delimiter.as_bytes()) {
            let rest = trim_trailing_space(rest);
            if rest.is_empty() || rest == b"--" {
                if let Some(start) = section_start.take() {
                    sections.push(trim_final_newline(&body[start..line_start]));
                }
                if rest == b"--" {
                    break;
                }
                section_start = Some(line_end);
            }
        }
        line_start = line_end;
    }

    // Unterminated final section
    if let Some(start) = section_start {
        sections.push(&body[start..]);
    }

    sections
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn trim_trailing_space(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|b| !matches!(b, b' ' | b'\t'))
        .map_or(0, |pos| pos + 1);
    &bytes[..end]
}

/// The line break before a delimiter belongs to the delimiter.
fn trim_final_newline(section: &[u8]) -> &[u8] {
    let section = section.strip_suffix(b"\n").unwrap_or(section);
    section.strip_suffix(b"\r").unwrap_or(section)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_encoding_tokens() {
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::SevenBit);
        assert_eq!(TransferEncoding::QuotedPrintable.to_string(), "quoted-printable");
        assert_eq!(TransferEncoding::parse(" BASE64 "), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("Quoted-Printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("x-unknown"), TransferEncoding::SevenBit);
    }

    #[test]
    fn test_split_head_body() {
        let (head, body) = split_head_body(b"Subject: a\r\n\r\nhello\r\n");
        assert_eq!(head, b"Subject: a\r\n");
        assert_eq!(body, b"hello\r\n");

        let (head, body) = split_head_body(b"\nonly body");
        assert!(head.is_empty());
        assert_eq!(body, b"only body");

        let (head, body) = split_head_body(b"Subject: no body");
        assert_eq!(head, b"Subject: no body");
        assert!(body.is_empty());
    }

    #[test]
    fn test_split_multipart() {
        let body = b"preamble\r\n--b\r\nA\r\n--b\r\nB\r\n--b--\r\nepilogue";
        let sections = split_multipart(body, "b");
        assert_eq!(sections, vec![&b"A"[..], &b"B"[..]]);
    }

    #[test]
    fn test_split_multipart_ignores_lookalike_lines() {
        let body = b"--b\nline --b inside\n--bx\n--b--\n";
        let sections = split_multipart(body, "b");
        assert_eq!(sections, vec![&b"line --b inside\n--bx"[..]]);
    }

    #[test]
    fn test_single_part_message() {
        let message = Message::parse(
            "Subject: Weekly update\r\nContent-Type: text/plain; charset=utf-8\r\n\r\nAll good.\r\n",
        )
        .unwrap();
        assert_eq!(message.subject(), "Weekly update");
        assert_eq!(message.body_text().unwrap(), "All good.\r\n");
        assert!(message.attachments().is_empty());
    }

    #[test]
    fn test_missing_headers_rejected() {
        assert!(matches!(Message::parse("\r\njust text"), Err(Error::NoHeaders)));
        assert!(matches!(Message::parse(""), Err(Error::NoHeaders)));
    }

    #[test]
    fn test_multipart_without_boundary_rejected() {
        let raw = "Subject: x\nContent-Type: multipart/mixed\n\nbody";
        assert!(matches!(Message::parse(raw), Err(Error::MissingBoundary)));
    }

    #[test]
    fn test_walk_visits_nested_parts() {
        let raw = "Subject: x\n\
                   Content-Type: multipart/mixed; boundary=outer\n\
                   \n\
                   --outer\n\
                   Content-Type: multipart/alternative; boundary=inner\n\
                   \n\
                   --inner\n\
                   Content-Type: text/plain\n\
                   \n\
                   plain\n\
                   --inner--\n\
                   --outer--\n";
        let message = Message::parse(raw).unwrap();
        assert_eq!(message.root().walk().count(), 3);
        assert_eq!(message.body_text().unwrap(), "plain");
    }
}
