//! Content-Type and Content-Disposition values.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

/// MIME content type, e.g. `text/plain; charset=utf-8`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (lowercase), e.g. `text`.
    pub main_type: String,
    /// Subtype (lowercase), e.g. `plain`.
    pub sub_type: String,
    /// Parameters with lowercase names.
    pub parameters: BTreeMap<String, String>,
}

impl ContentType {
    /// Creates a content type without parameters.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: BTreeMap::new(),
        }
    }

    /// The RFC 2045 default, `text/plain`.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain")
    }

    /// Returns the charset parameter.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameters.get("charset").map(String::as_str)
    }

    /// Returns the boundary parameter.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get("boundary").map(String::as_str)
    }

    /// Returns true for `multipart/*`.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }

    /// Returns true if this is `main/sub`.
    #[must_use]
    pub fn is(&self, main_type: &str, sub_type: &str) -> bool {
        self.main_type == main_type && self.sub_type == sub_type
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="value 2"`
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let (type_str, params) = s.split_once(';').unwrap_or((s, ""));
        let (main_type, sub_type) = type_str
            .trim()
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(s.to_string()))?;

        let main_type = main_type.trim().to_ascii_lowercase();
        let sub_type = sub_type.trim().to_ascii_lowercase();
        if main_type.is_empty() || sub_type.is_empty() {
            return Err(Error::InvalidContentType(s.to_string()));
        }

        Ok(Self {
            main_type,
            sub_type,
            parameters: parameters(params),
        })
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;
        for (key, value) in &self.parameters {
            write!(f, "; {key}=\"{value}\"")?;
        }
        Ok(())
    }
}

/// Content-Disposition value, e.g. `attachment; filename="report.pdf"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disposition {
    /// Disposition type (lowercase), e.g. `attachment` or `inline`.
    pub kind: String,
    /// Parameters with lowercase names.
    pub parameters: BTreeMap<String, String>,
}

impl Disposition {
    /// Parses a Content-Disposition value. Never fails; a missing type is empty.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let (kind, params) = s.split_once(';').unwrap_or((s, ""));
        Self {
            kind: kind.trim().to_ascii_lowercase(),
            parameters: parameters(params),
        }
    }

    /// Returns true for `attachment`.
    #[must_use]
    pub fn is_attachment(&self) -> bool {
        self.kind == "attachment"
    }

    /// Returns the filename parameter.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.parameters.get("filename").map(String::as_str)
    }
}

/// Parses `; key=value; key="quoted value"` parameter lists.
fn parameters(s: &str) -> BTreeMap<String, String> {
    s.split(';')
        .filter_map(|param| param.split_once('='))
        .map(|(key, value)| {
            (
                key.trim().to_ascii_lowercase(),
                value.trim().trim_matches('"').to_string(),
            )
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}
