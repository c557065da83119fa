//! Errors raised while reading a message.

/// Result alias for message parsing and decoding.
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a message or one of its parts could not be read.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input has no header section.
    #[error("Message has no headers")]
    NoHeaders,

    /// A `Content-Type` value lacks a type or subtype.
    #[error("Malformed content type: {0}")]
    InvalidContentType(String),

    /// A multipart entity does not name its boundary.
    #[error("Multipart entity has no boundary")]
    MissingBoundary,

    /// Multipart entities are nested deeper than the parser follows.
    #[error("Multipart nesting exceeds {max} levels")]
    TooDeep {
        /// Deepest nesting level accepted.
        max: usize,
    },

    /// A Base64 body is malformed.
    #[error("Bad Base64 body: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// An HTML body could not be converted to text.
    #[error("Cannot convert HTML body: {0}")]
    Html(#[source] std::io::Error),
}
