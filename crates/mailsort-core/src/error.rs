//! Error types for the classification engine.

use thiserror::Error;

/// Errors that can occur when building or calling a classifier.
///
/// Classifying two strings never fails; errors only come from the host
/// boundary (wrongly typed arguments) and from building category tables.
#[derive(Debug, Error)]
pub enum Error {
    /// An argument passed across the dynamic host boundary had the wrong type.
    #[error("Invalid input: `{field}` must be {expected}, got {found}")]
    InvalidInput {
        /// Name of the offending argument.
        field: &'static str,
        /// JSON type that was required.
        expected: &'static str,
        /// JSON type that was supplied instead.
        found: &'static str,
    },

    /// Category table failed validation.
    #[error("Invalid category table: {0}")]
    Table(String),

    /// A pattern signal could not be compiled.
    #[error("Invalid pattern for signal `{signal}`: {source}")]
    Pattern {
        /// Signal that owns the pattern.
        signal: String,
        /// Underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// Table configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    /// Returns true if this error was caused by a wrongly typed argument.
    #[must_use]
    pub const fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
