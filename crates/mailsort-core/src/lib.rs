//! # mailsort-core
//!
//! Deterministic, rule-based email classification engine.
//!
//! Given a subject and a body, the engine picks one category from a fixed
//! taxonomy and reports how dominant that choice was as a confidence in
//! `[0, 1]`. The pipeline is:
//!
//! 1. **Tokenizer** ([`token`]) - Unicode-aware normalization into tokens
//! 2. **Feature extraction** ([`signal`]) - sparse, bounded signal values
//! 3. **Scoring** ([`score`]) - linear weights per category
//! 4. **Calibration** ([`decide`]) - winner, tie-break and confidence
//! 5. **Facade** ([`Classifier`]) - the single entry point
//!
//! Classification is pure and synchronous: no I/O, no locks on the hot path,
//! and identical inputs always give identical results.
//!
//! ## Quick Start
//!
//! ```ignore
//! let result = mailsort_core::classify("urgent offer", "reply ASAP!");
//! assert_eq!(result.category, "긴급");
//! ```
//!
//! ## Custom Tables
//!
//! ```ignore
//! use std::sync::Arc;
//! use mailsort_core::{Calibrator, CategoryTable, Classifier};
//!
//! let table = CategoryTable::from_json(&std::fs::read_to_string("table.json")?)?;
//! let classifier = Classifier::new(Arc::new(table), Calibrator::new().with_min_confidence(0.4));
//! let result = classifier.classify("Weekend sale", "30% off everything");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod classifier;
pub mod decide;
mod error;
pub mod score;
pub mod signal;
pub mod table;
pub mod token;

pub use classifier::{ClassificationResult, Classifier, Decision};
pub use decide::{Calibrator, Fallback, Verdict};
pub use error::{Error, Result};
pub use score::RawScores;
pub use signal::{Scope, SignalDef, SignalKind, SignalRegistry, SignalVector};
pub use table::{
    Category, CategoryId, CategoryTable, CategoryTableBuilder, MAX_WEIGHT, TableConfig,
};
pub use token::{Field, Token, TokenKind, TokenStream};

/// Classifies a subject/body pair with the built-in table.
#[must_use]
pub fn classify(subject: &str, body: &str) -> ClassificationResult {
    Classifier::builtin().classify(subject, body)
}

/// Classifies dynamically typed arguments with the built-in table.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if either argument is not a string.
pub fn classify_value(
    subject: &serde_json::Value,
    body: &serde_json::Value,
) -> Result<ClassificationResult> {
    Classifier::builtin().classify_value(subject, body)
}
