//! Classifier facade.
//!
//! Composes tokenization, feature extraction, scoring and calibration behind
//! a single `classify` call. A [`Classifier`] is an immutable handle: cloning
//! it is cheap and it can be shared across threads without locking.

use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, trace};

use crate::decide::{Calibrator, Fallback};
use crate::error::{Error, Result};
use crate::score::{RawScores, score};
use crate::signal::{SignalVector, extract};
use crate::table::{self, CategoryId, CategoryTable};
use crate::token::normalize;

/// Result returned to callers: a display label and a confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Display label of the winning category.
    pub category: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Full account of one classification, for auditing and debugging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    /// Id of the winning category.
    pub category_id: CategoryId,
    /// Display label of the winning category.
    pub label: String,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Whether and why the default category was used.
    pub fallback: Fallback,
    /// Raw score of every category.
    pub scores: RawScores,
    /// Signals that fired and their values.
    pub signals: SignalVector,
}

impl Decision {
    /// Returns the caller-facing result.
    #[must_use]
    pub fn result(&self) -> ClassificationResult {
        ClassificationResult {
            category: self.label.clone(),
            confidence: self.confidence,
        }
    }
}

impl From<Decision> for ClassificationResult {
    fn from(decision: Decision) -> Self {
        Self {
            category: decision.label,
            confidence: decision.confidence,
        }
    }
}

static BUILTIN: LazyLock<Classifier> = LazyLock::new(|| {
    let table = table::builtin().unwrap_or_else(|e| {
        error!("Built-in category table is invalid, every message will fall back: {e}");
        CategoryTable::fallback_only("general", "일반")
    });
    Classifier::new(Arc::new(table), Calibrator::default())
});

/// A configured classifier.
#[derive(Debug, Clone)]
pub struct Classifier {
    table: Arc<CategoryTable>,
    calibrator: Calibrator,
}

impl Classifier {
    /// Creates a classifier over a table with the given calibration policy.
    #[must_use]
    pub fn new(table: Arc<CategoryTable>, calibrator: Calibrator) -> Self {
        debug!(
            categories = table.len(),
            signals = table.registry().len(),
            floor = calibrator.floor(),
            min_confidence = calibrator.min_confidence(),
            "Created classifier"
        );
        Self { table, calibrator }
    }

    /// Returns the process-wide classifier over the built-in table.
    ///
    /// The table is built on first use; concurrent first calls are safe.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Returns a copy of this classifier with a different calibration policy.
    #[must_use]
    pub fn with_calibrator(&self, calibrator: Calibrator) -> Self {
        Self::new(Arc::clone(&self.table), calibrator)
    }

    /// Returns the category table.
    #[must_use]
    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// Returns the calibration policy.
    #[must_use]
    pub const fn calibrator(&self) -> &Calibrator {
        &self.calibrator
    }

    /// Classifies a subject/body pair.
    ///
    /// Total over all inputs: empty or unusual text falls back to the
    /// default category instead of failing.
    #[must_use]
    pub fn classify(&self, subject: &str, body: &str) -> ClassificationResult {
        self.explain(subject, body).into()
    }

    /// Classifies a subject/body pair and reports how the decision was made.
    #[must_use]
    pub fn explain(&self, subject: &str, body: &str) -> Decision {
        let tokens = normalize(subject, body);
        let signals = extract(&tokens, self.table.registry());
        let scores = score(&signals, &self.table);
        let verdict = self.calibrator.decide(&scores, &self.table);

        let label = self
            .table
            .get(verdict.category.as_str())
            .map_or_else(|| verdict.category.to_string(), |c| c.label.clone());

        trace!(
            tokens = tokens.len(),
            signals = signals.len(),
            category = %verdict.category,
            confidence = verdict.confidence,
            fallback = ?verdict.fallback,
            "Classified message"
        );

        Decision {
            category_id: verdict.category,
            label,
            confidence: verdict.confidence,
            fallback: verdict.fallback,
            scores,
            signals,
        }
    }

    /// Classifies dynamically typed arguments, as received from a host bridge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if either argument is not a string.
    pub fn classify_value(&self, subject: &Value, body: &Value) -> Result<ClassificationResult> {
        let subject = expect_str("subject", subject)?;
        let body = expect_str("body", body)?;
        Ok(self.classify(subject, body))
    }

    /// Classifies a request object of the form `{"subject": ..., "body": ...}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the request is not an object or
    /// either field is missing or not a string.
    pub fn classify_request(&self, request: &Value) -> Result<ClassificationResult> {
        self.explain_request(request).map(Into::into)
    }

    /// Like [`Classifier::classify_request`], returning the full [`Decision`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if the request is not an object or
    /// either field is missing or not a string.
    pub fn explain_request(&self, request: &Value) -> Result<Decision> {
        let Value::Object(fields) = request else {
            return Err(Error::InvalidInput {
                field: "request",
                expected: "an object",
                found: json_type(request),
            });
        };
        let subject = expect_str("subject", fields.get("subject").unwrap_or(&Value::Null))?;
        let body = expect_str("body", fields.get("body").unwrap_or(&Value::Null))?;
        Ok(self.explain(subject, body))
    }
}

fn expect_str<'v>(field: &'static str, value: &'v Value) -> Result<&'v str> {
    value.as_str().ok_or_else(|| Error::InvalidInput {
        field,
        expected: "a string",
        found: json_type(value),
    })
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
