//! Linear category scoring.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::signal::SignalVector;
use crate::table::{CategoryId, CategoryTable};

/// Raw score per category, in category id order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawScores {
    scores: BTreeMap<CategoryId, f64>,
}

impl RawScores {
    /// Returns the score of a category, if it exists in the table that was scored.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<f64> {
        self.scores.get(id).copied()
    }

    /// Iterates over `(id, score)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (&CategoryId, f64)> {
        self.scores.iter().map(|(id, score)| (id, *score))
    }

    /// Returns the number of scored categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scores.len()
    }

    /// Returns true if nothing was scored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}

impl FromIterator<(CategoryId, f64)> for RawScores {
    fn from_iter<I: IntoIterator<Item = (CategoryId, f64)>>(iter: I) -> Self {
        Self {
            scores: iter.into_iter().collect(),
        }
    }
}

/// Scores every category of the table against a signal vector.
///
/// `score(c) = Σ vector[s] × weight(c, s)` over the signals present in the
/// vector. Absent signals contribute nothing, so a category with no
/// overlapping signals scores exactly zero.
#[must_use]
pub fn score(vector: &SignalVector, table: &CategoryTable) -> RawScores {
    table
        .categories()
        .map(|category| {
            let total = vector.iter().fold(0.0, |total, (signal, value)| {
                total + value * category.weight(signal)
            });
            (category.id.clone(), total)
        })
        .collect()
}
