//! Decision and confidence calibration.
//!
//! This is the policy layer: it turns raw scores into one winning category
//! and a bounded confidence. It knows nothing about tokens or signals, so
//! thresholds can be tuned here without touching extraction or scoring.

use serde::Serialize;
use tracing::warn;

use crate::score::RawScores;
use crate::table::{CategoryId, CategoryTable};

/// Why the default category was returned instead of the top scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// The top scorer won; no fallback.
    #[default]
    None,
    /// No category scored above zero.
    NoEvidence,
    /// The winner's confidence was below the configured minimum.
    LowConfidence,
}

impl Fallback {
    /// Returns true if the default category was substituted.
    #[must_use]
    pub const fn is_fallback(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Outcome of calibration.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Winning category.
    pub category: CategoryId,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Whether and why the default category was used.
    pub fallback: Fallback,
}

/// Converts raw scores into a decision.
///
/// Confidence is the winner's share of all non-negative scores:
/// `winner / Σ max(score, 0)`, clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibrator {
    floor: f64,
    min_confidence: f64,
}

impl Default for Calibrator {
    fn default() -> Self {
        Self {
            floor: 0.0,
            min_confidence: 0.0,
        }
    }
}

impl Calibrator {
    /// Creates a calibrator with a zero floor and no minimum confidence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the confidence reported when falling back to the default category.
    #[must_use]
    pub fn with_floor(mut self, floor: f64) -> Self {
        self.floor = unit(floor);
        self
    }

    /// Sets the confidence below which the default category is returned instead.
    ///
    /// Zero disables the threshold.
    #[must_use]
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = unit(min_confidence);
        self
    }

    /// Returns the fallback confidence.
    #[must_use]
    pub const fn floor(&self) -> f64 {
        self.floor
    }

    /// Returns the minimum confidence threshold.
    #[must_use]
    pub const fn min_confidence(&self) -> f64 {
        self.min_confidence
    }

    /// Picks the winning category and its confidence.
    ///
    /// The highest score wins; equal scores go to the lexicographically
    /// smallest category id. If nothing scores above zero, the table's
    /// default category is returned with the floor confidence.
    #[must_use]
    pub fn decide(&self, scores: &RawScores, table: &CategoryTable) -> Verdict {
        let mut winner: Option<(&CategoryId, f64)> = None;
        let mut total = 0.0;

        // Ascending id order: a later category must beat the current winner
        // strictly, so ties stay with the smaller id.
        for (id, score) in scores.iter() {
            if score >= 0.0 {
                total += score;
            }
            if winner.is_none_or(|(_, best)| score > best) {
                winner = Some((id, score));
            }
        }

        let Some((id, best)) = winner.filter(|(_, best)| *best > 0.0) else {
            return self.fallback(table, Fallback::NoEvidence);
        };

        let confidence = if total.is_finite() {
            unit(best / total)
        } else {
            relative_share(scores, best)
        };
        if confidence < self.min_confidence {
            warn!(
                category = %id,
                confidence,
                min_confidence = self.min_confidence,
                "Confidence below threshold, using default category"
            );
            return self.fallback(table, Fallback::LowConfidence);
        }

        Verdict {
            category: id.clone(),
            confidence,
            fallback: Fallback::None,
        }
    }

    fn fallback(&self, table: &CategoryTable, reason: Fallback) -> Verdict {
        Verdict {
            category: table.default_category().id.clone(),
            confidence: self.floor,
            fallback: reason,
        }
    }
}

/// Winner's share of the non-negative total, summed relative to the winner so
/// scores near `f64::MAX` cannot overflow.
fn relative_share(scores: &RawScores, best: f64) -> f64 {
    let best = best.min(f64::MAX);
    let relative: f64 = scores
        .iter()
        .map(|(_, score)| score)
        .filter(|score| *score >= 0.0)
        .map(|score| score.min(f64::MAX) / best)
        .sum();
    unit(relative.recip())
}

fn unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn table() -> CategoryTable {
        CategoryTable::builder()
            .category("alpha", "Alpha")
            .category("beta", "Beta")
            .category("general", "General")
            .default_category("general")
            .build()
            .unwrap()
    }

    fn scores(values: &[(&str, f64)]) -> RawScores {
        values
            .iter()
            .map(|(id, score)| (CategoryId::new(*id), *score))
            .collect()
    }

    #[test]
    fn test_winner_and_margin() {
        let verdict = Calibrator::new().decide(
            &scores(&[("alpha", 3.0), ("beta", 1.0), ("general", 0.0)]),
            &table(),
        );
        assert_eq!(verdict.category.as_str(), "alpha");
        assert_eq!(verdict.confidence, 0.75);
        assert_eq!(verdict.fallback, Fallback::None);
    }

    #[test]
    fn test_tie_goes_to_smallest_id() {
        for _ in 0..10 {
            let verdict = Calibrator::new().decide(
                &scores(&[("beta", 2.0), ("alpha", 2.0), ("general", 0.0)]),
                &table(),
            );
            assert_eq!(verdict.category.as_str(), "alpha");
            assert_eq!(verdict.confidence, 0.5);
        }
    }

    #[test]
    fn test_no_evidence_falls_back() {
        let calibrator = Calibrator::new().with_floor(0.1);
        let verdict = calibrator.decide(
            &scores(&[("alpha", 0.0), ("beta", 0.0), ("general", 0.0)]),
            &table(),
        );
        assert_eq!(verdict.category.as_str(), "general");
        assert_eq!(verdict.confidence, 0.1);
        assert_eq!(verdict.fallback, Fallback::NoEvidence);
    }

    #[test]
    fn test_negative_scores_fall_back() {
        let verdict = Calibrator::new().decide(
            &scores(&[("alpha", -1.0), ("beta", -0.5), ("general", 0.0)]),
            &table(),
        );
        assert_eq!(verdict.category.as_str(), "general");
        assert!(verdict.fallback.is_fallback());
    }

    #[test]
    fn test_huge_scores_keep_their_share() {
        let verdict = Calibrator::new().decide(
            &scores(&[("alpha", 1e308), ("beta", 1e308), ("general", 0.0)]),
            &table(),
        );
        assert_eq!(verdict.category.as_str(), "alpha");
        assert_eq!(verdict.confidence, 0.5);
        assert_eq!(verdict.fallback, Fallback::None);

        let verdict = Calibrator::new().decide(
            &scores(&[("alpha", f64::INFINITY), ("beta", 0.0), ("general", 0.0)]),
            &table(),
        );
        assert_eq!(verdict.category.as_str(), "alpha");
        assert_eq!(verdict.confidence, 1.0);
    }

    #[test]
    fn test_negative_scores_excluded_from_total() {
        let verdict = Calibrator::new().decide(
            &scores(&[("alpha", 1.0), ("beta", -3.0), ("general", 0.0)]),
            &table(),
        );
        assert_eq!(verdict.category.as_str(), "alpha");
        assert_eq!(verdict.confidence, 1.0);
    }

    #[test]
    fn test_min_confidence_threshold() {
        let calibrator = Calibrator::new().with_min_confidence(0.6);
        let verdict = calibrator.decide(
            &scores(&[("alpha", 1.0), ("beta", 1.0), ("general", 0.0)]),
            &table(),
        );
        assert_eq!(verdict.category.as_str(), "general");
        assert_eq!(verdict.confidence, 0.0);
        assert_eq!(verdict.fallback, Fallback::LowConfidence);
    }

    #[test]
    fn test_settings_are_clamped() {
        let calibrator = Calibrator::new()
            .with_floor(7.0)
            .with_min_confidence(f64::NAN);
        assert_eq!(calibrator.floor(), 1.0);
        assert_eq!(calibrator.min_confidence(), 0.0);
    }
}
