//! Signals: named, bounded features derived from message text.
//!
//! A [`SignalRegistry`] holds the fixed set of signal definitions a table may
//! reference. Feature extraction ([`extract`]) evaluates every registered
//! signal against a token stream and produces a sparse [`SignalVector`].

mod extract;

pub use extract::extract;

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::token::{self, Field};

/// Which message field a signal looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// Subject and body.
    #[default]
    Any,
    /// Subject line only.
    Subject,
    /// Body only.
    Body,
}

impl Scope {
    /// Returns true if tokens from `field` are visible to this scope.
    #[must_use]
    pub const fn covers(self, field: Field) -> bool {
        matches!(
            (self, field),
            (Self::Any, _) | (Self::Subject, Field::Subject) | (Self::Body, Field::Body)
        )
    }
}

const fn default_saturation() -> u32 {
    1
}

const fn default_min_len() -> usize {
    2
}

/// Definition of how a signal is computed.
///
/// Count-based kinds map a hit count `n` to `min(n, saturation) / saturation`,
/// so every value lies in `[0, 1]` and grows with the number of hits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalKind {
    /// Occurrences of any of a set of single-token terms.
    Keyword {
        /// Terms to look for; normalized the same way as message text.
        terms: Vec<String>,
        /// Fields to search.
        #[serde(default)]
        scope: Scope,
        /// Hit count at which the signal reaches 1.0.
        #[serde(default = "default_saturation")]
        saturation: u32,
    },
    /// Matches of a regular expression over normalized field text.
    ///
    /// Normalized text is the field's token texts joined by single spaces,
    /// e.g. `"Save 50% off!"` becomes `"save 50 % off !"`.
    Pattern {
        /// Regular expression source.
        pattern: String,
        /// Fields to search; each field is matched on its own.
        #[serde(default)]
        scope: Scope,
        /// Match count at which the signal reaches 1.0.
        #[serde(default = "default_saturation")]
        saturation: u32,
    },
    /// Exclamation marks (ASCII or full-width).
    Exclamation {
        /// Count at which the signal reaches 1.0.
        #[serde(default = "default_saturation")]
        saturation: u32,
    },
    /// Words written entirely in capitals.
    Shouting {
        /// Minimum number of letters for a word to count.
        #[serde(default = "default_min_len")]
        min_len: usize,
        /// Count at which the signal reaches 1.0.
        #[serde(default = "default_saturation")]
        saturation: u32,
    },
}

impl SignalKind {
    /// Creates a keyword signal over both fields that saturates on the first hit.
    #[must_use]
    pub fn keywords<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Keyword {
            terms: terms.into_iter().map(Into::into).collect(),
            scope: Scope::Any,
            saturation: 1,
        }
    }

    /// Creates a pattern signal over both fields that saturates on the first match.
    #[must_use]
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            scope: Scope::Any,
            saturation: 1,
        }
    }

    /// Returns the saturation count of this signal.
    #[must_use]
    pub const fn saturation(&self) -> u32 {
        match self {
            Self::Keyword { saturation, .. }
            | Self::Pattern { saturation, .. }
            | Self::Exclamation { saturation }
            | Self::Shouting { saturation, .. } => *saturation,
        }
    }
}

/// Compiled evaluation data for a signal.
#[derive(Debug, Clone)]
enum Matcher {
    Terms(BTreeSet<String>),
    Regex(Regex),
    Exclamation,
    Shouting { min_len: usize },
}

/// A registered, validated signal.
#[derive(Debug, Clone)]
pub struct SignalDef {
    name: String,
    kind: SignalKind,
    matcher: Matcher,
}

impl SignalDef {
    /// Validates and compiles a signal definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the saturation is zero, a keyword list is empty or
    /// holds a term that does not normalize to exactly one word, or a pattern
    /// does not compile.
    pub fn compile(name: impl Into<String>, kind: SignalKind) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::Table("signal name must not be empty".to_string()));
        }
        if kind.saturation() == 0 {
            return Err(Error::Table(format!(
                "signal `{name}` has a saturation of zero"
            )));
        }

        let matcher = match &kind {
            SignalKind::Keyword { terms, .. } => {
                if terms.is_empty() {
                    return Err(Error::Table(format!("signal `{name}` has no terms")));
                }
                let mut normalized = BTreeSet::new();
                for term in terms {
                    normalized.insert(normalize_term(&name, term)?);
                }
                Matcher::Terms(normalized)
            }
            SignalKind::Pattern { pattern, .. } => {
                let regex = Regex::new(pattern).map_err(|source| Error::Pattern {
                    signal: name.clone(),
                    source,
                })?;
                Matcher::Regex(regex)
            }
            SignalKind::Exclamation { .. } => Matcher::Exclamation,
            SignalKind::Shouting { min_len, .. } => Matcher::Shouting {
                min_len: (*min_len).max(1),
            },
        };

        Ok(Self {
            name,
            kind,
            matcher,
        })
    }

    /// Returns the signal name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the definition this signal was compiled from.
    #[must_use]
    pub const fn kind(&self) -> &SignalKind {
        &self.kind
    }
}

fn normalize_term(signal: &str, term: &str) -> Result<String> {
    let stream = token::normalize("", term);
    let mut tokens = stream.iter();
    match (tokens.next(), tokens.next()) {
        (Some(token), None) if token.is_term() => Ok(token.text.clone()),
        _ => Err(Error::Table(format!(
            "signal `{signal}`: keyword `{term}` is not a single word; use a pattern signal"
        ))),
    }
}

/// Fixed, versioned set of signal definitions.
#[derive(Debug, Clone, Default)]
pub struct SignalRegistry {
    version: u32,
    signals: BTreeMap<String, SignalDef>,
}

impl SignalRegistry {
    /// Creates an empty registry with the given version.
    #[must_use]
    pub const fn new(version: u32) -> Self {
        Self {
            version,
            signals: BTreeMap::new(),
        }
    }

    /// Compiles and registers a signal.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already registered or the definition is invalid.
    pub fn register(&mut self, name: impl Into<String>, kind: SignalKind) -> Result<()> {
        let def = SignalDef::compile(name, kind)?;
        if self.signals.contains_key(def.name()) {
            return Err(Error::Table(format!(
                "signal `{}` is registered twice",
                def.name()
            )));
        }
        self.signals.insert(def.name.clone(), def);
        Ok(())
    }

    /// Returns the registry version.
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Looks up a signal by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SignalDef> {
        self.signals.get(name)
    }

    /// Returns true if a signal with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.signals.contains_key(name)
    }

    /// Iterates over signals in name order.
    pub fn iter(&self) -> impl Iterator<Item = &SignalDef> {
        self.signals.values()
    }

    /// Returns the number of registered signals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// Returns true if no signals are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// Sparse mapping from signal name to its value in `(0, 1]`.
///
/// Signals that did not fire are absent rather than stored as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SignalVector {
    values: BTreeMap<String, f64>,
}

impl SignalVector {
    /// Creates an empty vector.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Records a signal value, clamped to `[0, 1]`.
    ///
    /// Values that are zero, negative or NaN leave the signal absent.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        let name = name.into();
        if value > 0.0 {
            self.values.insert(name, value.min(1.0));
        } else {
            self.values.remove(&name);
        }
    }

    /// Returns the value of a signal, if it fired.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Iterates over fired signals in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Returns the number of fired signals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no signal fired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for SignalVector {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut vector = Self::new();
        for (name, value) in iter {
            vector.set(name, value);
        }
        vector
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_terms_are_normalized() {
        let def = SignalDef::compile("kw", SignalKind::keywords(["ASAP", "Urgent"])).unwrap();
        match def.matcher {
            Matcher::Terms(terms) => {
                assert!(terms.contains("asap"));
                assert!(terms.contains("urgent"));
            }
            _ => panic!("Expected term matcher"),
        }
    }

    #[test]
    fn test_multi_word_keyword_rejected() {
        let err = SignalDef::compile("kw", SignalKind::keywords(["act now"])).unwrap_err();
        assert!(err.to_string().contains("not a single word"));
    }

    #[test]
    fn test_empty_keyword_list_rejected() {
        let kind = SignalKind::keywords(Vec::<String>::new());
        assert!(SignalDef::compile("kw", kind).is_err());
    }

    #[test]
    fn test_zero_saturation_rejected() {
        let kind = SignalKind::Exclamation { saturation: 0 };
        assert!(SignalDef::compile("bang", kind).is_err());
    }

    #[test]
    fn test_bad_pattern_rejected() {
        let err = SignalDef::compile("re", SignalKind::pattern("(unclosed")).unwrap_err();
        assert!(matches!(err, Error::Pattern { ref signal, .. } if signal == "re"));
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = SignalRegistry::new(1);
        registry
            .register("kw", SignalKind::keywords(["sale"]))
            .unwrap();
        assert!(
            registry
                .register("kw", SignalKind::keywords(["promo"]))
                .is_err()
        );
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("kw"));
    }

    #[test]
    fn test_signal_vector_is_sparse_and_bounded() {
        let mut vector = SignalVector::new();
        vector.set("a", 0.0);
        vector.set("b", -1.0);
        vector.set("c", f64::NAN);
        vector.set("d", 3.5);
        vector.set("e", 0.25);

        assert_eq!(vector.len(), 2);
        assert_eq!(vector.get("a"), None);
        assert_eq!(vector.get("d"), Some(1.0));
        assert_eq!(vector.get("e"), Some(0.25));
    }

    #[test]
    fn test_signal_kind_json_defaults() {
        let kind: SignalKind =
            serde_json::from_str(r#"{"kind":"keyword","terms":["sale"]}"#).unwrap();
        assert_eq!(
            kind,
            SignalKind::Keyword {
                terms: vec!["sale".to_string()],
                scope: Scope::Any,
                saturation: 1,
            }
        );

        let kind: SignalKind = serde_json::from_str(r#"{"kind":"shouting"}"#).unwrap();
        assert_eq!(
            kind,
            SignalKind::Shouting {
                min_len: 2,
                saturation: 1
            }
        );
    }

    #[test]
    fn test_scope_covers() {
        assert!(Scope::Any.covers(Field::Subject));
        assert!(Scope::Body.covers(Field::Body));
        assert!(!Scope::Subject.covers(Field::Body));
    }
}
