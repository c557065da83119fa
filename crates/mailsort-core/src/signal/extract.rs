//! Feature extraction.
//!
//! One pass over the token stream collects [`TokenStats`]; every registered
//! signal is then evaluated against those shared statistics instead of
//! rescanning the tokens.

use std::collections::HashMap;

use super::{Matcher, Scope, SignalDef, SignalKind, SignalRegistry, SignalVector};
use crate::token::{Field, TokenKind, TokenStream};

/// Statistics gathered in a single scan of the token stream.
#[derive(Debug, Default)]
struct TokenStats<'a> {
    subject_terms: HashMap<&'a str, u32>,
    body_terms: HashMap<&'a str, u32>,
    subject_text: String,
    body_text: String,
    exclamations: u32,
    /// Letter count of every word written entirely in capitals.
    shouted_letters: Vec<usize>,
}

impl<'a> TokenStats<'a> {
    fn collect(stream: &'a TokenStream) -> Self {
        let mut stats = Self::default();

        for token in stream {
            let (terms, text) = match token.field {
                Field::Subject => (&mut stats.subject_terms, &mut stats.subject_text),
                Field::Body => (&mut stats.body_terms, &mut stats.body_text),
            };

            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&token.text);

            match token.kind {
                TokenKind::Word | TokenKind::Number => {
                    *terms.entry(token.text.as_str()).or_insert(0) += 1;
                    if token.shouted {
                        let letters = token.text.chars().filter(|c| c.is_alphabetic()).count();
                        stats.shouted_letters.push(letters);
                    }
                }
                TokenKind::Punct('!' | '\u{FF01}' | '\u{00A1}') => stats.exclamations += 1,
                TokenKind::Punct(_) | TokenKind::Opaque => {}
            }
        }

        stats
    }

    fn term_count(&self, field: Field, term: &str) -> u32 {
        let terms = match field {
            Field::Subject => &self.subject_terms,
            Field::Body => &self.body_terms,
        };
        terms.get(term).copied().unwrap_or(0)
    }

    fn text(&self, field: Field) -> &str {
        match field {
            Field::Subject => &self.subject_text,
            Field::Body => &self.body_text,
        }
    }
}

/// Evaluates every registered signal against a token stream.
///
/// Signals that do not fire are left out of the returned vector.
#[must_use]
pub fn extract(stream: &TokenStream, registry: &SignalRegistry) -> SignalVector {
    let stats = TokenStats::collect(stream);
    let mut vector = SignalVector::new();

    for def in registry.iter() {
        let hits = count_hits(def, &stats);
        if hits > 0 {
            vector.set(def.name(), saturate(hits, def.kind().saturation()));
        }
    }

    vector
}

fn fields(scope: Scope) -> impl Iterator<Item = Field> {
    [Field::Subject, Field::Body]
        .into_iter()
        .filter(move |field| scope.covers(*field))
}

fn count_hits(def: &SignalDef, stats: &TokenStats<'_>) -> u64 {
    match (&def.matcher, &def.kind) {
        (Matcher::Terms(terms), SignalKind::Keyword { scope, .. }) => fields(*scope)
            .flat_map(|field| terms.iter().map(move |term| (field, term)))
            .map(|(field, term)| u64::from(stats.term_count(field, term)))
            .sum(),
        (Matcher::Regex(regex), SignalKind::Pattern { scope, .. }) => fields(*scope)
            .map(|field| regex.find_iter(stats.text(field)).count() as u64)
            .sum(),
        (Matcher::Exclamation, _) => u64::from(stats.exclamations),
        (Matcher::Shouting { min_len }, _) => stats
            .shouted_letters
            .iter()
            .filter(|letters| **letters >= *min_len)
            .count() as u64,
        _ => 0,
    }
}

#[allow(clippy::cast_precision_loss)]
fn saturate(hits: u64, saturation: u32) -> f64 {
    let saturation = u64::from(saturation.max(1));
    hits.min(saturation) as f64 / saturation as f64
}
