//! Tokenizer and normalizer.
//!
//! Turns a subject/body pair into a flat [`TokenStream`]. The tokenizer works
//! on Unicode scalar values, never on bytes, and is total: every input
//! (including the empty string) produces a stream without error.
//!
//! Character classes:
//! - alphanumeric runs become [`TokenKind::Word`] or [`TokenKind::Number`]
//!   tokens, lowercased
//! - whitespace separates tokens and is collapsed
//! - punctuation splits words and is kept as single [`TokenKind::Punct`]
//!   tokens so structural signals can count it
//! - anything else (symbols, emoji, control and zero-width format
//!   characters, U+FFFD) becomes a single-character [`TokenKind::Opaque`]
//!   token

use std::fmt;

/// Message field a token was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// The subject line.
    Subject,
    /// The message body.
    Body,
}

impl Field {
    /// Returns the lowercase name of this field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of a normalized token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Alphanumeric run containing at least one letter.
    Word,
    /// Run of digits only.
    Number,
    /// A single punctuation character.
    Punct(char),
    /// A single character with no better classification.
    Opaque,
}

/// A normalized token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lowercased token text.
    pub text: String,
    /// Token classification.
    pub kind: TokenKind,
    /// Field the token came from.
    pub field: Field,
    /// Whether the original word had cased letters and all of them were uppercase.
    pub shouted: bool,
}

impl Token {
    /// Returns true for word and number tokens.
    #[must_use]
    pub const fn is_term(&self) -> bool {
        matches!(self.kind, TokenKind::Word | TokenKind::Number)
    }
}

/// Ordered sequence of tokens for one classification call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Returns the number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if the stream holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterates over all tokens in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Token> {
        self.tokens.iter()
    }

    /// Iterates over word and number tokens only.
    pub fn terms(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter().filter(|t| t.is_term())
    }

    /// Returns the normalized text of one field: token texts joined by single spaces.
    #[must_use]
    pub fn field_text(&self, field: Field) -> String {
        let mut out = String::new();
        for token in self.tokens.iter().filter(|t| t.field == field) {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&token.text);
        }
        out
    }
}

impl<'a> IntoIterator for &'a TokenStream {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Normalizes a subject/body pair into a token stream.
///
/// The two fields are tokenized separately, so no token can span the
/// subject/body boundary.
#[must_use]
pub fn normalize(subject: &str, body: &str) -> TokenStream {
    let mut tokens = Vec::new();
    tokenize_field(subject, Field::Subject, &mut tokens);
    tokenize_field(body, Field::Body, &mut tokens);
    TokenStream { tokens }
}

fn tokenize_field(text: &str, field: Field, out: &mut Vec<Token>) {
    let mut word = String::new();

    for c in text.chars() {
        if c.is_alphanumeric() || (!word.is_empty() && is_word_joiner(c)) {
            word.push(c);
            continue;
        }

        flush_word(&mut word, field, out);

        if c.is_whitespace() {
            continue;
        }

        let kind = if is_punctuation(c) {
            TokenKind::Punct(c)
        } else {
            TokenKind::Opaque
        };
        out.push(Token {
            text: c.to_lowercase().collect(),
            kind,
            field,
            shouted: false,
        });
    }

    flush_word(&mut word, field, out);
}

fn flush_word(word: &mut String, field: Field, out: &mut Vec<Token>) {
    if word.is_empty() {
        return;
    }

    let raw = std::mem::take(word);
    let has_upper = raw.chars().any(char::is_uppercase);
    let has_lower = raw.chars().any(char::is_lowercase);
    let kind = if raw.chars().any(char::is_alphabetic) {
        TokenKind::Word
    } else {
        TokenKind::Number
    };

    out.push(Token {
        text: raw.to_lowercase(),
        kind,
        field,
        shouted: has_upper && !has_lower,
    });
}

/// Combining marks and joiners that continue the current word.
const fn is_word_joiner(c: char) -> bool {
    matches!(
        c,
        '\u{0300}'..='\u{036F}'
            | '\u{1AB0}'..='\u{1AFF}'
            | '\u{1DC0}'..='\u{1DFF}'
            | '\u{20D0}'..='\u{20FF}'
            | '\u{FE20}'..='\u{FE2F}'
            | '\u{FE00}'..='\u{FE0F}'
            | '\u{200C}'
            | '\u{200D}'
    )
}

fn is_punctuation(c: char) -> bool {
    c.is_ascii_punctuation()
        || matches!(
            c,
            '\u{00A1}'
                | '\u{00A7}'
                | '\u{00AB}'
                | '\u{00B6}'
                | '\u{00B7}'
                | '\u{00BB}'
                | '\u{00BF}'
                | '\u{2010}'..='\u{2027}'
                | '\u{2030}'..='\u{205E}'
                | '\u{3001}'..='\u{3003}'
                | '\u{3008}'..='\u{3011}'
                | '\u{3014}'..='\u{301F}'
                | '\u{FF01}'..='\u{FF0F}'
                | '\u{FF1A}'..='\u{FF20}'
                | '\u{FF3B}'..='\u{FF40}'
                | '\u{FF5B}'..='\u{FF65}'
        )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::needless_collect)]
mod tests {
    use super::*;

    fn texts(stream: &TokenStream) -> Vec<&str> {
        stream.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize("", "").is_empty());
        assert!(normalize("   ", "\t\r\n").is_empty());
    }

    #[test]
    fn test_lowercases_and_splits_punctuation() {
        let stream = normalize("Urgent Offer", "reply ASAP!");
        assert_eq!(texts(&stream), vec!["urgent", "offer", "reply", "asap", "!"]);
        assert_eq!(stream.iter().last().unwrap().kind, TokenKind::Punct('!'));
    }

    #[test]
    fn test_fields_do_not_merge() {
        let stream = normalize("hello", "world");
        let tokens: Vec<_> = stream.iter().collect();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].field, Field::Subject);
        assert_eq!(tokens[1].field, Field::Body);
    }

    #[test]
    fn test_numbers_and_words() {
        let stream = normalize("", "50% off 2for1");
        let kinds: Vec<_> = stream.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Number,
                TokenKind::Punct('%'),
                TokenKind::Word,
                TokenKind::Word
            ]
        );
    }

    #[test]
    fn test_multibyte_text() {
        let stream = normalize("긴급 공지", "Café déjà-vu");
        assert_eq!(texts(&stream), vec!["긴급", "공지", "café", "déjà", "-", "vu"]);
    }

    #[test]
    fn test_combining_marks_stay_in_word() {
        let stream = normalize("", "cafe\u{0301} ok");
        assert_eq!(texts(&stream), vec!["cafe\u{0301}", "ok"]);
    }

    #[test]
    fn test_unknown_characters_become_opaque_tokens() {
        let stream = normalize("", "deal\u{1F525}now \u{FFFD}");
        let tokens: Vec<_> = stream.iter().collect();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[1].text, "\u{1F525}");
        assert_eq!(tokens[1].kind, TokenKind::Opaque);
        assert_eq!(tokens[3].kind, TokenKind::Opaque);
    }

    #[test]
    fn test_zero_width_characters_are_kept() {
        let stream = normalize("\u{FEFF}sale", "할\u{200B}인 \u{200E}");
        assert_eq!(
            texts(&stream),
            vec!["\u{FEFF}", "sale", "할", "\u{200B}", "인", "\u{200E}"]
        );
        assert_eq!(stream.iter().next().unwrap().kind, TokenKind::Opaque);
        assert_eq!(stream.iter().nth(3).unwrap().kind, TokenKind::Opaque);
    }

    #[test]
    fn test_shouted_words() {
        let stream = normalize("FREE money", "A1 123");
        let shouted: Vec<_> = stream.iter().map(|t| t.shouted).collect();
        assert_eq!(shouted, vec![true, false, true, false]);
    }

    #[test]
    fn test_cjk_punctuation() {
        let stream = normalize("", "지금！확인。");
        assert_eq!(texts(&stream), vec!["지금", "！", "확인", "。"]);
        assert!(matches!(stream.iter().nth(1).unwrap().kind, TokenKind::Punct(_)));
    }

    #[test]
    fn test_field_text() {
        let stream = normalize("Big Sale", "Save 50% off!");
        assert_eq!(stream.field_text(Field::Subject), "big sale");
        assert_eq!(stream.field_text(Field::Body), "save 50 % off !");
    }
}
