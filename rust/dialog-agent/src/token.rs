//! Tokenization of utterances into the token sequence span ranges index.
//!
//! The analyzer reports spans as `[start, end)` ranges over a specific
//! tokenization: the sentence with spaces inserted around `.`, `,`, `?` and
//! `!`, split on whitespace. Token case is preserved.

/// Punctuation that always forms a token of its own.
pub const SPLIT_PUNCTUATION: [char; 4] = ['.', ',', '?', '!'];

/// A single token of an utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token text as it appears in the sentence.
    pub text: String,
    /// Zero-based position in the token sequence.
    pub position: usize,
}

/// Tokenize a sentence the way the analyzer counts tokens.
pub fn tokenize(sentence: &str) -> Vec<Token> {
    let mut spaced = String::with_capacity(sentence.len() + 8);
    for c in sentence.chars() {
        if SPLIT_PUNCTUATION.contains(&c) {
            spaced.push(' ');
            spaced.push(c);
            spaced.push(' ');
        } else {
            spaced.push(c);
        }
    }

    spaced
        .split_whitespace()
        .enumerate()
        .map(|(position, text)| Token {
            text: text.to_string(),
            position,
        })
        .collect()
}
