//! Lexical title similarity.
//!
//! Titles are compared as token lists with a Dice coefficient:
//! `2 * common / (len(a) + len(b))`, where `common` counts the tokens of `a`
//! (with repetition) that appear anywhere in `b`.

/// Hangul compatibility jamo (ㄱ..ㅎ, ㅏ..ㅣ) and precomposed syllables (가..힣).
fn is_hangul(c: char) -> bool {
    matches!(c, '\u{3131}'..='\u{314E}' | '\u{314F}'..='\u{3163}' | '\u{AC00}'..='\u{D7A3}')
}

/// Word characters kept by normalization: ASCII letters and digits,
/// underscore and Hangul.
fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || is_hangul(c)
}

/// Lowercase, drop punctuation and symbols, split on whitespace and keep
/// tokens longer than one character.
pub fn tokenize(title: &str) -> Vec<String> {
    let cleaned: String = title
        .to_lowercase()
        .chars()
        .filter(|c| is_token_char(*c) || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .filter(|w| w.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

/// Similarity of two titles in `[0, 1]`.
///
/// Returns 0 when either title has no usable tokens.
pub fn similarity(title_a: &str, title_b: &str) -> f64 {
    let words_a = tokenize(title_a);
    let words_b = tokenize(title_b);
    if words_a.is_empty() || words_b.is_empty() {
        return 0.0;
    }

    let common = words_a.iter().filter(|w| words_b.contains(w)).count();
    (common * 2) as f64 / (words_a.len() + words_b.len()) as f64
}
