use super::{Letter, Symbol};

/// International Morse code for the Latin alphabet
pub const MORSE_TABLE: &[(char, &str)] = &[
    ('A', ".-"),
    ('B', "-..."),
    ('C', "-.-."),
    ('D', "-.."),
    ('E', "."),
    ('F', "..-."),
    ('G', "--."),
    ('H', "...."),
    ('I', ".."),
    ('J', ".---"),
    ('K', "-.-"),
    ('L', ".-.."),
    ('M', "--"),
    ('N', "-."),
    ('O', "---"),
    ('P', ".--."),
    ('Q', "--.-"),
    ('R', ".-."),
    ('S', "..."),
    ('T', "-"),
    ('U', "..-"),
    ('V', "...-"),
    ('W', ".--"),
    ('X', "-..-"),
    ('Y', "-.--"),
    ('Z', "--.."),
];

/// Look up an exact pattern such as `".-"`
pub fn lookup_pattern(pattern: &str) -> Option<char> {
    MORSE_TABLE
        .iter()
        .find(|(_, p)| *p == pattern)
        .map(|(c, _)| *c)
}

/// Join symbols into their table key
pub fn pattern_of(symbols: &[Symbol]) -> String {
    symbols.iter().map(|s| s.as_char()).collect()
}

/// Resolve a symbol sequence to a letter.
///
/// An exact match wins. Otherwise symbols are dropped from the tail one at a
/// time until the remaining prefix is in the table. Nothing matching, the
/// empty sequence included, resolves to [`Letter::Unknown`].
pub fn resolve(symbols: &[Symbol]) -> Letter {
    let mut pattern = pattern_of(symbols);

    while !pattern.is_empty() {
        if let Some(ch) = lookup_pattern(&pattern) {
            return Letter::Char(ch);
        }
        pattern.pop();
    }

    Letter::Unknown
}
