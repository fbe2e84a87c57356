//! Title canonicalization for answer matching and autocomplete.

/// Characters that are visually distinct but semantically equivalent for
/// matching purposes, paired with their canonical counterpart. Applied in
/// order; every occurrence of the source character is folded.
const EQUIVALENT_CHARS: &[(char, char)] = &[('×', 'x'), ('é', 'e')];

/// Lowercase a title and fold equivalent characters. Idempotent, and does no
/// trimming or punctuation stripping.
pub fn normalize(title: &str) -> String {
    let mut text = title.to_lowercase();
    for &(from, to) in EQUIVALENT_CHARS {
        if text.contains(from) {
            text = text.replace(from, to.encode_utf8(&mut [0u8; 4]));
        }
    }
    text
}
