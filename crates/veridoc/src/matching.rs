//! Fuzzy name matching tolerant of OCR noise.
//!
//! OCR output of a scanned ID rarely reproduces a name exactly: diacritics
//! get dropped, letters are misread, surrounding label text runs into the
//! name. The matcher therefore works token-by-token on aggressively
//! normalized text and scores with normalized edit distance instead of
//! equality.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalize text for name comparison: Unicode-decompose, strip combining
/// marks, uppercase, keep ASCII letters and spaces only, collapse runs of
/// whitespace.
///
/// `"José  Pérez-García"` becomes `"JOSE PEREZ GARCIA"`.
pub fn normalize(text: &str) -> String {
    let stripped: String = text.nfd().filter(|c| !is_combining_mark(*c)).collect();

    let letters_only: String = stripped
        .chars()
        .flat_map(char::to_uppercase)
        .map(|c| if c.is_ascii_alphabetic() { c } else { ' ' })
        .collect();

    letters_only.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Similarity in `[0, 1]` between two short tokens, from normalized
/// Levenshtein distance: `1 - distance / max(len)`. Two empty tokens are
/// identical (1); one empty token matches nothing (0).
pub fn token_similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(a, b)
}

/// Weighted similarity between a claimed name and a document's text.
///
/// Each claimed-name token takes its best match over all document tokens,
/// weighted by the token's character length, so longer, more distinctive
/// name parts dominate over short filler tokens. Returns 0 when either
/// input normalizes to empty.
pub fn name_similarity(document_text: &str, claimed_name: &str) -> f64 {
    let document = normalize(document_text);
    let name = normalize(claimed_name);

    if document.is_empty() || name.is_empty() {
        return 0.0;
    }

    let name_tokens: Vec<&str> = name.split(' ').collect();
    let document_tokens: Vec<&str> = document.split(' ').collect();
    let total_chars: usize = name_tokens.iter().map(|t| t.len()).sum();

    let mut weighted_sum = 0.0;
    for token in &name_tokens {
        let mut best = 0.0f64;
        for candidate in &document_tokens {
            let similarity = token_similarity(token, candidate);
            if similarity > best {
                best = similarity;
            }
            if best >= 1.0 {
                break;
            }
        }
        weighted_sum += best * token.len() as f64;
    }

    weighted_sum / total_chars as f64
}
