use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Comparison key for catalog items and self-reported skills: accents, case and punctuation
/// are dropped and whitespace is collapsed.
pub fn normalize_requirement(value: &str) -> String {
    let mut cleaned = String::with_capacity(value.len());
    for ch in value.nfd().filter(|ch| !is_combining_mark(*ch)) {
        if ch.is_alphanumeric() {
            cleaned.extend(ch.to_lowercase());
        } else if ch.is_whitespace() {
            cleaned.push(' ');
        }
    }

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strips accents while keeping every other character as-is (`María` -> `Maria`).
pub(crate) fn fold_diacritics(value: &str) -> String {
    value.nfd().filter(|ch| !is_combining_mark(*ch)).collect()
}
