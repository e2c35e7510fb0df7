//! Word-level helpers shared by the oracle and the tools.

/// Lowercased alphanumeric words of `text`.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// True when the words of `phrase` appear consecutively in `tokens`.
///
/// `tokens` must come from `tokenize`. An empty phrase never matches.
pub fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    let wanted = tokenize(phrase);
    if wanted.is_empty() || wanted.len() > tokens.len() {
        return false;
    }
    tokens.windows(wanted.len()).any(|w| w == wanted.as_slice())
}

/// Whitespace-separated words with surrounding punctuation removed, case kept.
pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect()
}
