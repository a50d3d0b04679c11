// Caption normalization: lowercase, strip ASCII punctuation, split on whitespace.

use std::sync::LazyLock;

use regex::Regex;

use crate::prepro::manifest::RawItem;

// ASCII punctuation, the same set as `!"#$%&'()*+,-./:;<=>?@[\]^_`{|}~`.
// The pattern is static so compiling it cannot fail at runtime.
pub static PUNCT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[[:punct:]]").unwrap());

pub trait PreTokenizer {
    /// Splits one caption into its ordered word tokens. May return an empty
    /// vector; callers decide whether that is acceptable.
    fn pre_tokenize(&self, text: &str) -> Vec<String>;
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct CaptionCleaner;

impl CaptionCleaner {
    pub fn new() -> Self {
        CaptionCleaner
    }
}

impl PreTokenizer for CaptionCleaner {
    fn pre_tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_lowercase();
        PUNCT_RE
            .replace_all(&lowered, "")
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

/// A manifest item whose captions have been split into tokens, one token
/// list per raw caption, in the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedItem {
    pub raw: RawItem,
    pub tokens: Vec<Vec<String>>,
}

/// Tokenizes every caption of every item. Empty token lists are kept so the
/// encoder can report them against the exact item and caption.
pub fn tokenize_items<P: PreTokenizer>(pre_tokenizer: &P, items: Vec<RawItem>) -> Vec<TokenizedItem> {
    let tokenized: Vec<TokenizedItem> = items
        .into_iter()
        .map(|raw| {
            let tokens = raw
                .captions
                .iter()
                .map(|c| pre_tokenizer.pre_tokenize(c))
                .collect();
            TokenizedItem { raw, tokens }
        })
        .collect();

    for item in tokenized.iter().take(10) {
        if let Some(first) = item.tokens.first() {
            tracing::debug!(tokens = ?first, "example processed tokens");
        }
    }
    tokenized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(s: &str) -> Vec<String> {
        CaptionCleaner::new().pre_tokenize(s)
    }

    #[test]
    fn lowercases_and_strips_punctuation() {
        assert_eq!(tok("A man, riding a Horse!"), vec!["a", "man", "riding", "a", "horse"]);
    }

    #[test]
    fn punctuation_inside_words_is_removed_not_split() {
        assert_eq!(tok("the dog's well-known toy"), vec!["the", "dogs", "wellknown", "toy"]);
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(tok("  two\t\tspaces \n here  "), vec!["two", "spaces", "here"]);
    }

    #[test]
    fn punctuation_only_caption_is_empty() {
        assert!(tok("?!... --").is_empty());
        assert!(tok("").is_empty());
    }

    #[test]
    fn tokenize_items_keeps_caption_order() {
        let items = vec![RawItem::new("a", vec!["One two.".into(), "...".into()])];
        let out = tokenize_items(&CaptionCleaner::new(), items);
        assert_eq!(out[0].tokens.len(), 2);
        assert_eq!(out[0].tokens[0], vec!["one", "two"]);
        assert!(out[0].tokens[1].is_empty());
        assert_eq!(out[0].raw.file_path, std::path::PathBuf::from("a"));
    }
}
