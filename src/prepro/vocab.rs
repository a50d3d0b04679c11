// src/prepro/vocab.rs

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

/// Word to id mapping with dense ids starting at 1. Id 0 is the padding
/// value in the encoded label matrix and is never assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    // id - 1 indexes into this
    id_to_word: Vec<String>,
    word_to_id: FxHashMap<String, u32>,
    unk_token: Option<String>,
}

impl Vocabulary {
    /// Builds a vocabulary from words in id order. Duplicates keep their first id.
    pub fn new<I, S>(words: I, unk_token: Option<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut id_to_word = Vec::new();
        let mut word_to_id = FxHashMap::default();
        for word in words {
            let word = word.into();
            if word_to_id.contains_key(&word) {
                continue;
            }
            id_to_word.push(word.clone());
            word_to_id.insert(word, id_to_word.len() as u32);
        }
        Self {
            id_to_word,
            word_to_id,
            unk_token,
        }
    }

    pub fn len(&self) -> usize {
        self.id_to_word.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_to_word.is_empty()
    }

    pub fn id(&self, word: &str) -> Option<u32> {
        self.word_to_id.get(word).copied()
    }

    pub fn word(&self, id: u32) -> Option<&str> {
        if id == 0 {
            return None;
        }
        self.id_to_word.get(id as usize - 1).map(String::as_str)
    }

    /// The placeholder token, present only if some word fell under the threshold.
    pub fn unk_token(&self) -> Option<&str> {
        self.unk_token.as_deref()
    }

    /// The inverse table written to the metadata document.
    pub fn ix_to_word(&self) -> BTreeMap<u32, String> {
        self.id_to_word
            .iter()
            .enumerate()
            .map(|(i, w)| (i as u32 + 1, w.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_one_based_and_contiguous() {
        let v = Vocabulary::new(["a", "dog", "UNK"], Some("UNK".into()));
        assert_eq!(v.len(), 3);
        assert!(!v.is_empty());
        assert_eq!(v.id("a"), Some(1));
        assert_eq!(v.id("dog"), Some(2));
        assert_eq!(v.id("UNK"), Some(3));
        assert_eq!(v.word(0), None);
        assert_eq!(v.word(1), Some("a"));
        assert_eq!(v.word(4), None);
        assert_eq!(v.unk_token(), Some("UNK"));
    }

    #[test]
    fn duplicates_keep_first_id() {
        let v = Vocabulary::new(["x", "y", "x"], None);
        assert_eq!(v.len(), 2);
        assert_eq!(v.id("x"), Some(1));
    }

    #[test]
    fn ix_to_word_round_trips_ids() {
        let v = Vocabulary::new(["cat", "sat"], None);
        let table = v.ix_to_word();
        assert_eq!(table.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        for (id, word) in &table {
            assert_eq!(v.id(word), Some(*id));
        }
    }
}
