// src/prepro/vocab_builder.rs

use rustc_hash::FxHashMap;

use crate::prepro::manifest::RawItem;
use crate::prepro::pre_tokenizer::TokenizedItem;
use crate::prepro::vocab::Vocabulary;
use crate::prepro::{Error, Result};

/// An item whose captions have been rewritten so every token is either a
/// vocabulary word or the UNK placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedItem {
    pub raw: RawItem,
    pub final_captions: Vec<Vec<String>>,
}

/// Corpus statistics gathered while building the vocabulary. Purely
/// informational; reproducible for identical input.
#[derive(Debug, Clone, PartialEq)]
pub struct VocabStats {
    pub total_words: u64,
    pub distinct_words: usize,
    /// Distinct words whose count is at or below the threshold.
    pub bad_words: usize,
    /// Token occurrences that were replaced by UNK.
    pub unk_count: u64,
    pub vocab_size: usize,
    pub unk_inserted: bool,
    pub top_words: Vec<(String, u64)>,
    /// `length_histogram[n]` is the number of captions with `n` tokens.
    pub length_histogram: Vec<usize>,
    pub sentence_count: usize,
}

impl VocabStats {
    pub fn bad_word_ratio(&self) -> f64 {
        self.bad_words as f64 / self.distinct_words as f64
    }

    pub fn unk_ratio(&self) -> f64 {
        self.unk_count as f64 / self.total_words as f64
    }

    pub fn max_sentence_len(&self) -> usize {
        self.length_histogram.len().saturating_sub(1)
    }

    pub fn mean_sentence_len(&self) -> f64 {
        self.total_words as f64 / self.sentence_count as f64
    }

    pub fn log(&self) {
        for (word, count) in &self.top_words {
            tracing::info!(count, word = %word, "top word");
        }
        tracing::info!(total_words = self.total_words, "total words");
        tracing::info!(
            "number of bad words: {}/{} = {:.2}%",
            self.bad_words,
            self.distinct_words,
            self.bad_word_ratio() * 100.0
        );
        tracing::info!(
            "number of words in vocab would be {}",
            self.vocab_size - usize::from(self.unk_inserted)
        );
        tracing::info!(
            "number of UNKs: {}/{} = {:.2}%",
            self.unk_count,
            self.total_words,
            self.unk_ratio() * 100.0
        );
        tracing::info!("max length sentence in raw data: {}", self.max_sentence_len());
        tracing::info!(
            "{} sentences in total, {:.2} words per sentence on average",
            self.sentence_count,
            self.mean_sentence_len()
        );
        for (len, n) in self.length_histogram.iter().enumerate() {
            tracing::debug!(
                "{:2}| {:10}|  {:.6}%",
                len,
                n,
                *n as f64 * 100.0 / self.sentence_count as f64
            );
        }
        if self.unk_inserted {
            tracing::info!("special UNK token inserted");
        }
    }
}

/// Everything the vocabulary stage hands to the rest of the pipeline.
#[derive(Debug, Clone)]
pub struct VocabOutput {
    pub vocab: Vocabulary,
    pub items: Vec<FinalizedItem>,
    pub stats: VocabStats,
    /// Every distinct word with its corpus count, most frequent first.
    pub word_counts: Vec<(String, u64)>,
}

struct Config {
    word_count_threshold: u64,
    unk_token: String,
    top_words: usize,
}

pub struct VocabBuilderBuilder {
    config: Config,
}

impl Default for VocabBuilderBuilder {
    fn default() -> Self {
        Self {
            config: Config {
                word_count_threshold: 5,
                unk_token: "UNK".to_string(),
                top_words: 20,
            },
        }
    }
}

impl VocabBuilderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Words occurring this many times or fewer are mapped to UNK.
    #[must_use]
    pub fn word_count_threshold(mut self, threshold: u64) -> Self {
        self.config.word_count_threshold = threshold;
        self
    }

    #[must_use]
    pub fn unk_token<S: Into<String>>(mut self, token: S) -> Self {
        self.config.unk_token = token.into();
        self
    }

    /// How many of the most frequent words the statistics report.
    #[must_use]
    pub fn top_words(mut self, n: usize) -> Self {
        self.config.top_words = n;
        self
    }

    pub fn build(self) -> VocabBuilder {
        VocabBuilder {
            word_count_threshold: self.config.word_count_threshold,
            unk_token: self.config.unk_token,
            top_words: self.config.top_words,
            words: FxHashMap::default(),
        }
    }
}

/// Counts token frequencies over the whole corpus and derives a
/// frequency-thresholded vocabulary from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabBuilder {
    pub word_count_threshold: u64,
    pub unk_token: String,
    pub top_words: usize,

    words: FxHashMap<String, u64>,
}

impl Default for VocabBuilder {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl VocabBuilder {
    pub fn builder() -> VocabBuilderBuilder {
        VocabBuilderBuilder::new()
    }

    /// Adds the token counts of `items` to the running word counts.
    fn feed(&mut self, items: &[TokenizedItem]) {
        for item in items {
            for caption in &item.tokens {
                for word in caption {
                    self.words
                        .entry(word.clone())
                        .and_modify(|c| *c += 1)
                        .or_insert(1);
                }
            }
        }
    }

    fn is_kept(&self, word: &str) -> bool {
        self.words.get(word).copied().unwrap_or(0) > self.word_count_threshold
    }

    /// Counts sorted by count descending, ties broken by word descending.
    pub fn sorted_counts(&self) -> Vec<(String, u64)> {
        let mut counts: Vec<(String, u64)> =
            self.words.iter().map(|(w, &c)| (w.clone(), c)).collect();
        counts.sort_unstable_by(|a, b| (b.1, &b.0).cmp(&(a.1, &a.0)));
        counts
    }

    fn length_histogram(items: &[TokenizedItem]) -> (Vec<usize>, usize) {
        let mut histogram: Vec<usize> = Vec::new();
        let mut sentences = 0;
        for caption in items.iter().flat_map(|i| i.tokens.iter()) {
            let n = caption.len();
            if histogram.len() <= n {
                histogram.resize(n + 1, 0);
            }
            histogram[n] += 1;
            sentences += 1;
        }
        (histogram, sentences)
    }

    /// Counts every token in `items`, keeps the words seen more than the
    /// threshold, appends UNK if anything was dropped, and rewrites each
    /// caption in terms of the kept words.
    pub fn build_vocab(mut self, items: Vec<TokenizedItem>) -> Result<VocabOutput> {
        check_no_empty_captions(&items)?;

        self.words.clear();
        self.feed(&items);

        let total_words: u64 = self.words.values().sum();
        if total_words == 0 {
            return Err(Error::CorpusEmpty);
        }

        let word_counts = self.sorted_counts();
        let (kept, dropped): (Vec<_>, Vec<_>) = word_counts
            .iter()
            .partition(|(_, count)| *count > self.word_count_threshold);
        let unk_count: u64 = dropped.iter().map(|(_, c)| *c).sum();
        let unk_inserted = unk_count > 0;
        if unk_inserted && self.words.contains_key(&self.unk_token) {
            return Err(Error::Config(format!(
                "UNK token {:?} also occurs as a corpus word",
                self.unk_token
            )));
        }

        let mut vocab_words: Vec<String> = kept.iter().map(|(w, _)| w.clone()).collect();
        if unk_inserted {
            vocab_words.push(self.unk_token.clone());
        }
        let vocab = Vocabulary::new(vocab_words, unk_inserted.then(|| self.unk_token.clone()));

        let (length_histogram, sentence_count) = Self::length_histogram(&items);
        let stats = VocabStats {
            total_words,
            distinct_words: word_counts.len(),
            bad_words: dropped.len(),
            unk_count,
            vocab_size: vocab.len(),
            unk_inserted,
            top_words: word_counts.iter().take(self.top_words).cloned().collect(),
            length_histogram,
            sentence_count,
        };

        let items = items
            .into_iter()
            .map(|item| {
                let final_captions = item
                    .tokens
                    .into_iter()
                    .map(|caption| {
                        caption
                            .into_iter()
                            .map(|w| if self.is_kept(&w) { w } else { self.unk_token.clone() })
                            .collect()
                    })
                    .collect();
                FinalizedItem {
                    raw: item.raw,
                    final_captions,
                }
            })
            .collect();

        Ok(VocabOutput {
            vocab,
            items,
            stats,
            word_counts,
        })
    }
}

// A caption that cleaned down to nothing is reported against its item before
// any counting, so an all-punctuation corpus names the caption at fault.
fn check_no_empty_captions(items: &[TokenizedItem]) -> Result<()> {
    for (i, item) in items.iter().enumerate() {
        if let Some(j) = item.tokens.iter().position(Vec::is_empty) {
            return Err(Error::EmptyCaption {
                item: i,
                caption: j,
                path: item.raw.file_path.clone(),
                text: item.raw.captions.get(j).cloned().unwrap_or_default(),
            });
        }
    }
    Ok(())
}
