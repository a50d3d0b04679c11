// src/prepro/pipeline.rs

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::prepro::encoder::CaptionEncoder;
use crate::prepro::features::{FeatureReader, FeatureStore};
use crate::prepro::manifest::load_manifest;
use crate::prepro::pre_tokenizer::{CaptionCleaner, PreTokenizer, tokenize_items};
use crate::prepro::split::{Split, assign_splits, check_split_counts, seeded_shuffle};
use crate::prepro::vocab_builder::{VocabBuilder, VocabStats};
use crate::prepro::writer::{FeatInfo, Metadata, OutputPaths, write_outputs};
use crate::prepro::{Error, Result};

/// Settings for one preprocessing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepConfig {
    pub input_json: PathBuf,
    pub num_val: usize,
    pub num_test: usize,
    pub max_length: usize,
    pub word_count_threshold: u64,
    pub output_json: PathBuf,
    pub output_store: PathBuf,
    pub word_count_file: PathBuf,
    pub seed: u64,
    pub feature_field: String,
    pub feature_dim: usize,
    pub unk_token: String,
    pub top_words: usize,
    pub show_progress: bool,
}

impl PrepConfig {
    pub fn new<P: Into<PathBuf>>(input_json: P, num_val: usize) -> Self {
        Self {
            input_json: input_json.into(),
            num_val,
            num_test: 0,
            max_length: 16,
            word_count_threshold: 5,
            output_json: PathBuf::from("data/data.json"),
            output_store: PathBuf::from("data/data.safetensors"),
            word_count_file: PathBuf::from("data/word_counts.txt"),
            seed: 123,
            feature_field: "mp".to_string(),
            feature_dim: 4096,
            unk_token: "UNK".to_string(),
            top_words: 20,
            show_progress: false,
        }
    }

    /// Checks what can be checked before the manifest is read.
    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(Error::Config("max_length must be at least 1".into()));
        }
        if self.feature_dim == 0 {
            return Err(Error::Config("feature_dim must be at least 1".into()));
        }
        if self.feature_field.is_empty() {
            return Err(Error::Config("feature_field must not be empty".into()));
        }
        // Corpus tokens are cleaned, so a token that survives cleaning
        // unchanged could collide with a real word.
        let cleaned = CaptionCleaner::new().pre_tokenize(&self.unk_token);
        if self.unk_token.is_empty() || cleaned == [self.unk_token.clone()] {
            return Err(Error::Config(format!(
                "unk_token {:?} must be non-empty and not a possible corpus word",
                self.unk_token
            )));
        }
        let outputs = [&self.output_json, &self.output_store, &self.word_count_file];
        for (i, a) in outputs.iter().enumerate() {
            if outputs[i + 1..].contains(a) {
                return Err(Error::Config(format!(
                    "output path {} is used twice",
                    a.display()
                )));
            }
        }
        Ok(())
    }

    fn output_paths(&self) -> OutputPaths {
        OutputPaths {
            store: self.output_store.clone(),
            metadata: self.output_json.clone(),
            word_counts: self.word_count_file.clone(),
        }
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct PrepSummary {
    pub items: usize,
    pub captions: usize,
    pub vocab_size: usize,
    pub splits: Vec<Split>,
    pub stats: VocabStats,
}

/// Runs the whole batch: load, shuffle, tokenize, build the vocabulary,
/// assign splits, encode, copy features and write the outputs.
pub fn run(config: &PrepConfig) -> Result<PrepSummary> {
    config.validate()?;
    tracing::info!(
        "parsed input parameters:\n{}",
        serde_json::to_string_pretty(config)?
    );

    let mut raw = load_manifest(&config.input_json)?;
    tracing::info!("loaded {} items from {}", raw.len(), config.input_json.display());
    check_split_counts(raw.len(), config.num_val, config.num_test)?;
    seeded_shuffle(&mut raw, config.seed);

    let tokenized = tokenize_items(&CaptionCleaner::new(), raw);

    let built = VocabBuilder::builder()
        .word_count_threshold(config.word_count_threshold)
        .unk_token(config.unk_token.clone())
        .top_words(config.top_words)
        .build()
        .build_vocab(tokenized)?;
    built.stats.log();

    let items = assign_splits(built.items, config.num_val, config.num_test)?;

    let encoder = CaptionEncoder::new(config.max_length)?;
    let encoded = encoder.encode(items.iter().map(|s| &s.item), &built.vocab)?;

    let reader = FeatureReader::new(config.feature_field.clone(), config.feature_dim);
    let feats = FeatureStore::gather(
        &reader,
        items.iter().map(|s| s.item.raw.file_path.as_path()),
        config.show_progress,
    )?;

    let metadata = Metadata {
        ix_to_word: built.vocab.ix_to_word(),
        feats_info: items
            .iter()
            .map(|s| FeatInfo {
                split: s.split,
                captions: s.item.raw.captions.clone(),
                file_path: s.item.raw.file_path.clone(),
            })
            .collect(),
    };

    write_outputs(
        &config.output_paths(),
        &encoded,
        &feats,
        &metadata,
        &built.word_counts,
    )?;

    Ok(PrepSummary {
        items: items.len(),
        captions: encoded.rows,
        vocab_size: built.vocab.len(),
        splits: items.iter().map(|s| s.split).collect(),
        stats: built.stats,
    })
}
