// src/prepro/mod.rs

pub mod encoder;
pub mod features;
pub mod manifest;
pub mod pipeline;
pub mod pre_tokenizer;
pub mod progress;
pub mod result;
pub mod split;
pub mod vocab;
pub mod vocab_builder;
pub mod writer;

pub use encoder::{CaptionEncoder, EncodedCaptions};
pub use features::{FeatureReader, FeatureStore};
pub use manifest::{RawItem, load_manifest};
pub use pipeline::{PrepConfig, PrepSummary, run};
pub use pre_tokenizer::{CaptionCleaner, PreTokenizer, TokenizedItem, tokenize_items};
pub use result::{Error, Result};
pub use split::{Split, SplitItem, assign_splits, seeded_shuffle};
pub use vocab::Vocabulary;
pub use vocab_builder::{FinalizedItem, VocabBuilder, VocabBuilderBuilder, VocabOutput, VocabStats};
pub use writer::{FeatInfo, Metadata, OutputPaths, write_outputs};
