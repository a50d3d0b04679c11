//! Packs an image-feature/caption manifest into a safetensors array store
//! plus a JSON index for caption-model training.

pub mod prepro;

pub use prepro::{Error, PrepConfig, PrepSummary, Result, run};
