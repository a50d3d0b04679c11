// src/prepro/result.rs

use std::path::PathBuf;

use thiserror::Error;

/// Every failure the preprocessing run can hit. All of them are fatal: the
/// pipeline stops at the first one and no output file is finalized.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or inconsistent settings (split counts, lengths, names).
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to parse manifest {path}: {reason}")]
    ManifestParse { path: PathBuf, reason: String },

    #[error("item {item} ({path}) has no captions")]
    NoCaptions { item: usize, path: PathBuf },

    /// A caption that is left with zero words once punctuation is stripped.
    #[error("caption {caption} of item {item} ({path}) has no words after cleaning: {text:?}")]
    EmptyCaption {
        item: usize,
        caption: usize,
        path: PathBuf,
        text: String,
    },

    #[error("feature source {path} for item {item}: {reason}")]
    FeatureSource {
        item: usize,
        path: PathBuf,
        reason: String,
    },

    #[error("cannot build a vocabulary from an empty corpus")]
    CorpusEmpty,

    /// A final caption holds a word the vocabulary never assigned an id to.
    #[error("word {word:?} has no vocabulary id")]
    OutOfVocabulary { word: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("array store error: {0}")]
    Store(#[from] safetensors::SafeTensorError),
}

impl From<tempfile::PersistError> for Error {
    fn from(err: tempfile::PersistError) -> Self {
        Error::Io(err.error)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_item_and_source() {
        let err = Error::EmptyCaption {
            item: 3,
            caption: 1,
            path: PathBuf::from("img/3.safetensors"),
            text: "?!".into(),
        };
        assert_eq!(
            err.to_string(),
            r#"caption 1 of item 3 (img/3.safetensors) has no words after cleaning: "?!""#
        );

        let err = Error::FeatureSource {
            item: 7,
            path: PathBuf::from("x.safetensors"),
            reason: "no tensor named \"mp\"".into(),
        };
        assert_eq!(
            err.to_string(),
            r#"feature source x.safetensors for item 7: no tensor named "mp""#
        );
    }
}
