// src/prepro/encoder.rs

use crate::prepro::vocab::Vocabulary;
use crate::prepro::vocab_builder::FinalizedItem;
use crate::prepro::{Error, Result};

/// All captions packed into one zero-padded `rows x max_length` matrix, with
/// 1-based inclusive per-item row ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCaptions {
    /// Row-major, `rows * max_length` entries.
    pub labels: Vec<u32>,
    pub rows: usize,
    pub max_length: usize,
    pub label_start_ix: Vec<u32>,
    pub label_end_ix: Vec<u32>,
    pub label_length: Vec<u32>,
}

impl EncodedCaptions {
    pub fn row(&self, row: usize) -> &[u32] {
        &self.labels[row * self.max_length..(row + 1) * self.max_length]
    }

    pub fn num_items(&self) -> usize {
        self.label_start_ix.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptionEncoder {
    max_length: usize,
}

impl CaptionEncoder {
    pub fn new(max_length: usize) -> Result<Self> {
        if max_length == 0 {
            return Err(Error::Config("max_length must be at least 1".into()));
        }
        Ok(Self { max_length })
    }

    /// Encodes every final caption of `items`, in order. Tokens past
    /// `max_length` are dropped; an item without captions or a caption
    /// without tokens is an error.
    pub fn encode<'a, I>(&self, items: I, vocab: &Vocabulary) -> Result<EncodedCaptions>
    where
        I: IntoIterator<Item = &'a FinalizedItem>,
    {
        if vocab.is_empty() {
            return Err(Error::CorpusEmpty);
        }
        let items: Vec<&FinalizedItem> = items.into_iter().collect();
        let m = self.max_length;

        for (i, item) in items.iter().enumerate() {
            if item.final_captions.is_empty() {
                return Err(Error::NoCaptions {
                    item: i,
                    path: item.raw.file_path.clone(),
                });
            }
        }
        let rows: usize = items.iter().map(|it| it.final_captions.len()).sum();

        let mut labels = vec![0u32; rows * m];
        let mut label_start_ix = Vec::with_capacity(items.len());
        let mut label_end_ix = Vec::with_capacity(items.len());
        let mut label_length = Vec::with_capacity(rows);

        let mut row = 0usize;
        for (i, item) in items.iter().enumerate() {
            let n = item.final_captions.len();
            for (j, caption) in item.final_captions.iter().enumerate() {
                if caption.is_empty() {
                    return Err(Error::EmptyCaption {
                        item: i,
                        caption: j,
                        path: item.raw.file_path.clone(),
                        text: item.raw.captions.get(j).cloned().unwrap_or_default(),
                    });
                }
                label_length.push(caption.len().min(m) as u32);
                let cells = &mut labels[row * m..(row + 1) * m];
                for (cell, word) in cells.iter_mut().zip(caption) {
                    *cell = vocab.id(word).ok_or_else(|| Error::OutOfVocabulary {
                        word: word.clone(),
                    })?;
                }
                row += 1;
            }
            // 1-based, inclusive
            let start = row - n + 1;
            label_start_ix.push(start as u32);
            label_end_ix.push(row as u32);
        }

        tracing::info!("encoded captions to array of size ({}, {})", rows, m);
        Ok(EncodedCaptions {
            labels,
            rows,
            max_length: m,
            label_start_ix,
            label_end_ix,
            label_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepro::manifest::RawItem;

    fn finalized(path: &str, captions: &[&[&str]]) -> FinalizedItem {
        FinalizedItem {
            raw: RawItem::new(path, captions.iter().map(|c| c.join(" ")).collect()),
            final_captions: captions
                .iter()
                .map(|c| c.iter().map(|w| w.to_string()).collect())
                .collect(),
        }
    }

    fn vocab() -> Vocabulary {
        Vocabulary::new(["a", "dog", "runs", "UNK"], Some("UNK".into()))
    }

    #[test]
    fn ranges_partition_rows_in_item_order() {
        let items = vec![
            finalized("0", &[&["a", "dog"], &["dog", "runs"]]),
            finalized("1", &[&["a"]]),
            finalized("2", &[&["runs"], &["UNK"], &["a", "UNK"]]),
        ];
        let enc = CaptionEncoder::new(4).unwrap().encode(&items, &vocab()).unwrap();
        assert_eq!(enc.rows, 6);
        assert_eq!(enc.label_start_ix, vec![1, 3, 4]);
        assert_eq!(enc.label_end_ix, vec![2, 3, 6]);
        for (i, item) in items.iter().enumerate() {
            let span = enc.label_end_ix[i] - enc.label_start_ix[i] + 1;
            assert_eq!(span as usize, item.final_captions.len());
        }
        assert_eq!(enc.label_length, vec![2, 2, 1, 1, 1, 2]);
    }

    #[test]
    fn rows_are_zero_padded_after_length() {
        let items = vec![finalized("0", &[&["dog", "runs"], &["a"]])];
        let enc = CaptionEncoder::new(4).unwrap().encode(&items, &vocab()).unwrap();
        assert_eq!(enc.row(0), &[2, 3, 0, 0]);
        assert_eq!(enc.row(1), &[1, 0, 0, 0]);
        for r in 0..enc.rows {
            let len = enc.label_length[r] as usize;
            assert!(enc.row(r)[..len].iter().all(|&id| id > 0));
            assert!(enc.row(r)[len..].iter().all(|&id| id == 0));
        }
    }

    #[test]
    fn long_captions_are_truncated() {
        let items = vec![finalized("0", &[&["a", "dog", "runs", "a", "dog"]])];
        let enc = CaptionEncoder::new(3).unwrap().encode(&items, &vocab()).unwrap();
        assert_eq!(enc.row(0), &[1, 2, 3]);
        assert_eq!(enc.label_length, vec![3]);
    }

    #[test]
    fn empty_caption_is_an_error() {
        let items = vec![
            finalized("ok", &[&["a"]]),
            finalized("bad", &[&["dog"], &[]]),
        ];
        let err = CaptionEncoder::new(4).unwrap().encode(&items, &vocab()).unwrap_err();
        match err {
            Error::EmptyCaption { item, caption, path, .. } => {
                assert_eq!((item, caption), (1, 1));
                assert_eq!(path, std::path::PathBuf::from("bad"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn item_without_captions_is_an_error() {
        let items = vec![finalized("0", &[&["a"]]), finalized("1", &[])];
        let err = CaptionEncoder::new(4).unwrap().encode(&items, &vocab()).unwrap_err();
        assert!(matches!(err, Error::NoCaptions { item: 1, .. }));
    }

    #[test]
    fn unknown_word_is_reported() {
        let items = vec![finalized("0", &[&["cat"]])];
        let err = CaptionEncoder::new(4).unwrap().encode(&items, &vocab()).unwrap_err();
        assert!(matches!(err, Error::OutOfVocabulary { word } if word == "cat"));
    }

    #[test]
    fn empty_vocabulary_is_rejected() {
        let items = vec![finalized("0", &[&["a"]])];
        let empty = Vocabulary::new(Vec::<String>::new(), None);
        let err = CaptionEncoder::new(4).unwrap().encode(&items, &empty).unwrap_err();
        assert!(matches!(err, Error::CorpusEmpty));
    }

    #[test]
    fn zero_max_length_is_rejected() {
        assert!(matches!(CaptionEncoder::new(0), Err(Error::Config(_))));
    }
}
