// src/prepro/split.rs

use std::fmt;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::prepro::vocab_builder::FinalizedItem;
use crate::prepro::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitItem {
    pub item: FinalizedItem,
    pub split: Split,
}

/// Shuffles `items` in place with a generator seeded from `seed` only, so the
/// same seed and input order always yield the same permutation.
pub fn seeded_shuffle<T>(items: &mut [T], seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    items.shuffle(&mut rng);
}

/// Labels the first `num_val` items "val", the next `num_test` "test" and the
/// rest "train". Position is the only input; shuffle beforehand.
pub fn assign_splits(
    items: Vec<FinalizedItem>,
    num_val: usize,
    num_test: usize,
) -> Result<Vec<SplitItem>> {
    check_split_counts(items.len(), num_val, num_test)?;

    let out: Vec<SplitItem> = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let split = if i < num_val {
                Split::Val
            } else if i < num_val + num_test {
                Split::Test
            } else {
                Split::Train
            };
            SplitItem { item, split }
        })
        .collect();

    tracing::info!("assigned {} to val, {} to test.", num_val, num_test);
    Ok(out)
}

pub(crate) fn check_split_counts(total: usize, num_val: usize, num_test: usize) -> Result<()> {
    match num_val.checked_add(num_test) {
        Some(held_out) if held_out <= total => Ok(()),
        _ => Err(Error::Config(format!(
            "num_val ({num_val}) + num_test ({num_test}) exceeds the {total} available items"
        ))),
    }
}
