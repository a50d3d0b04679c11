// src/prepro/writer.rs

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use safetensors::Dtype;
use safetensors::tensor::TensorView;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::prepro::Result;
use crate::prepro::encoder::EncodedCaptions;
use crate::prepro::features::FeatureStore;
use crate::prepro::split::Split;

/// Per-item record in the metadata document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatInfo {
    pub split: Split,
    pub captions: Vec<String>,
    pub file_path: PathBuf,
}

/// The JSON companion of the array store. `ix_to_word` keys are written as
/// strings ("1", "2", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub ix_to_word: BTreeMap<u32, String>,
    pub feats_info: Vec<FeatInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub store: PathBuf,
    pub metadata: PathBuf,
    pub word_counts: PathBuf,
}

fn u32_bytes(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Serializes the label arrays and the feature matrix into one safetensors blob.
pub fn store_bytes(encoded: &EncodedCaptions, feats: &FeatureStore) -> Result<Vec<u8>> {
    let n = encoded.num_items();
    let labels = u32_bytes(&encoded.labels);
    let start = u32_bytes(&encoded.label_start_ix);
    let end = u32_bytes(&encoded.label_end_ix);
    let length = u32_bytes(&encoded.label_length);
    let feat_data = f32_bytes(&feats.data);

    let mut tensors: HashMap<String, TensorView<'_>> = HashMap::new();
    tensors.insert(
        "labels".into(),
        TensorView::new(Dtype::U32, vec![encoded.rows, encoded.max_length], &labels)?,
    );
    tensors.insert(
        "label_start_ix".into(),
        TensorView::new(Dtype::U32, vec![n], &start)?,
    );
    tensors.insert("label_end_ix".into(), TensorView::new(Dtype::U32, vec![n], &end)?);
    tensors.insert(
        "label_length".into(),
        TensorView::new(Dtype::U32, vec![encoded.rows], &length)?,
    );
    tensors.insert(
        "feats".into(),
        TensorView::new(Dtype::F32, vec![feats.rows, feats.dim], &feat_data)?,
    );

    Ok(safetensors::serialize(&tensors, &None)?)
}

/// One `count<TAB>word` line per word, in the given order.
pub fn word_count_lines(word_counts: &[(String, u64)]) -> String {
    let mut out = String::new();
    for (word, count) in word_counts {
        out.push_str(&format!("{count}\t{word}\n"));
    }
    out
}

// Temp file next to the destination so the final rename stays on one filesystem.
fn stage<F>(dest: &Path, write: F) -> Result<NamedTempFile>
where
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<()>,
{
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&dir)?;
    let mut tmp = NamedTempFile::new_in(&dir)?;
    {
        let mut w = BufWriter::new(&mut tmp);
        write(&mut w)?;
        w.flush()?;
    }
    tmp.as_file().sync_all()?;
    Ok(tmp)
}

/// Writes all three outputs. Nothing appears at the destination paths
/// unless every file was fully written.
pub fn write_outputs(
    paths: &OutputPaths,
    encoded: &EncodedCaptions,
    feats: &FeatureStore,
    metadata: &Metadata,
    word_counts: &[(String, u64)],
) -> Result<()> {
    let store = store_bytes(encoded, feats)?;
    let store_tmp = stage(&paths.store, |w| Ok(w.write_all(&store)?))?;
    let meta_tmp = stage(&paths.metadata, |w| Ok(serde_json::to_writer(w, metadata)?))?;
    let counts_tmp = stage(&paths.word_counts, |w| {
        Ok(w.write_all(word_count_lines(word_counts).as_bytes())?)
    })?;

    store_tmp.persist(&paths.store)?;
    tracing::info!("wrote {}", paths.store.display());
    meta_tmp.persist(&paths.metadata)?;
    tracing::info!("wrote {}", paths.metadata.display());
    counts_tmp.persist(&paths.word_counts)?;
    tracing::info!("wrote {}", paths.word_counts.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use safetensors::SafeTensors;

    fn encoded() -> EncodedCaptions {
        EncodedCaptions {
            labels: vec![1, 2, 0, 3, 0, 0],
            rows: 2,
            max_length: 3,
            label_start_ix: vec![1],
            label_end_ix: vec![2],
            label_length: vec![2, 1],
        }
    }

    #[test]
    fn store_has_named_fields_with_shapes() {
        let mut feats = FeatureStore::zeros(1, 2);
        feats.set_row(0, &[1.5, -1.0]);
        let bytes = store_bytes(&encoded(), &feats).unwrap();
        let st = SafeTensors::deserialize(&bytes).unwrap();

        let labels = st.tensor("labels").unwrap();
        assert_eq!(labels.dtype(), Dtype::U32);
        assert_eq!(labels.shape(), &[2, 3]);
        assert_eq!(st.tensor("label_start_ix").unwrap().shape(), &[1]);
        assert_eq!(st.tensor("label_end_ix").unwrap().shape(), &[1]);
        assert_eq!(st.tensor("label_length").unwrap().shape(), &[2]);
        let f = st.tensor("feats").unwrap();
        assert_eq!(f.dtype(), Dtype::F32);
        assert_eq!(f.shape(), &[1, 2]);
        assert_eq!(&f.data()[..4], &1.5f32.to_le_bytes());
    }

    #[test]
    fn metadata_uses_string_ids_and_lowercase_splits() {
        let meta = Metadata {
            ix_to_word: BTreeMap::from([(1, "a".to_string()), (2, "UNK".to_string())]),
            feats_info: vec![FeatInfo {
                split: Split::Test,
                captions: vec!["A cap.".into()],
                file_path: PathBuf::from("f/0.safetensors"),
            }],
        };
        let v = serde_json::to_value(&meta).unwrap();
        assert_eq!(v["ix_to_word"]["1"], "a");
        assert_eq!(v["ix_to_word"]["2"], "UNK");
        assert_eq!(v["feats_info"][0]["split"], "test");
        assert_eq!(v["feats_info"][0]["file_path"], "f/0.safetensors");
    }

    #[test]
    fn word_counts_are_tab_separated() {
        let lines = word_count_lines(&[("a".into(), 3), ("dog".into(), 1)]);
        assert_eq!(lines, "3\ta\n1\tdog\n");
    }

    #[test]
    fn outputs_land_in_fresh_directories() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths {
            store: dir.path().join("out/data.safetensors"),
            metadata: dir.path().join("out/data.json"),
            word_counts: dir.path().join("out/counts.txt"),
        };
        let meta = Metadata {
            ix_to_word: BTreeMap::new(),
            feats_info: vec![],
        };
        write_outputs(&paths, &encoded(), &FeatureStore::zeros(1, 2), &meta, &[]).unwrap();
        assert!(paths.store.is_file());
        assert!(paths.metadata.is_file());
        assert!(paths.word_counts.is_file());
        // only the three outputs, no leftover temp files
        assert_eq!(fs::read_dir(dir.path().join("out")).unwrap().count(), 3);
    }
}
