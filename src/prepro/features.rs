// src/prepro/features.rs

use std::fs;
use std::path::Path;

use safetensors::{Dtype, SafeTensors};

use crate::prepro::progress::feature_bar;
use crate::prepro::{Error, Result};

/// Reads one fixed-width F32 vector per item from that item's own
/// safetensors file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureReader {
    field: String,
    dim: usize,
}

impl FeatureReader {
    pub fn new<S: Into<String>>(field: S, dim: usize) -> Self {
        Self {
            field: field.into(),
            dim,
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The whole file is read and its handle released before parsing, so a
    /// failure never holds a file open.
    pub fn read(&self, item: usize, path: &Path) -> Result<Vec<f32>> {
        let fail = |reason: String| Error::FeatureSource {
            item,
            path: path.to_path_buf(),
            reason,
        };

        let bytes = fs::read(path).map_err(|e| fail(e.to_string()))?;
        let tensors = SafeTensors::deserialize(&bytes).map_err(|e| fail(e.to_string()))?;
        let view = tensors
            .tensor(&self.field)
            .map_err(|_| fail(format!("no tensor named {:?}", self.field)))?;

        if view.dtype() != Dtype::F32 {
            return Err(fail(format!("expected F32 data, found {:?}", view.dtype())));
        }
        // a flat [D] vector or a single [1, D] row
        match view.shape() {
            [d] | [1, d] if *d == self.dim => {}
            shape => {
                return Err(fail(format!(
                    "expected shape [{0}] or [1, {0}], found {shape:?}",
                    self.dim
                )));
            }
        }

        Ok(view
            .data()
            .chunks_exact(4)
            .map(|chunk| {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(chunk);
                f32::from_le_bytes(buf)
            })
            .collect())
    }
}

/// Dense `rows x dim` F32 matrix; row `i` belongs to item `i`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureStore {
    pub data: Vec<f32>,
    pub rows: usize,
    pub dim: usize,
}

impl FeatureStore {
    pub fn zeros(rows: usize, dim: usize) -> Self {
        Self {
            data: vec![0.0; rows * dim],
            rows,
            dim,
        }
    }

    pub fn row(&self, row: usize) -> &[f32] {
        &self.data[row * self.dim..(row + 1) * self.dim]
    }

    pub fn set_row(&mut self, row: usize, values: &[f32]) {
        self.data[row * self.dim..(row + 1) * self.dim].copy_from_slice(values);
    }

    /// Copies the features of every path, in order, into a new store.
    pub fn gather<'a, I>(reader: &FeatureReader, paths: I, show_progress: bool) -> Result<Self>
    where
        I: ExactSizeIterator<Item = &'a Path>,
    {
        let n = paths.len();
        let mut store = Self::zeros(n, reader.dim());
        let progress = feature_bar(n, show_progress);

        for (i, path) in paths.enumerate() {
            let values = reader.read(i, path)?;
            store.set_row(i, &values);

            if i % 1000 == 0 {
                tracing::info!(
                    "processing {}/{} ({:.2}% done)",
                    i,
                    n,
                    i as f64 * 100.0 / n as f64
                );
            }
            if let Some(p) = &progress {
                p.inc(1);
            }
        }
        if let Some(p) = &progress {
            p.finish();
        }
        Ok(store)
    }
}
