// src/prepro/manifest.rs

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::prepro::{Error, Result};

/// One manifest entry: a per-item feature file and its raw captions.
///
/// Unknown fields in the manifest are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawItem {
    pub file_path: PathBuf,
    pub captions: Vec<String>,
}

impl RawItem {
    pub fn new<P: Into<PathBuf>>(file_path: P, captions: Vec<String>) -> Self {
        Self {
            file_path: file_path.into(),
            captions,
        }
    }
}

/// Reads the JSON manifest: a top-level array of `{file_path, captions}` records.
pub fn load_manifest(path: &Path) -> Result<Vec<RawItem>> {
    let file = File::open(path).map_err(|e| Error::ManifestParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    parse_manifest(BufReader::new(file)).map_err(|e| Error::ManifestParse {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

pub(crate) fn parse_manifest<R: std::io::Read>(
    reader: R,
) -> std::result::Result<Vec<RawItem>, serde_json::Error> {
    serde_json::from_reader(reader)
}
