//! Paths and batch sizes for an experiment run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::DatasetResult;

/// Where the tabular loaders find their files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Directory holding `audit_risk.csv`, `diabetes.csv`, `wheat.csv`, ...
    pub data_dir: PathBuf,
    /// Cache directory for the iris and wine reference CSVs.
    pub reference_dir: PathBuf,
    /// Fetch missing reference CSVs instead of failing.
    pub download_reference: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/raw/"),
            reference_dir: PathBuf::from("data/reference/"),
            download_reference: true,
        }
    }
}

impl DatasetConfig {
    /// Defaults with a different `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }
}

/// Settings for the MNIST batch sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Directory holding the MNIST IDX files (plain or `.gz`).
    pub mnist_dir: PathBuf,
    pub batch_size: usize,
    pub test_batch_size: usize,
    /// Shuffle seed; `None` reshuffles from OS entropy.
    pub seed: Option<u64>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            mnist_dir: PathBuf::from("../data/MNIST/raw"),
            batch_size: 64,
            test_batch_size: 1000,
            seed: None,
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub data: DatasetConfig,
    pub vision: VisionConfig,
}

impl HarnessConfig {
    pub fn from_json_str(json: &str) -> DatasetResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> DatasetResult<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }
}
