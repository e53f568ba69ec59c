//! Iris and wine, read from the scikit-learn reference CSV files.
//!
//! The files start with a metadata line `n_samples,n_features,<class names>`
//! followed by one row per sample with the integer class last.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use expdata_io::{download_file, read_matrix, ReadOptions};
use tracing::{debug, info};

use crate::config::DatasetConfig;
use crate::error::{DatasetError, DatasetResult};
use crate::labels::{select_binary, split_label_column};
use crate::LabeledData;

/// Source tree the reference CSVs are fetched from when missing locally.
pub const REFERENCE_BASE_URL: &str =
    "https://raw.githubusercontent.com/scikit-learn/scikit-learn/main/sklearn/datasets/data/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceDataset {
    Iris,
    Wine,
}

impl ReferenceDataset {
    pub fn file_name(self) -> &'static str {
        match self {
            ReferenceDataset::Iris => "iris.csv",
            ReferenceDataset::Wine => "wine_data.csv",
        }
    }

    /// Raw classes kept by the two-class variant, mapped to `0` and `1`.
    pub fn binary_classes(self) -> (f64, f64) {
        match self {
            ReferenceDataset::Iris => (1.0, 2.0),
            ReferenceDataset::Wine => (0.0, 2.0),
        }
    }
}

/// Locates the reference CSVs, downloading them on first use if allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceProvider {
    dir: PathBuf,
    download: bool,
    base_url: String,
}

impl ReferenceProvider {
    pub fn new(dir: impl Into<PathBuf>, download: bool) -> Self {
        ReferenceProvider {
            dir: dir.into(),
            download,
            base_url: REFERENCE_BASE_URL.to_string(),
        }
    }

    pub fn from_config(config: &DatasetConfig) -> Self {
        Self::new(&config.reference_dir, config.download_reference)
    }

    /// Fetch from a different mirror. `base_url` should end with `/`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the local copy, downloading it first when absent.
    pub fn ensure(&self, dataset: ReferenceDataset) -> DatasetResult<PathBuf> {
        let path = self.dir.join(dataset.file_name());
        if path.exists() {
            return Ok(path);
        }
        if !self.download {
            return Err(DatasetError::FileNotFound(path));
        }
        let url = format!("{}{}", self.base_url, dataset.file_name());
        info!(%url, "reference dataset missing locally, fetching");
        download_file(&url, &path)?;
        Ok(path)
    }

    /// The full multi-class dataset.
    pub fn load(&self, dataset: ReferenceDataset) -> DatasetResult<LabeledData> {
        let path = self.ensure(dataset)?;
        let (n_samples, n_features) = read_header(&path)?;
        let raw = read_matrix(&path, &ReadOptions::comma().skip_rows(1))?;

        let (rows, cols) = (raw.nrows()?, raw.ncols()?);
        if rows != n_samples || cols != n_features + 1 {
            return Err(DatasetError::parse(
                &path,
                format!(
                    "header declares {} samples x {} features, body has {} rows x {} columns",
                    n_samples, n_features, rows, cols
                ),
            ));
        }

        let (x, y) = split_label_column(&raw, 1)?;
        debug!(file = %path.display(), x = %x.shape(), "loaded reference dataset");
        Ok((x, y))
    }

    /// The two-class variant, see [`ReferenceDataset::binary_classes`].
    pub fn load_binary(&self, dataset: ReferenceDataset) -> DatasetResult<LabeledData> {
        let (x, y) = self.load(dataset)?;
        let (negative, positive) = dataset.binary_classes();
        select_binary(&x, &y, negative, positive)
    }
}

fn read_header(path: &Path) -> DatasetResult<(usize, usize)> {
    let file = File::open(path).map_err(|_| DatasetError::FileNotFound(path.to_path_buf()))?;
    let mut line = String::new();
    BufReader::new(file).read_line(&mut line)?;

    let mut fields = line.trim().split(',').map(str::trim);
    let mut count = |what: &str| -> DatasetResult<usize> {
        fields
            .next()
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| DatasetError::Parse {
                path: path.to_path_buf(),
                line: 1,
                message: format!("header is missing {}", what),
            })
    };
    let n_samples = count("n_samples")?;
    let n_features = count("n_features")?;
    Ok((n_samples, n_features))
}

pub fn load_iris_2d(provider: &ReferenceProvider) -> DatasetResult<LabeledData> {
    provider.load_binary(ReferenceDataset::Iris)
}

pub fn load_iris_3d(provider: &ReferenceProvider) -> DatasetResult<LabeledData> {
    provider.load(ReferenceDataset::Iris)
}

pub fn load_wine_2d(provider: &ReferenceProvider) -> DatasetResult<LabeledData> {
    provider.load_binary(ReferenceDataset::Wine)
}

pub fn load_wine_3d(provider: &ReferenceProvider) -> DatasetResult<LabeledData> {
    provider.load(ReferenceDataset::Wine)
}
