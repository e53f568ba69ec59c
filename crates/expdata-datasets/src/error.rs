use std::path::PathBuf;

use expdata_core::TensorError;
use expdata_io::IoError;
use thiserror::Error;

/// Everything a dataset loader can fail with.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Parse error in {} at line {line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    #[error("Duplicate dataset name: {0}")]
    DuplicateDataset(String),

    #[error("Invalid config file: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Tensor error: {0}")]
    Tensor(#[from] TensorError),
}

impl DatasetError {
    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        DatasetError::Parse {
            path: path.into(),
            line: 0,
            message: message.into(),
        }
    }
}

impl From<IoError> for DatasetError {
    fn from(e: IoError) -> Self {
        match e {
            IoError::NotFound(path) => DatasetError::FileNotFound(path),
            IoError::Parse {
                path,
                line,
                message,
            } => DatasetError::Parse {
                path,
                line,
                message,
            },
            IoError::Io(e) => DatasetError::Io(e),
            IoError::Http { url, message } => {
                DatasetError::Download(format!("{}: {}", url, message))
            }
        }
    }
}

pub type DatasetResult<T> = Result<T, DatasetError>;
