use std::path::PathBuf;
use thiserror::Error;

/// Failures while reading dataset files or fetching them over HTTP.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Parse error in {} at line {line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download of {url} failed: {message}")]
    Http { url: String, message: String },
}

pub type IoResult<T> = Result<T, IoError>;
