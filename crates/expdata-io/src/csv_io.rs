use expdata_core::Tensor;
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{IoError, IoResult};

/// Field separator of a numeric text file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// A single separator byte, e.g. `b','`.
    Byte(u8),
    /// Any run of spaces or tabs.
    Whitespace,
}

/// How to read a headerless numeric matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    pub delimiter: Delimiter,
    /// Lines starting with this byte are skipped.
    pub comment: Option<u8>,
    /// Leading non-comment rows to discard, e.g. a metadata line.
    pub skip_rows: usize,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Byte(b','),
            comment: None,
            skip_rows: 0,
        }
    }
}

impl ReadOptions {
    pub fn comma() -> Self {
        Self::default()
    }

    pub fn whitespace() -> Self {
        Self {
            delimiter: Delimiter::Whitespace,
            comment: None,
            skip_rows: 0,
        }
    }

    pub fn comment(mut self, c: u8) -> Self {
        self.comment = Some(c);
        self
    }

    pub fn skip_rows(mut self, n: usize) -> Self {
        self.skip_rows = n;
        self
    }
}

/// Read a headerless file of numbers into a `[rows, cols]` tensor.
///
/// Every non-comment line must have the same number of fields and every
/// field must parse as `f64`. Blank lines are skipped.
pub fn read_matrix(path: impl AsRef<Path>, opts: &ReadOptions) -> IoResult<Tensor<f64>> {
    let path = path.as_ref();
    let mut rows = RowCollector::new(path);

    match opts.delimiter {
        Delimiter::Byte(delim) => {
            let file = open(path)?;
            let mut rdr = csv::ReaderBuilder::new()
                .has_headers(false)
                .delimiter(delim)
                .comment(opts.comment)
                .flexible(true)
                .trim(csv::Trim::All)
                .from_reader(file);
            for result in rdr.records().skip(opts.skip_rows) {
                let record = result.map_err(|e| csv_error(path, e))?;
                let line = record.position().map_or(0, |p| p.line());
                rows.push(line, record.iter())?;
            }
        }
        Delimiter::Whitespace => {
            let content = match fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(IoError::NotFound(path.to_path_buf()))
                }
                Err(e) if e.kind() == ErrorKind::InvalidData => {
                    return Err(IoError::Parse {
                        path: path.to_path_buf(),
                        line: 0,
                        message: e.to_string(),
                    })
                }
                Err(e) => return Err(e.into()),
            };
            let data_lines = content
                .lines()
                .enumerate()
                .map(|(i, line)| (i as u64 + 1, line.trim()))
                .filter(|(_, line)| !line.is_empty())
                .filter(|(_, line)| opts.comment.map_or(true, |c| line.as_bytes()[0] != c))
                .skip(opts.skip_rows);
            for (line_no, line) in data_lines {
                rows.push(line_no, line.split_whitespace())?;
            }
        }
    }

    let tensor = rows.finish()?;
    debug!(path = %path.display(), shape = %tensor.shape(), "read numeric matrix");
    Ok(tensor)
}

fn open(path: &Path) -> IoResult<File> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => IoError::NotFound(path.to_path_buf()),
        _ => IoError::Io(e),
    })
}

/// Malformed records such as invalid UTF-8 become `Parse` errors tagged with
/// the file; only failures of the underlying reader stay `Io`.
fn csv_error(path: &Path, e: csv::Error) -> IoError {
    let line = e.position().map_or(0, |p| p.line());
    let message = e.to_string();
    match e.into_kind() {
        csv::ErrorKind::Io(io) => IoError::Io(io),
        _ => IoError::Parse {
            path: path.to_path_buf(),
            line,
            message,
        },
    }
}

/// Accumulates parsed rows and enforces a constant field count.
struct RowCollector {
    path: PathBuf,
    data: Vec<f64>,
    cols: Option<usize>,
    n_rows: usize,
}

impl RowCollector {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            data: Vec::new(),
            cols: None,
            n_rows: 0,
        }
    }

    fn push<'a>(&mut self, line: u64, fields: impl Iterator<Item = &'a str>) -> IoResult<()> {
        let before = self.data.len();
        for field in fields {
            let val: f64 = field.parse().map_err(|_| IoError::Parse {
                path: self.path.clone(),
                line,
                message: format!("invalid number {:?}", field),
            })?;
            self.data.push(val);
        }
        let width = self.data.len() - before;
        match self.cols {
            None => self.cols = Some(width),
            Some(expected) if expected != width => {
                return Err(IoError::Parse {
                    path: self.path.clone(),
                    line,
                    message: format!("expected {} fields, found {}", expected, width),
                });
            }
            Some(_) => {}
        }
        self.n_rows += 1;
        Ok(())
    }

    fn finish(self) -> IoResult<Tensor<f64>> {
        let cols = self.cols.unwrap_or(0);
        Tensor::new(self.data, vec![self.n_rows, cols]).map_err(|e| IoError::Parse {
            path: self.path,
            line: 0,
            message: e.to_string(),
        })
    }
}
