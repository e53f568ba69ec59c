//! Loaders for the classification datasets shipped as plain text files.
//!
//! Every file is a headerless numeric matrix with the class label in the last
//! column. The loaders only slice columns; values are passed through as read.

use std::fmt;
use std::path::{Path, PathBuf};

use expdata_io::{read_matrix, ReadOptions};
use tracing::debug;

use crate::error::DatasetResult;
use crate::labels::{select_binary, split_label_column};
use crate::LabeledData;

/// A dataset read from a fixed file name under the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileDataset {
    Audit,
    Diabetes,
    Sonar,
    Ionosphere,
    Banknotes,
    /// Seeds dataset reduced to the two classes `1` and `3`.
    WheatSeeds,
}

impl FileDataset {
    pub const ALL: [FileDataset; 6] = [
        FileDataset::Audit,
        FileDataset::Diabetes,
        FileDataset::Sonar,
        FileDataset::Ionosphere,
        FileDataset::Banknotes,
        FileDataset::WheatSeeds,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            FileDataset::Audit => "audit_risk.csv",
            FileDataset::Diabetes => "diabetes.csv",
            FileDataset::Sonar => "sonar.csv",
            FileDataset::Ionosphere => "ionosphere.csv",
            FileDataset::Banknotes => "banknotes.csv",
            FileDataset::WheatSeeds => "wheat.csv",
        }
    }

    pub fn read_options(self) -> ReadOptions {
        match self {
            FileDataset::Audit => ReadOptions::comma().comment(b'#'),
            FileDataset::WheatSeeds => ReadOptions::whitespace(),
            _ => ReadOptions::comma(),
        }
    }

    /// Trailing columns left out of `X`. The audit file carries a second
    /// target-like column before the label.
    pub fn trailing_columns(self) -> usize {
        match self {
            FileDataset::Audit => 2,
            _ => 1,
        }
    }

    /// `(rows, cols)` of the published raw file, label column included.
    /// Informational only; loaded files are not checked against it.
    pub fn reference_shape(self) -> Option<(usize, usize)> {
        match self {
            FileDataset::Audit => None,
            FileDataset::Diabetes => Some((768, 9)),
            FileDataset::Sonar => Some((208, 61)),
            FileDataset::Ionosphere => Some((351, 35)),
            FileDataset::Banknotes => Some((1372, 5)),
            FileDataset::WheatSeeds => Some((210, 8)),
        }
    }

    pub fn path(self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.file_name())
    }

    /// Read the file under `data_dir` and split it into `(X, y)`.
    pub fn load(self, data_dir: &Path) -> DatasetResult<LabeledData> {
        let path = self.path(data_dir);
        let raw = read_matrix(&path, &self.read_options())?;
        let (x, y) = split_label_column(&raw, self.trailing_columns())?;

        let (x, y) = match self {
            FileDataset::WheatSeeds => select_binary(&x, &y, 1.0, 3.0)?,
            _ => (x, y),
        };

        debug!(dataset = %self, x = %x.shape(), y = %y.shape(), "loaded tabular dataset");
        Ok((x, y))
    }
}

impl fmt::Display for FileDataset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FileDataset::Audit => "audit",
            FileDataset::Diabetes => "diabetes",
            FileDataset::Sonar => "sonar",
            FileDataset::Ionosphere => "ionosphere",
            FileDataset::Banknotes => "banknotes",
            FileDataset::WheatSeeds => "wheat-2d",
        };
        write!(f, "{}", name)
    }
}

pub fn load_audit(data_dir: &Path) -> DatasetResult<LabeledData> {
    FileDataset::Audit.load(data_dir)
}

pub fn load_diabetes(data_dir: &Path) -> DatasetResult<LabeledData> {
    FileDataset::Diabetes.load(data_dir)
}

pub fn load_sonar(data_dir: &Path) -> DatasetResult<LabeledData> {
    FileDataset::Sonar.load(data_dir)
}

pub fn load_ionosphere(data_dir: &Path) -> DatasetResult<LabeledData> {
    FileDataset::Ionosphere.load(data_dir)
}

pub fn load_banknotes(data_dir: &Path) -> DatasetResult<LabeledData> {
    FileDataset::Banknotes.load(data_dir)
}

/// Wheat seeds, classes `1 -> 0` and `3 -> 1`; class `2` rows are dropped.
pub fn load_wheat_2d(data_dir: &Path) -> DatasetResult<LabeledData> {
    FileDataset::WheatSeeds.load(data_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatasetError;
    use crate::testutil::scratch_dir;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_diabetes_shape() {
        let dir = scratch_dir("tabular");
        write(
            &dir,
            "diabetes.csv",
            "6,148,72,35,0,33.6,0.627,50,1\n\
             1,85,66,29,0,26.6,0.351,31,0\n\
             8,183,64,0,0,23.3,0.672,32,1\n",
        );
        let (x, y) = load_diabetes(&dir).unwrap();
        assert_eq!(x.shape_vec(), vec![3, 8]);
        assert_eq!(y.data(), &[1.0, 0.0, 1.0]);
        assert_eq!(x.row(1).unwrap()[1], 85.0);
    }

    #[test]
    fn test_audit_drops_two_columns() {
        let dir = scratch_dir("tabular");
        write(
            &dir,
            "audit_risk.csv",
            "# Sector_score,PARA_A,Score_A,Risk_score,Risk\n\
             3.89,4.18,0.6,8.574,1\n\
             3.89,0.0,0.2,1.548,0\n",
        );
        let (x, y) = load_audit(&dir).unwrap();
        assert_eq!(x.shape_vec(), vec![2, 3]);
        assert_eq!(x.row(0).unwrap(), &[3.89, 4.18, 0.6]);
        assert_eq!(y.data(), &[1.0, 0.0]);
    }

    #[test]
    fn test_wheat_filters_classes() {
        let dir = scratch_dir("tabular");
        write(
            &dir,
            "wheat.csv",
            "15.26\t14.84\t0.871\t1\n\
             17.63 15.98\t0.8673\t2\n\
             11.84\t13.21 0.8521\t3\n\
             14.88\t14.57\t0.8811\t1\n\
             12.1\t13.15\t0.8793\t3\n",
        );
        let (x, y) = load_wheat_2d(&dir).unwrap();
        assert_eq!(x.shape_vec(), vec![4, 3]);
        assert_eq!(y.data(), &[0.0, 1.0, 0.0, 1.0]);
        assert_eq!(x.row(1).unwrap()[0], 11.84);
        assert!(y.data().iter().all(|&v| v == 0.0 || v == 1.0));
    }

    #[test]
    fn test_every_file_dataset_reads_its_file() {
        let dir = scratch_dir("tabular");
        for ds in FileDataset::ALL {
            let body = match ds {
                FileDataset::WheatSeeds => "1 2 3\n4 5 1\n",
                _ => "1,2,3\n4,5,1\n",
            };
            write(&dir, ds.file_name(), body);
            let (x, y) = ds.load(&dir).unwrap();
            assert_eq!(x.nrows().unwrap(), y.numel());
            assert_eq!(x.ncols().unwrap(), 3 - ds.trailing_columns());
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = scratch_dir("tabular");
        match load_sonar(&dir) {
            Err(DatasetError::FileNotFound(p)) => assert_eq!(p, dir.join("sonar.csv")),
            other => panic!("expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_ragged_file() {
        let dir = scratch_dir("tabular");
        write(&dir, "banknotes.csv", "3.6,8.6,-2.8,-0.4,0\n4.5,8.1,-2.4,0\n");
        match load_banknotes(&dir) {
            Err(DatasetError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_undecodable_bytes_report_the_file() {
        let dir = scratch_dir("tabular");
        fs::write(dir.join("sonar.csv"), b"1,2,1\n\xff,3,0\n").unwrap();
        match load_sonar(&dir) {
            Err(DatasetError::Parse { path, .. }) => assert_eq!(path, dir.join("sonar.csv")),
            other => panic!("expected Parse, got {:?}", other),
        }

        fs::write(dir.join("wheat.csv"), b"1 2 1\n\xff\xfe 3\n").unwrap();
        match load_wheat_2d(&dir) {
            Err(DatasetError::Parse { path, .. }) => assert_eq!(path, dir.join("wheat.csv")),
            other => panic!("expected Parse, got {:?}", other),
        }
    }
}
