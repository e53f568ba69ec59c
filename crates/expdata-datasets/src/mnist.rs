//! MNIST handwritten digits from IDX files.
//!
//! Files are looked up uncompressed first, then with a `.gz` suffix, and
//! downloaded from the mirror as `.gz` when both are missing and the caller
//! allows it.

use std::io::Read;
use std::path::{Path, PathBuf};

use expdata_core::{Tensor, TensorError, TensorResult};
use expdata_data::{Compose, Dataset, ToTensor, Transform};
use expdata_io::{download_file, open_maybe_gz};
use tracing::debug;

use crate::error::{DatasetError, DatasetResult};

/// Mirror serving the gzipped IDX files.
pub const MNIST_BASE_URL: &str = "https://ossci-datasets.s3.amazonaws.com/mnist/";

const IMAGES_MAGIC: u32 = 2051;
const LABELS_MAGIC: u32 = 2049;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MnistSplit {
    /// 60,000 samples.
    Train,
    /// 10,000 samples.
    Test,
}

impl MnistSplit {
    /// `(images, labels)` file names without the `.gz` suffix.
    pub fn file_names(self) -> (&'static str, &'static str) {
        match self {
            MnistSplit::Train => ("train-images-idx3-ubyte", "train-labels-idx1-ubyte"),
            MnistSplit::Test => ("t10k-images-idx3-ubyte", "t10k-labels-idx1-ubyte"),
        }
    }
}

/// Raw 8-bit images plus the per-sample transform applied on access.
///
/// Samples come out as a `[1, rows, cols]` `f32` image and a scalar label.
pub struct MnistDataset {
    pixels: Vec<u8>,
    labels: Vec<u8>,
    rows: usize,
    cols: usize,
    transform: Compose<f32>,
}

impl MnistDataset {
    /// Load `split` from `dir`, fetching missing files when `download` is set.
    pub fn load(dir: &Path, split: MnistSplit, download: bool) -> DatasetResult<Self> {
        Self::load_from_mirror(dir, split, download, MNIST_BASE_URL)
    }

    pub fn load_from_mirror(
        dir: &Path,
        split: MnistSplit,
        download: bool,
        base_url: &str,
    ) -> DatasetResult<Self> {
        let (images, labels) = split.file_names();
        let images = ensure_file(dir, images, download, base_url)?;
        let labels = ensure_file(dir, labels, download, base_url)?;
        Self::from_idx(&images, &labels)
    }

    /// Parse an image file and its label file.
    pub fn from_idx(images_path: &Path, labels_path: &Path) -> DatasetResult<Self> {
        let (pixels, count, rows, cols) = parse_idx_images(images_path)?;
        let labels = parse_idx_labels(labels_path)?;
        if labels.len() != count {
            return Err(DatasetError::parse(
                labels_path,
                format!("{} labels for {} images", labels.len(), count),
            ));
        }
        debug!(
            images = %images_path.display(),
            count, rows, cols,
            "loaded MNIST split"
        );
        Ok(MnistDataset {
            pixels,
            labels,
            rows,
            cols,
            transform: Compose::new(Vec::new()),
        })
    }

    /// Build from in-memory pixels, `rows * cols` bytes per label.
    pub fn from_raw(
        pixels: Vec<u8>,
        labels: Vec<u8>,
        rows: usize,
        cols: usize,
    ) -> TensorResult<Self> {
        let expected = labels
            .len()
            .checked_mul(rows)
            .and_then(|n| n.checked_mul(cols));
        if expected != Some(pixels.len()) {
            return Err(TensorError::ShapeMismatch {
                expected: vec![labels.len(), rows, cols],
                got: vec![pixels.len()],
            });
        }
        Ok(MnistDataset {
            pixels,
            labels,
            rows,
            cols,
            transform: Compose::new(Vec::new()),
        })
    }

    pub fn with_transform(mut self, transform: Compose<f32>) -> Self {
        self.transform = transform;
        self
    }

    pub fn image_dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn label(&self, idx: usize) -> Option<u8> {
        self.labels.get(idx).copied()
    }
}

impl Dataset for MnistDataset {
    type Elem = f32;

    fn len(&self) -> usize {
        self.labels.len()
    }

    fn get(&self, idx: usize) -> TensorResult<(Tensor<f32>, Tensor<f32>)> {
        let label = self.label(idx).ok_or(TensorError::IndexOutOfBounds {
            index: idx,
            axis: 0,
            size: self.labels.len(),
        })?;
        let plane = self.rows * self.cols;
        let pixels = &self.pixels[idx * plane..(idx + 1) * plane];
        let image = ToTensor::convert::<f32>(pixels, 1, self.rows, self.cols)?;
        let image = self.transform.apply(image)?;
        Ok((image, Tensor::scalar(label as f32)))
    }
}

fn ensure_file(
    dir: &Path,
    base_name: &str,
    download: bool,
    base_url: &str,
) -> DatasetResult<PathBuf> {
    let plain = dir.join(base_name);
    if plain.exists() {
        return Ok(plain);
    }
    let gz = dir.join(format!("{}.gz", base_name));
    if gz.exists() {
        return Ok(gz);
    }
    if !download {
        return Err(DatasetError::FileNotFound(plain));
    }
    download_file(&format!("{}{}.gz", base_url, base_name), &gz)?;
    Ok(gz)
}

fn read_u32s<R: Read, const N: usize>(reader: &mut R, path: &Path) -> DatasetResult<[u32; N]> {
    let mut out = [0u32; N];
    for v in out.iter_mut() {
        let mut buf = [0u8; 4];
        reader
            .read_exact(&mut buf)
            .map_err(|e| DatasetError::parse(path, format!("truncated IDX header: {}", e)))?;
        *v = u32::from_be_bytes(buf);
    }
    Ok(out)
}

fn check_magic(path: &Path, found: u32, expected: u32) -> DatasetResult<()> {
    if found != expected {
        return Err(DatasetError::parse(
            path,
            format!("bad IDX magic number {} (expected {})", found, expected),
        ));
    }
    Ok(())
}

/// Returns `(pixels, count, rows, cols)`.
fn parse_idx_images(path: &Path) -> DatasetResult<(Vec<u8>, usize, usize, usize)> {
    let mut reader = open_maybe_gz(path)?;
    let [magic, count, rows, cols] = read_u32s::<_, 4>(&mut reader, path)?;
    check_magic(path, magic, IMAGES_MAGIC)?;

    let expected = u64::from(count)
        .checked_mul(u64::from(rows))
        .and_then(|n| n.checked_mul(u64::from(cols)))
        .ok_or_else(|| {
            DatasetError::parse(
                path,
                format!("IDX header {} x {} x {} is too large", count, rows, cols),
            )
        })?;
    let pixels = read_body(&mut reader, expected, path, "pixel")?;
    Ok((pixels, count as usize, rows as usize, cols as usize))
}

fn parse_idx_labels(path: &Path) -> DatasetResult<Vec<u8>> {
    let mut reader = open_maybe_gz(path)?;
    let [magic, count] = read_u32s::<_, 2>(&mut reader, path)?;
    check_magic(path, magic, LABELS_MAGIC)?;

    read_body(&mut reader, u64::from(count), path, "label")
}

/// Read exactly `expected` bytes. The buffer grows with the data actually
/// present, so a corrupt header cannot force a huge allocation.
fn read_body<R: Read>(
    reader: &mut R,
    expected: u64,
    path: &Path,
    what: &str,
) -> DatasetResult<Vec<u8>> {
    if usize::try_from(expected).is_err() {
        return Err(DatasetError::parse(
            path,
            format!("{} data of {} bytes does not fit in memory", what, expected),
        ));
    }

    let mut body = Vec::new();
    reader
        .by_ref()
        .take(expected)
        .read_to_end(&mut body)
        .map_err(|e| DatasetError::parse(path, format!("unreadable {} data: {}", what, e)))?;
    if body.len() as u64 != expected {
        return Err(DatasetError::parse(
            path,
            format!(
                "truncated {} data: header declares {} bytes, found {}",
                what,
                expected,
                body.len()
            ),
        ));
    }
    Ok(body)
}
