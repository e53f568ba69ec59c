//! # expdata
//!
//! Named datasets for machine-learning experiment runs.
//!
//! ## Modules
//!
//! - **core**: `Tensor` storage for feature matrices, label vectors and image batches
//! - **io**: delimited numeric text reader, HTTP download, transparent gzip
//! - **data**: `Dataset` trait, `DataLoader` batch source, image transforms
//! - **datasets**: tabular registry, iris/wine reference data, synthetic classification, MNIST
//!
//! ```no_run
//! use expdata::datasets::{get_registry, DatasetConfig};
//!
//! let registry = get_registry(&DatasetConfig::default())?;
//! let (x, y) = registry.load("synth-8-easy")?;
//! assert_eq!(x.nrows()?, y.numel());
//! # Ok::<(), expdata::datasets::DatasetError>(())
//! ```

/// Core tensor type.
pub use expdata_core as core;

/// File and network I/O.
pub use expdata_io as io;

/// Datasets, batch loaders and transforms.
pub use expdata_data as data;

/// Dataset registry and vision pipeline.
pub use expdata_datasets as datasets;

pub use expdata_datasets::{
    build_vision_loaders, get_registry, DatasetConfig, DatasetError, DatasetResult,
    HarnessConfig, LabeledData, Registry, VisionConfig,
};
