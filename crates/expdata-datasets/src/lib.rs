//! Named datasets for experiment runs.
//!
//! - [`Registry`]: immutable `name -> Loader` map of the standard tabular datasets
//! - [`tabular`]: file-backed loaders (audit, diabetes, sonar, ionosphere, banknotes, wheat)
//! - [`reference`]: iris and wine from the scikit-learn reference CSVs
//! - [`synthetic`]: seeded two-class "make_classification" generator
//! - [`vision`]: MNIST train/test batch sources

pub mod config;
pub mod error;
pub mod labels;
pub mod mnist;
pub mod reference;
pub mod registry;
pub mod synthetic;
pub mod tabular;
pub mod vision;

use expdata_core::Tensor;

/// A feature matrix `[n_samples, n_features]` and its label vector `[n_samples]`.
pub type LabeledData = (Tensor<f64>, Tensor<f64>);

pub use config::{DatasetConfig, HarnessConfig, VisionConfig};
pub use error::{DatasetError, DatasetResult};
pub use mnist::{MnistDataset, MnistSplit};
pub use reference::{ReferenceDataset, ReferenceProvider};
pub use registry::{get_registry, DatasetId, Loader, Registry, RegistryBuilder};
pub use synthetic::{generate, Difficulty, SynthSpec};
pub use tabular::FileDataset;
pub use vision::build_vision_loaders;
