//! Sample-level datasets and the batch sources that iterate them.

pub mod dataloader;
pub mod dataset;
pub mod transform;

pub use dataloader::{Batches, DataLoader, LoaderOptions};
pub use dataset::{Dataset, TensorDataset};
pub use transform::{Compose, Normalize, ToTensor, Transform};
