//! MNIST train/test batch sources.

use expdata_data::{Compose, DataLoader, LoaderOptions, Normalize, Transform};
use tracing::info;

use crate::config::VisionConfig;
use crate::error::DatasetResult;
use crate::mnist::{MnistDataset, MnistSplit};

/// Mean pixel intensity of the MNIST training set after scaling to `[0, 1]`.
pub const MNIST_MEAN: f64 = 0.1307;
pub const MNIST_STD: f64 = 0.3081;

pub type VisionLoaders = (DataLoader<MnistDataset>, DataLoader<MnistDataset>);

/// `ToTensor` runs when a sample is fetched; this adds the fixed normalization.
pub fn mnist_transform() -> DatasetResult<Compose<f32>> {
    let normalize = Normalize::new(vec![MNIST_MEAN], vec![MNIST_STD])?;
    let steps: Vec<Box<dyn Transform<f32>>> = vec![Box::new(normalize)];
    Ok(Compose::new(steps))
}

/// Shuffled loader options; an accelerator gets one prefetch worker and pinned memory.
pub fn loader_options(
    batch_size: usize,
    use_accelerator: bool,
    seed: Option<u64>,
) -> LoaderOptions {
    let options = LoaderOptions::new(batch_size).shuffle(true);
    let options = if use_accelerator {
        options.num_workers(1).pin_memory(true)
    } else {
        options
    };
    match seed {
        Some(s) => options.seed(s),
        None => options,
    }
}

/// Build the MNIST train and test loaders.
///
/// The train split is downloaded into `config.mnist_dir` if missing; the test
/// split must already be there.
pub fn build_vision_loaders(
    use_accelerator: bool,
    config: &VisionConfig,
) -> DatasetResult<VisionLoaders> {
    let train = MnistDataset::load(&config.mnist_dir, MnistSplit::Train, true)?;
    let test = MnistDataset::load(&config.mnist_dir, MnistSplit::Test, false)?;
    loaders_from_datasets(train, test, use_accelerator, config)
}

/// Wrap already-loaded splits with the MNIST transform and loader options.
pub fn loaders_from_datasets(
    train: MnistDataset,
    test: MnistDataset,
    use_accelerator: bool,
    config: &VisionConfig,
) -> DatasetResult<VisionLoaders> {
    let train = train.with_transform(mnist_transform()?);
    let test = test.with_transform(mnist_transform()?);

    // Offset the test seed so the two passes are not shuffled in lockstep.
    let test_seed = config.seed.map(|s| s.wrapping_add(1));
    let train_loader = DataLoader::new(
        train,
        loader_options(config.batch_size, use_accelerator, config.seed),
    )?;
    let test_loader = DataLoader::new(
        test,
        loader_options(config.test_batch_size, use_accelerator, test_seed),
    )?;

    info!(
        train_batches = train_loader.len(),
        test_batches = test_loader.len(),
        use_accelerator,
        "vision loaders ready"
    );
    Ok((train_loader, test_loader))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatasetError;
    use crate::mnist::tests::write_split_files;
    use crate::testutil::scratch_dir;
    use expdata_data::Dataset;
    use std::collections::HashSet;
    use std::path::PathBuf;

    fn config(dir: PathBuf, batch_size: usize) -> VisionConfig {
        VisionConfig {
            mnist_dir: dir,
            batch_size,
            test_batch_size: 10,
            seed: Some(3),
        }
    }

    #[test]
    fn test_batch_sizes() {
        let dir = scratch_dir("vision");
        write_split_files(&dir, 70, 25);
        let (mut train, mut test) = build_vision_loaders(false, &config(dir, 32)).unwrap();

        let sizes: Vec<usize> = train
            .iter()
            .map(|b| b.unwrap().0.shape().dims()[0])
            .collect();
        assert_eq!(sizes, vec![32, 32, 6]);
        assert_eq!(train.len(), 3);

        let sizes: Vec<usize> = test.iter().map(|b| b.unwrap().1.numel()).collect();
        assert_eq!(sizes, vec![10, 10, 5]);
    }

    #[test]
    fn test_normalized_range_and_shape() {
        let dir = scratch_dir("vision");
        write_split_files(&dir, 8, 4);
        let (mut train, _) = build_vision_loaders(false, &config(dir, 4)).unwrap();

        let lo = (0.0 - MNIST_MEAN) / MNIST_STD;
        let hi = (1.0 - MNIST_MEAN) / MNIST_STD;
        for batch in train.iter() {
            let (images, labels) = batch.unwrap();
            assert_eq!(images.shape_vec(), vec![4, 1, 28, 28]);
            assert_eq!(labels.shape_vec(), vec![4]);
            for &v in images.data() {
                let v = v as f64;
                assert!(v >= lo - 1e-5 && v <= hi + 1e-5, "{} out of range", v);
            }
        }
    }

    #[test]
    fn test_accelerator_options() {
        let cpu = loader_options(64, false, None);
        assert!(cpu.shuffle);
        assert_eq!(cpu.num_workers, 0);
        assert!(!cpu.pin_memory);

        let gpu = loader_options(64, true, Some(1));
        assert_eq!(gpu.num_workers, 1);
        assert!(gpu.pin_memory);
        assert_eq!(gpu.seed, Some(1));
    }

    #[test]
    fn test_accelerator_pass_covers_every_sample() {
        let dir = scratch_dir("vision");
        write_split_files(&dir, 50, 5);
        let (mut train, _) = build_vision_loaders(true, &config(dir, 16)).unwrap();
        assert_eq!(train.options().num_workers, 1);
        assert_eq!(train.dataset().len(), 50);

        for _ in 0..2 {
            let mut seen = 0;
            let mut labels = HashSet::new();
            for batch in train.iter() {
                let (_, y) = batch.unwrap();
                seen += y.numel();
                labels.extend(y.data().iter().map(|&v| v as u8));
            }
            assert_eq!(seen, 50);
            assert_eq!(labels.len(), 10);
        }
    }

    #[test]
    fn test_missing_test_split_is_not_downloaded() {
        let dir = scratch_dir("vision");
        write_split_files(&dir, 4, 4);
        let (img, _) = MnistSplit::Test.file_names();
        std::fs::remove_file(dir.join(format!("{}.gz", img))).unwrap();

        match build_vision_loaders(false, &config(dir.clone(), 4)) {
            Err(DatasetError::FileNotFound(p)) => assert_eq!(p, dir.join(img)),
            Err(e) => panic!("expected FileNotFound, got {}", e),
            Ok(_) => panic!("expected FileNotFound"),
        }
    }

    #[test]
    fn test_shuffled_every_pass() {
        let dir = scratch_dir("vision");
        write_split_files(&dir, 40, 4);
        let (mut train, _) = build_vision_loaders(false, &config(dir, 40)).unwrap();
        let first: Vec<f32> = train.iter().next().unwrap().unwrap().1.into_data();
        let second: Vec<f32> = train.iter().next().unwrap().unwrap().1.into_data();
        assert_ne!(first, second);
    }
}
