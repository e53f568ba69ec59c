use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use expdata_core::{Float, Tensor, TensorError, TensorResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::dataset::Dataset;

/// One `(inputs, targets)` batch.
pub type Batch<T> = (Tensor<T>, Tensor<T>);

/// Batch-size and scheduling knobs for a [`DataLoader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    pub batch_size: usize,
    /// Reshuffle the sample order at the start of every pass.
    pub shuffle: bool,
    /// Background threads assembling batches ahead of the consumer; 0 assembles inline.
    pub num_workers: usize,
    /// Ask device backends to stage batches in page-locked memory. Host
    /// batches are unaffected; the flag travels with the loader for the consumer.
    pub pin_memory: bool,
    /// Seed for the shuffle RNG; `None` draws from OS entropy.
    pub seed: Option<u64>,
}

impl LoaderOptions {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            shuffle: false,
            num_workers: 0,
            pin_memory: false,
            seed: None,
        }
    }

    pub fn shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn pin_memory(mut self, pin: bool) -> Self {
        self.pin_memory = pin;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Restartable batch source over a dataset.
///
/// Every call to [`iter`](DataLoader::iter) starts a new pass that yields each
/// sample exactly once; all batches hold `batch_size` samples except possibly
/// the last.
pub struct DataLoader<D: Dataset> {
    dataset: Arc<D>,
    options: LoaderOptions,
    rng: StdRng,
}

impl<D: Dataset + 'static> DataLoader<D> {
    pub fn new(dataset: D, options: LoaderOptions) -> TensorResult<Self> {
        if options.batch_size == 0 {
            return Err(TensorError::InvalidOperation(
                "batch_size must be at least 1".to_string(),
            ));
        }
        let rng = match options.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Ok(DataLoader {
            dataset: Arc::new(dataset),
            options,
            rng,
        })
    }

    pub fn dataset(&self) -> &D {
        &self.dataset
    }

    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }

    /// Number of batches in one pass.
    pub fn len(&self) -> usize {
        self.dataset.len().div_ceil(self.options.batch_size)
    }

    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }

    /// Start a new pass over the dataset.
    pub fn iter(&mut self) -> Batches<D::Elem> {
        let mut order: Vec<usize> = (0..self.dataset.len()).collect();
        if self.options.shuffle {
            order.shuffle(&mut self.rng);
        }
        let chunks: Vec<Vec<usize>> = order
            .chunks(self.options.batch_size)
            .map(<[usize]>::to_vec)
            .collect();
        debug!(
            batches = chunks.len(),
            batch_size = self.options.batch_size,
            workers = self.options.num_workers,
            "starting pass"
        );

        let dataset: Arc<dyn Dataset<Elem = D::Elem>> = self.dataset.clone();
        if self.options.num_workers == 0 {
            Batches {
                source: Source::Inline {
                    dataset,
                    chunks: chunks.into_iter(),
                },
            }
        } else {
            Batches::prefetch(dataset, chunks, self.options.num_workers)
        }
    }
}

/// Gather samples `indices` and stack them into a batch.
fn collate<D: Dataset + ?Sized>(dataset: &D, indices: &[usize]) -> TensorResult<Batch<D::Elem>> {
    let mut inputs = Vec::with_capacity(indices.len());
    let mut targets = Vec::with_capacity(indices.len());
    for &i in indices {
        let (x, y) = dataset.get(i)?;
        inputs.push(x);
        targets.push(y);
    }
    Ok((Tensor::stack_samples(&inputs)?, Tensor::stack_samples(&targets)?))
}

/// Iterator over the batches of one pass.
pub struct Batches<T: Float> {
    source: Source<T>,
}

enum Source<T: Float> {
    Inline {
        dataset: Arc<dyn Dataset<Elem = T>>,
        chunks: std::vec::IntoIter<Vec<usize>>,
    },
    Prefetch {
        receivers: Vec<Receiver<TensorResult<Batch<T>>>>,
        workers: Vec<JoinHandle<()>>,
        next: usize,
        total: usize,
    },
    Failed(Option<TensorError>),
}

impl<T: Float> Batches<T> {
    /// Worker `w` assembles batches `w, w + n, w + 2n, ...`; the iterator
    /// reads the workers round-robin so batch order matches the inline path.
    fn prefetch(
        dataset: Arc<dyn Dataset<Elem = T>>,
        chunks: Vec<Vec<usize>>,
        n_workers: usize,
    ) -> Self {
        let total = chunks.len();
        let mut per_worker: Vec<Vec<Vec<usize>>> = vec![Vec::new(); n_workers];
        for (i, chunk) in chunks.into_iter().enumerate() {
            per_worker[i % n_workers].push(chunk);
        }

        let mut receivers = Vec::with_capacity(n_workers);
        let mut workers = Vec::with_capacity(n_workers);
        for (w, assigned) in per_worker.into_iter().enumerate() {
            let (tx, rx) = mpsc::sync_channel(2);
            let dataset = Arc::clone(&dataset);
            let handle = thread::Builder::new()
                .name(format!("expdata-loader-{}", w))
                .spawn(move || {
                    for chunk in assigned {
                        if tx.send(collate(dataset.as_ref(), &chunk)).is_err() {
                            break;
                        }
                    }
                });
            match handle {
                Ok(h) => {
                    receivers.push(rx);
                    workers.push(h);
                }
                Err(e) => {
                    warn!(error = %e, "could not spawn loader worker");
                    return Batches::failed(e.to_string());
                }
            }
        }

        Batches {
            source: Source::Prefetch {
                receivers,
                workers,
                next: 0,
                total,
            },
        }
    }

    fn failed(message: String) -> Self {
        Batches {
            source: Source::Failed(Some(TensorError::InvalidOperation(format!(
                "loader worker unavailable: {}",
                message
            )))),
        }
    }
}

impl<T: Float> Iterator for Batches<T> {
    type Item = TensorResult<Batch<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.source {
            Source::Inline { dataset, chunks } => {
                let chunk = chunks.next()?;
                Some(collate(dataset.as_ref(), &chunk))
            }
            Source::Prefetch {
                receivers,
                next,
                total,
                ..
            } => {
                if *next >= *total {
                    return None;
                }
                let rx = &receivers[*next % receivers.len()];
                *next += 1;
                match rx.recv() {
                    Ok(batch) => Some(batch),
                    Err(_) => Some(Err(TensorError::InvalidOperation(
                        "loader worker exited early".to_string(),
                    ))),
                }
            }
            Source::Failed(err) => err.take().map(Err),
        }
    }
}

impl<T: Float> Drop for Batches<T> {
    fn drop(&mut self) {
        if let Source::Prefetch {
            receivers, workers, ..
        } = &mut self.source
        {
            // Hang up first so blocked workers see a closed channel.
            receivers.clear();
            for handle in workers.drain(..) {
                if handle.join().is_err() {
                    warn!("loader worker panicked");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::TensorDataset;

    fn counting(n: usize) -> TensorDataset<f64> {
        let x = Tensor::new((0..n * 2).map(|v| v as f64).collect(), vec![n, 2]).unwrap();
        let y = Tensor::new((0..n).map(|v| v as f64).collect(), vec![n]).unwrap();
        TensorDataset::new(x, y).unwrap()
    }

    fn labels_of_pass(loader: &mut DataLoader<TensorDataset<f64>>) -> (Vec<usize>, Vec<f64>) {
        let mut sizes = Vec::new();
        let mut labels = Vec::new();
        for batch in loader.iter() {
            let (x, y) = batch.unwrap();
            assert_eq!(x.shape_vec(), vec![y.numel(), 2]);
            sizes.push(y.numel());
            labels.extend_from_slice(y.data());
        }
        (sizes, labels)
    }

    #[test]
    fn test_sequential_batches() {
        let mut loader = DataLoader::new(counting(10), LoaderOptions::new(4)).unwrap();
        assert_eq!(loader.len(), 3);
        let (sizes, labels) = labels_of_pass(&mut loader);
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(labels, (0..10).map(|v| v as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_shuffle_covers_every_sample_each_pass() {
        let opts = LoaderOptions::new(3).shuffle(true).seed(7);
        let mut loader = DataLoader::new(counting(20), opts).unwrap();

        let (_, first) = labels_of_pass(&mut loader);
        let (_, second) = labels_of_pass(&mut loader);
        assert_ne!(first, second);

        for pass in [first, second] {
            let mut sorted = pass.clone();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            assert_eq!(sorted, (0..20).map(|v| v as f64).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_prefetch_matches_inline_order() {
        let inline_opts = LoaderOptions::new(4).shuffle(true).seed(11);
        let mut inline = DataLoader::new(counting(23), inline_opts.clone()).unwrap();
        let mut prefetch = DataLoader::new(counting(23), inline_opts.num_workers(3)).unwrap();

        let (sizes_a, labels_a) = labels_of_pass(&mut inline);
        let (sizes_b, labels_b) = labels_of_pass(&mut prefetch);
        assert_eq!(sizes_a, sizes_b);
        assert_eq!(labels_a, labels_b);
    }

    #[test]
    fn test_abandoned_prefetch_pass() {
        let opts = LoaderOptions::new(1).num_workers(1);
        let mut loader = DataLoader::new(counting(50), opts).unwrap();
        let mut pass = loader.iter();
        assert!(pass.next().unwrap().is_ok());
        drop(pass);
        assert_eq!(loader.iter().count(), 50);
    }

    #[test]
    fn test_zero_batch_size() {
        assert!(DataLoader::new(counting(3), LoaderOptions::new(0)).is_err());
    }
}
