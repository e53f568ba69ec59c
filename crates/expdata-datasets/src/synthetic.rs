//! Seeded two-class "make_classification" generator.
//!
//! Samples are drawn from Gaussian clusters placed on the vertices of a
//! hypercube in the informative subspace, padded with redundant linear
//! combinations and pure noise columns. The RNG is always seeded with
//! [`SEED`], so a [`SynthSpec`] maps to exactly one dataset.

use std::fmt;

use expdata_core::Tensor;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DatasetError, DatasetResult};
use crate::LabeledData;

pub const SEED: u64 = 42;
pub const DEFAULT_DATAPOINTS: usize = 3000;

const N_CLASSES: usize = 2;
/// Clusters generated per class, whatever `n_clusters_per_class` says.
const CLUSTERS_PER_CLASS: usize = 2;
const FLIP_Y: f64 = 0.01;
/// Vertex bits drawn jointly without replacement; higher dimensions get
/// independent random bits.
const MAX_JOINT_BITS: usize = 30;

/// Parameters of one synthetic dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthSpec {
    pub n_features: usize,
    pub n_informative: usize,
    pub n_redundant: usize,
    /// Recorded for reference. [`generate`] always uses two clusters per class.
    pub n_clusters_per_class: usize,
    pub class_sep: f64,
    pub n_datapoints: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    /// Every feature informative, clusters half a unit from the origin.
    Easy,
    /// A quarter informative, half redundant, clusters nearly touching.
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SynthSpec {
    /// Bind parameters. Nothing is checked until [`generate`].
    pub fn new(
        n_features: usize,
        n_informative: usize,
        n_redundant: usize,
        n_clusters_per_class: usize,
        class_sep: f64,
    ) -> Self {
        SynthSpec {
            n_features,
            n_informative,
            n_redundant,
            n_clusters_per_class,
            class_sep,
            n_datapoints: DEFAULT_DATAPOINTS,
        }
    }

    pub fn with_datapoints(mut self, n: usize) -> Self {
        self.n_datapoints = n;
        self
    }

    /// The named easy/hard profile for `n_features` columns.
    pub fn profile(n_features: usize, difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => SynthSpec::new(n_features, n_features, 0, 2, 0.5),
            Difficulty::Hard => {
                SynthSpec::new(n_features, n_features / 4, n_features / 2, 2, 0.01)
            }
        }
    }

    pub fn n_useless(&self) -> usize {
        self.n_features.saturating_sub(self.n_informative.saturating_add(self.n_redundant))
    }

    pub fn validate(&self) -> DatasetResult<()> {
        let invalid = |msg: String| Err(DatasetError::InvalidConfiguration(msg));

        let used = self.n_informative.checked_add(self.n_redundant);
        if used.map_or(true, |used| used > self.n_features) {
            return invalid(format!(
                "n_informative ({}) + n_redundant ({}) exceeds n_features ({})",
                self.n_informative, self.n_redundant, self.n_features
            ));
        }
        let clusters = N_CLASSES * CLUSTERS_PER_CLASS;
        let vertices_fit = self.n_informative >= usize::BITS as usize
            || (1usize << self.n_informative) >= clusters;
        if !vertices_fit {
            return invalid(format!(
                "{} classes x {} clusters need more than 2^{} hypercube vertices",
                N_CLASSES, CLUSTERS_PER_CLASS, self.n_informative
            ));
        }
        if self.n_datapoints == 0 {
            return invalid("n_datapoints must be at least 1".to_string());
        }
        if !self.class_sep.is_finite() {
            return invalid(format!("class_sep must be finite, got {}", self.class_sep));
        }
        // Bounds every buffer `generate` sizes: samples x features and the
        // informative x informative covariance.
        let sized = self
            .n_datapoints
            .checked_mul(self.n_features)
            .and(self.n_informative.checked_mul(self.n_features));
        if sized.is_none() {
            return invalid(format!(
                "{} datapoints x {} features is too large",
                self.n_datapoints, self.n_features
            ));
        }
        Ok(())
    }
}

/// Generate the dataset described by `spec`.
///
/// Labels are `0.0`/`1.0`. Output depends only on `spec`.
pub fn generate(spec: &SynthSpec) -> DatasetResult<LabeledData> {
    spec.validate()?;

    let n_samples = spec.n_datapoints;
    let n_inf = spec.n_informative;
    let n_red = spec.n_redundant;
    let n_useless = spec.n_useless();
    let n_clusters = N_CLASSES * CLUSTERS_PER_CLASS;
    let mut rng = StdRng::seed_from_u64(SEED);

    // Equal share per cluster, remainder to the first clusters.
    let mut per_cluster = vec![n_samples / n_clusters; n_clusters];
    for slot in per_cluster.iter_mut().take(n_samples % n_clusters) {
        *slot += 1;
    }

    let centroids = hypercube_vertices(n_clusters, n_inf, &mut rng)
        .into_iter()
        .map(|bits| {
            bits.into_iter()
                .map(|b| b * 2.0 * spec.class_sep - spec.class_sep)
                .collect::<Vec<f64>>()
        })
        .collect::<Vec<_>>();

    let gaussian = standard_normal(n_samples * n_inf, &mut rng);
    let mut informative = Tensor::new(gaussian, vec![n_samples, n_inf])?;
    let mut labels = Vec::with_capacity(n_samples);

    let mut start = 0;
    for (k, &count) in per_cluster.iter().enumerate() {
        let end = start + count;
        labels.extend(std::iter::repeat((k % N_CLASSES) as f64).take(count));

        let covariance = uniform_signed(n_inf * n_inf, &mut rng);
        let covariance = Tensor::new(covariance, vec![n_inf, n_inf])?;
        let cluster = informative.slice_samples(start, end)?.matmul(&covariance)?;

        let block = &mut informative.data_mut()[start * n_inf..end * n_inf];
        for (row, src) in block.chunks_mut(n_inf).zip(cluster.data().chunks(n_inf)) {
            for ((dst, &v), &c) in row.iter_mut().zip(src).zip(&centroids[k]) {
                *dst = v + c;
            }
        }
        start = end;
    }

    let redundant = if n_red > 0 {
        let mixing = Tensor::new(uniform_signed(n_inf * n_red, &mut rng), vec![n_inf, n_red])?;
        Some(informative.matmul(&mixing)?)
    } else {
        None
    };
    let noise = standard_normal(n_samples * n_useless, &mut rng);

    let n_features = spec.n_features;
    let mut data = Vec::with_capacity(n_samples * n_features);
    for i in 0..n_samples {
        data.extend_from_slice(informative.row(i)?);
        if let Some(red) = &redundant {
            data.extend_from_slice(red.row(i)?);
        }
        data.extend_from_slice(&noise[i * n_useless..(i + 1) * n_useless]);
    }

    let flipped: Vec<bool> = (0..n_samples).map(|_| rng.gen::<f64>() < FLIP_Y).collect();
    for (label, _) in labels.iter_mut().zip(&flipped).filter(|(_, f)| **f) {
        *label = rng.gen_range(0..N_CLASSES) as f64;
    }

    let mut row_order: Vec<usize> = (0..n_samples).collect();
    row_order.shuffle(&mut rng);
    let mut col_order: Vec<usize> = (0..n_features).collect();
    col_order.shuffle(&mut rng);

    let x = Tensor::new(data, vec![n_samples, n_features])?
        .select_samples(&row_order)?
        .select_cols(&col_order)?;
    let y: Vec<f64> = row_order.iter().map(|&i| labels[i]).collect();

    debug!(
        n_samples,
        n_features,
        n_informative = n_inf,
        n_redundant = n_red,
        flipped = flipped.iter().filter(|&&f| f).count(),
        "generated synthetic dataset"
    );
    Ok((x, Tensor::from_slice(&y)))
}

/// `count` distinct vertices of the `dims`-dimensional unit hypercube, as 0/1 coordinates.
fn hypercube_vertices(count: usize, dims: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    let extra = dims.saturating_sub(MAX_JOINT_BITS);
    let joint = dims - extra;

    let high: Vec<Vec<f64>> = (0..count)
        .map(|_| (0..extra).map(|_| rng.gen_range(0..2u8) as f64).collect())
        .collect();
    let codes = rand::seq::index::sample(rng, 1usize << joint, count);

    high.into_iter()
        .zip(codes.iter())
        .map(|(mut vertex, code)| {
            vertex.extend((0..joint).rev().map(|bit| ((code >> bit) & 1) as f64));
            vertex
        })
        .collect()
}

/// Standard normal samples via Box-Muller.
fn standard_normal(n: usize, rng: &mut StdRng) -> Vec<f64> {
    let mut out = Vec::with_capacity(n);
    while out.len() < n {
        let u1: f64 = rng.gen::<f64>().max(1e-10);
        let u2: f64 = rng.gen::<f64>();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = 2.0 * std::f64::consts::PI * u2;
        out.push(r * theta.cos());
        if out.len() < n {
            out.push(r * theta.sin());
        }
    }
    out
}

/// Uniform samples on `[-1, 1)`.
fn uniform_signed(n: usize, rng: &mut StdRng) -> Vec<f64> {
    (0..n).map(|_| 2.0 * rng.gen::<f64>() - 1.0).collect()
}
