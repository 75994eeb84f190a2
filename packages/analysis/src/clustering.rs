//! Groups wards with similar environmental, educational and energy
//! profiles.
//!
//! Features are standardized per batch so that AQI (hundreds) does not drown
//! out school counts (single digits), then partitioned with k-means using
//! k-means++ seeding. The random source is a seeded PCG generator, so the
//! same wards and cluster count always produce the same grouping.

use std::collections::BTreeMap;

use rand::distr::Distribution;
use rand::distr::weighted::{self, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use ward_insights_analysis_models::{
    AnalysisFailure, ClusterAssignment, ClusterReport, WardProfile,
};

use crate::AnalysisError;
use crate::stats;

/// Default number of clusters when the caller does not ask for one.
pub const DEFAULT_CLUSTER_COUNT: usize = 5;
/// Default seed for k-means initialization.
pub const DEFAULT_SEED: u64 = 42;
/// Default number of independent k-means initializations.
pub const DEFAULT_RESTARTS: usize = 10;
/// Default cap on Lloyd iterations per initialization.
pub const DEFAULT_MAX_ITERATIONS: usize = 300;

const FEATURES: usize = 4;

type Point = [f64; FEATURES];

/// k-means clusterer for [`WardProfile`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WardClusterer {
    cluster_count: usize,
    seed: u64,
    restarts: usize,
    max_iterations: usize,
}

impl Default for WardClusterer {
    fn default() -> Self {
        Self::new(DEFAULT_CLUSTER_COUNT)
    }
}

impl WardClusterer {
    /// Creates a clusterer with the given default cluster count.
    #[must_use]
    pub const fn new(cluster_count: usize) -> Self {
        Self {
            cluster_count,
            seed: DEFAULT_SEED,
            restarts: DEFAULT_RESTARTS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Sets the initialization seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sets the number of independent initializations.
    #[must_use]
    pub const fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Sets the Lloyd iteration cap.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// The cluster count used when none is requested.
    #[must_use]
    pub const fn cluster_count(&self) -> usize {
        self.cluster_count
    }

    /// Clusters `wards`, reporting failures in-band.
    ///
    /// `cluster_count` overrides the configured default.
    #[must_use]
    pub fn cluster(&self, wards: &[WardProfile], cluster_count: Option<usize>) -> ClusterReport {
        match self.try_cluster(wards, cluster_count) {
            Ok(assignment) => ClusterReport::from(assignment),
            Err(e) => {
                log::warn!("Ward clustering failed: {e}");
                ClusterReport::from(AnalysisFailure::from(e))
            }
        }
    }

    /// Clusters `wards`.
    ///
    /// The effective cluster count is `min(requested, wards.len())`, and at
    /// least one. Cluster labels are numbered in order of first appearance in
    /// `wards`, and ward names keep their input order within a cluster.
    ///
    /// # Errors
    ///
    /// * [`AnalysisError::EmptyInput`] if `wards` is empty
    /// * [`AnalysisError::NumericalFailure`] if any feature is NaN or infinite
    pub fn try_cluster(
        &self,
        wards: &[WardProfile],
        cluster_count: Option<usize>,
    ) -> Result<ClusterAssignment, AnalysisError> {
        if wards.is_empty() {
            return Err(AnalysisError::EmptyInput { what: "wards" });
        }

        let features: Vec<Point> = wards.iter().map(WardProfile::features).collect();
        if let Some(ward) = wards
            .iter()
            .zip(&features)
            .find_map(|(ward, f)| f.iter().any(|v| !v.is_finite()).then_some(ward))
        {
            return Err(AnalysisError::numerical(format!(
                "ward '{}' has non-finite features",
                ward.name
            )));
        }

        let k = cluster_count
            .unwrap_or(self.cluster_count)
            .max(1)
            .min(wards.len());
        let scaled = stats::standardize(&features);

        let mut rng = Pcg32::seed_from_u64(self.seed);
        let mut best: Option<Run> = None;
        for _ in 0..self.restarts.max(1) {
            let run = kmeans(&scaled, k, self.max_iterations, &mut rng);
            if best.as_ref().is_none_or(|b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }
        let Some(best) = best else {
            return Err(AnalysisError::numerical("k-means produced no result"));
        };

        log::debug!(
            "Clustered {} wards into k={k} (inertia {:.4})",
            wards.len(),
            best.inertia
        );

        let mut relabel = BTreeMap::new();
        let mut clusters: BTreeMap<usize, Vec<String>> = BTreeMap::new();
        for (ward, label) in wards.iter().zip(&best.labels) {
            let next = relabel.len();
            let label = *relabel.entry(*label).or_insert(next);
            clusters.entry(label).or_default().push(ward.name.clone());
        }

        Ok(ClusterAssignment {
            cluster_count: clusters.len(),
            clusters,
        })
    }
}

/// One k-means run.
struct Run {
    labels: Vec<usize>,
    inertia: f64,
}

fn kmeans(points: &[Point], k: usize, max_iterations: usize, rng: &mut Pcg32) -> Run {
    let mut centroids = seed_centroids(points, k, rng);
    let mut labels = vec![usize::MAX; points.len()];

    for _ in 0..max_iterations {
        if !assign(points, &centroids, &mut labels) {
            break;
        }
        centroids = update_centroids(points, &labels, &centroids);
    }
    assign(points, &centroids, &mut labels);

    let inertia = points
        .iter()
        .zip(&labels)
        .map(|(p, &l)| squared_distance(p, &centroids[l]))
        .sum();

    Run { labels, inertia }
}

/// k-means++ seeding: each new centroid is drawn with probability
/// proportional to its squared distance from the nearest existing one.
fn seed_centroids(points: &[Point], k: usize, rng: &mut Pcg32) -> Vec<Point> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..points.len())]);

    let mut nearest: Vec<f64> = points
        .iter()
        .map(|p| squared_distance(p, &centroids[0]))
        .collect();

    while centroids.len() < k {
        let next = weighted_index(&nearest, rng)
            .unwrap_or_else(|| rng.random_range(0..points.len()));
        let centroid = points[next];
        for (d, p) in nearest.iter_mut().zip(points) {
            *d = d.min(squared_distance(p, &centroid));
        }
        centroids.push(centroid);
    }

    centroids
}

/// Draws an index with probability proportional to its weight. Returns
/// `None` when every weight is zero.
fn weighted_index(weights: &[f64], rng: &mut Pcg32) -> Option<usize> {
    match WeightedIndex::new(weights) {
        Ok(dist) => Some(dist.sample(rng)),
        Err(weighted::Error::InsufficientNonZero) => None,
        Err(e) => {
            log::debug!("Falling back to uniform seeding: {e}");
            None
        }
    }
}

/// Assigns each point to its nearest centroid (lowest index on ties).
/// Returns `true` if any label changed.
fn assign(points: &[Point], centroids: &[Point], labels: &mut [usize]) -> bool {
    let mut changed = false;
    for (p, label) in points.iter().zip(labels.iter_mut()) {
        let nearest = nearest_centroid(p, centroids);
        if *label != nearest {
            *label = nearest;
            changed = true;
        }
    }
    changed
}

fn nearest_centroid(point: &Point, centroids: &[Point]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let d = squared_distance(point, c);
        if d < best_distance {
            best = i;
            best_distance = d;
        }
    }
    best
}

/// Moves every centroid to the mean of its points. A centroid that lost all
/// its points is moved onto the point farthest from its own centroid.
#[allow(clippy::cast_precision_loss)]
fn update_centroids(points: &[Point], labels: &[usize], previous: &[Point]) -> Vec<Point> {
    let k = previous.len();
    let mut sums = vec![[0.0; FEATURES]; k];
    let mut counts = vec![0_usize; k];

    for (p, &l) in points.iter().zip(labels) {
        counts[l] += 1;
        for (s, v) in sums[l].iter_mut().zip(p) {
            *s += v;
        }
    }

    let farthest = points
        .iter()
        .zip(labels)
        .enumerate()
        .map(|(i, (p, &l))| (i, squared_distance(p, &previous[l])))
        .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
        .map_or(0, |(i, _)| i);

    sums.into_iter()
        .zip(counts)
        .map(|(mut sum, count)| {
            if count == 0 {
                return points[farthest];
            }
            for s in &mut sum {
                *s /= count as f64;
            }
            sum
        })
        .collect()
}

fn squared_distance(a: &Point, b: &Point) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}
