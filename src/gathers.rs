//! Macro gather clusters
//!
//! A gather is a broad influence center: its `level` sets the elevation
//! magnitude it pulls the surrounding terrain toward, and its `strength`
//! controls how quickly that pull fades with distance. The altitude blend in
//! the model consults the nearest gather for every sample point.

use std::f64::consts::PI;

use rand::Rng;

use crate::gene::Gene;
use crate::model::ModelError;

/// One gather cluster.
#[derive(Clone, Copy, Debug)]
pub struct Gather {
    pub center: [f64; 3],
    /// Target elevation magnitude, in abstract level units.
    pub level: f64,
    /// Influence falloff control. Strictly positive.
    pub strength: f64,
}

/// Fixed set of gather clusters with nearest-cluster queries.
#[derive(Clone, Debug)]
pub struct Gathers {
    clusters: Vec<Gather>,
}

/// Parameter ranges gathers draw their scalars from.
#[derive(Clone, Copy, Debug)]
pub struct GatherRanges {
    pub level_min: f64,
    pub level_max: f64,
    pub strength_min: f64,
    pub strength_max: f64,
}

impl Gathers {
    /// Generate `count` clusters on a sphere of the given radius.
    ///
    /// Centers follow a Fibonacci spiral with a seeded longitude phase per
    /// cluster; levels and strengths are drawn from the gene's `gathers`
    /// stream within the configured ranges. Pure function of the gene.
    pub fn generate(
        gene: &Gene,
        count: usize,
        radius: f64,
        ranges: GatherRanges,
    ) -> Result<Self, ModelError> {
        if count == 0 {
            return Err(ModelError::EmptyGathers);
        }
        let mut rng = gene.derive("gathers");
        let golden_ratio = (1.0 + 5.0_f64.sqrt()) / 2.0;
        let angle_increment = 2.0 * PI / golden_ratio;

        let clusters = (0..count)
            .map(|i| {
                let y = 1.0 - (2.0 * i as f64 + 1.0) / count as f64;
                let ring = (1.0 - y * y).sqrt();
                let theta = angle_increment * i as f64 + rng.gen::<f64>() * 2.0 * PI;
                let level = if ranges.level_min < ranges.level_max {
                    rng.gen_range(ranges.level_min..ranges.level_max)
                } else {
                    ranges.level_min
                };
                let strength = if ranges.strength_min < ranges.strength_max {
                    rng.gen_range(ranges.strength_min..ranges.strength_max)
                } else {
                    ranges.strength_min
                };
                Gather {
                    center: [
                        radius * ring * theta.cos(),
                        radius * y,
                        radius * ring * theta.sin(),
                    ],
                    level,
                    strength,
                }
            })
            .collect();

        Ok(Gathers { clusters })
    }

    /// Build a set from explicit clusters. Mostly useful for tests.
    pub fn from_clusters(clusters: Vec<Gather>) -> Result<Self, ModelError> {
        if clusters.is_empty() {
            return Err(ModelError::EmptyGathers);
        }
        Ok(Gathers { clusters })
    }

    /// Number of clusters.
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    /// All clusters, in index order. Used by the model signature.
    pub fn clusters(&self) -> &[Gather] {
        &self.clusters
    }

    /// Level of cluster `index`.
    pub fn level(&self, index: usize) -> f64 {
        self.clusters[index].level
    }

    /// Strength of cluster `index`.
    pub fn strength(&self, index: usize) -> f64 {
        self.clusters[index].strength
    }

    /// Nearest cluster to a coordinate, with the Euclidean distance.
    /// Ties break toward the lowest index.
    pub fn near(&self, x: f64, y: f64, z: f64) -> (usize, f64) {
        let mut best_idx = 0;
        let mut best_dist_sq = f64::MAX;
        for (idx, g) in self.clusters.iter().enumerate() {
            let dx = x - g.center[0];
            let dy = y - g.center[1];
            let dz = z - g.center[2];
            let dist_sq = dx * dx + dy * dy + dz * dz;
            if dist_sq < best_dist_sq {
                best_dist_sq = dist_sq;
                best_idx = idx;
            }
        }
        (best_idx, best_dist_sq.sqrt())
    }
}
