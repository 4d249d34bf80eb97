//! Sample-point index over the sphere surface
//!
//! Sample points anchor the spatial partition: every query coordinate belongs
//! to the region (chunk) of its nearest sample. Placement uses a Fibonacci
//! spiral for near-uniform coverage with a small seeded jitter so different
//! genes lay out different worlds.

use std::f64::consts::PI;

use rand::Rng;

use crate::gene::Gene;
use crate::model::ModelError;

/// Fixed set of sample points with nearest-neighbor queries.
#[derive(Clone, Debug)]
pub struct Samples {
    points: Vec<[f64; 3]>,
}

impl Samples {
    /// Generate `count` sample points on a sphere of the given radius.
    ///
    /// Placement is derived from the gene's `samples` stream, so the layout
    /// is a pure function of the gene.
    pub fn generate(gene: &Gene, count: usize, radius: f64) -> Result<Self, ModelError> {
        if count == 0 {
            return Err(ModelError::EmptySamples);
        }
        let mut rng = gene.derive("samples");
        Ok(Samples {
            points: fibonacci_sphere(count, radius, &mut rng),
        })
    }

    /// Build an index from explicit points. Mostly useful for tests and for
    /// callers that bring their own sampling scheme.
    pub fn from_points(points: Vec<[f64; 3]>) -> Result<Self, ModelError> {
        if points.is_empty() {
            return Err(ModelError::EmptySamples);
        }
        Ok(Samples { points })
    }

    /// Number of sample points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Coordinate of sample `index`.
    pub fn coord(&self, index: usize) -> (f64, f64, f64) {
        let [x, y, z] = self.points[index];
        (x, y, z)
    }

    /// All points, in index order. Used by the model signature.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Nearest sample to a query coordinate, with the Euclidean distance.
    ///
    /// Ties break toward the lowest index, which keeps the partition total
    /// and stable. Brute force; sample counts stay small enough that a
    /// spatial index has not been worth it.
    pub fn near(&self, x: f64, y: f64, z: f64) -> (usize, f64) {
        let mut best_idx = 0;
        let mut best_dist_sq = f64::MAX;
        for (idx, p) in self.points.iter().enumerate() {
            let dx = x - p[0];
            let dy = y - p[1];
            let dz = z - p[2];
            let dist_sq = dx * dx + dy * dy + dz * dz;
            if dist_sq < best_dist_sq {
                best_dist_sq = dist_sq;
                best_idx = idx;
            }
        }
        (best_idx, best_dist_sq.sqrt())
    }

    /// Projection function for the region around sample `index`.
    ///
    /// Rotates the sample's position vector onto the +Z axis (one rotation in
    /// the Z-X plane, one in the Z-Y plane) and applies the same rotation to
    /// the query, flattening the neighborhood of the sample to the rotated
    /// (x, y) plane. The flag reports whether the query's nearest sample is
    /// this one.
    pub fn projector(
        &self,
        index: usize,
    ) -> impl Fn(f64, f64, f64) -> (f64, f64, bool) + Send + Sync + '_ {
        let [px, py, pz] = self.points[index];

        // First rotation: zero the anchor's X component.
        let l = (pz * pz + px * px).sqrt();
        let (cos_a, sin_a) = if l > f64::EPSILON {
            (pz / l, -px / l)
        } else {
            (1.0, 0.0)
        };
        // Second rotation: zero the anchor's Y component.
        let r = (l * l + py * py).sqrt();
        let (cos_b, sin_b) = if r > f64::EPSILON {
            (l / r, -py / r)
        } else {
            (1.0, 0.0)
        };

        move |x, y, z| {
            let z1 = z * cos_a - x * sin_a;
            let x1 = z * sin_a + x * cos_a;
            let y1 = z1 * sin_b + y * cos_b;
            let (near, _) = self.near(x, y, z);
            (x1, y1, near == index)
        }
    }
}

/// Distribute `n` points on a sphere using a Fibonacci spiral.
///
/// Latitudes are evenly spaced; longitudes follow the golden-angle spiral
/// with a small random phase offset per point.
fn fibonacci_sphere(n: usize, radius: f64, rng: &mut impl Rng) -> Vec<[f64; 3]> {
    let golden_ratio = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let angle_increment = 2.0 * PI / golden_ratio;

    (0..n)
        .map(|i| {
            let y = 1.0 - (2.0 * i as f64 + 1.0) / n as f64;
            let ring = (1.0 - y * y).sqrt();
            let theta = angle_increment * i as f64 + rng.gen::<f64>() * 0.1;
            [
                radius * ring * theta.cos(),
                radius * y,
                radius * ring * theta.sin(),
            ]
        })
        .collect()
}
