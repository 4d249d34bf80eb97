//! Terrain model core
//!
//! Orchestrates the gene, sample index, gather set, and noise primitive into
//! the public query surface: [`Model::place`] resolves a coordinate to its
//! chunk, [`Model::altitude`] blends the macro elevation level for a sample,
//! and [`Model::signature`] fingerprints the model state.

use log::trace;
use noise::{NoiseFn, Perlin};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::ModelConfig;
use crate::gathers::{GatherRanges, Gathers};
use crate::gene::Gene;
use crate::samples::Samples;
use crate::shaping::{altitude_curve, circum_proportion, Curve};

/// Structural misconfiguration of the model.
///
/// There is nothing transient here: every operation on a validly constructed
/// model is a pure computation, so failures only arise when the model is
/// assembled from unusable parts.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("sample set is empty, nearest-sample queries are undefined")]
    EmptySamples,
    #[error("gather set is empty, nearest-gather queries are undefined")]
    EmptyGathers,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// A seed-derived terrain model over a spherical world.
///
/// Immutable after construction; all queries read shared state and derive
/// fresh random streams, so a model can be shared across threads freely.
pub struct Model {
    gene: Gene,
    gathers: Gathers,
    samples: Samples,
    noise: Perlin,
    altitude_fn: Curve,
    circum_fn: Curve,
}

/// The region governed by one sample point.
///
/// Derived on demand from the sample index, never persisted; rebuilding it
/// from the same model yields identical behavior.
pub struct Chunk<'a> {
    /// Index of the anchor sample.
    pub index: usize,
    /// Anchor sample coordinate.
    pub x: f64,
    pub y: f64,
    pub z: f64,
    projector: Box<dyn Fn(f64, f64, f64) -> (f64, f64, bool) + Send + Sync + 'a>,
    terrain: Box<dyn Fn(f64, f64, f64) -> (f64, bool) + Send + Sync + 'a>,
}

impl Chunk<'_> {
    /// Flatten a coordinate into the chunk's 2D projection.
    /// The flag reports whether the coordinate belongs to this chunk.
    pub fn project(&self, x: f64, y: f64, z: f64) -> (f64, f64, bool) {
        (self.projector)(x, y, z)
    }

    /// Elevation at a coordinate, plus whether it belongs to this chunk.
    pub fn terrain(&self, x: f64, y: f64, z: f64) -> (f64, bool) {
        (self.terrain)(x, y, z)
    }
}

/// A query coordinate bound to its nearest chunk.
pub struct Place<'a> {
    /// The queried coordinate.
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Chunk whose anchor sample is nearest to the coordinate.
    pub chunk: Chunk<'a>,
    /// Distance from the coordinate to the chunk's anchor.
    pub distance: f64,
}

impl Model {
    /// Build a model from a configuration.
    ///
    /// The gene comes from the config seed; samples, gathers, and the noise
    /// seed are all derived from the gene, so two models built from the same
    /// config are indistinguishable.
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        config.validate()?;
        let gene = Gene::new(&config.seed);
        let gathers = Gathers::generate(
            &gene,
            config.gather_count,
            config.radius,
            GatherRanges {
                level_min: config.level_min,
                level_max: config.level_max,
                strength_min: config.strength_min,
                strength_max: config.strength_max,
            },
        )?;
        let samples = Samples::generate(&gene, config.sample_count, config.radius)?;
        Ok(Self::from_parts(gene, gathers, samples, config))
    }

    /// Assemble a model from already-built collaborators.
    ///
    /// The config only contributes the shaping-curve parameters here; the
    /// collaborators are taken as-is.
    pub fn from_parts(
        gene: Gene,
        gathers: Gathers,
        samples: Samples,
        config: &ModelConfig,
    ) -> Self {
        let noise = Perlin::new(gene.derive("noise").gen());
        Model {
            gene,
            gathers,
            samples,
            noise,
            altitude_fn: altitude_curve(config.max_altitude, config.altitude_levels),
            circum_fn: circum_proportion(config.radius),
        }
    }

    /// Replace the shaping curves. Both must stay monotonic.
    pub fn with_curves(mut self, altitude_fn: Curve, circum_fn: Curve) -> Self {
        self.altitude_fn = altitude_fn;
        self.circum_fn = circum_fn;
        self
    }

    /// Resolve a coordinate to its nearest chunk.
    ///
    /// The chunk is rebuilt on every call; construction is cheap and pure,
    /// so repeated calls with the same coordinate behave identically.
    pub fn place(&self, x: f64, y: f64, z: f64) -> Place<'_> {
        let (index, distance) = self.samples.near(x, y, z);
        let (nx, ny, nz) = self.samples.coord(index);
        let chunk = Chunk {
            index,
            x: nx,
            y: ny,
            z: nz,
            projector: Box::new(self.samples.projector(index)),
            terrain: Box::new(self.terrain(index)),
        };
        Place {
            x,
            y,
            z,
            chunk,
            distance,
        }
    }

    /// Blended macro elevation for the sample at `index`, located at (x, y, z).
    ///
    /// Blends the nearest gather's level with a bounded stochastic wave and a
    /// proportional normal drift, all drawn from the sample's own
    /// `altitude{index}` stream. Pure: repeated calls with the same index
    /// produce bit-identical results.
    pub fn altitude(&self, index: usize, x: f64, y: f64, z: f64) -> f64 {
        let (gi, gd) = self.gathers.near(x, y, z);
        let gl = self.gathers.level(gi);

        let mut rng = self.gene.derive_indexed("altitude", index);
        let wave = self.wave(&mut rng, gd, self.gathers.strength(gi));

        // level ~ N(gl / wave, (gl / wave) / 8)
        let mut level = gl / wave;
        let drift: f64 = rng.sample(StandardNormal);
        level += drift * level / 8.0;

        trace!(
            "altitude sample {}: gather {} gd {:.3} gl {:.3} wave {:.6}",
            index, gi, gd, gl, wave
        );
        (self.altitude_fn)(level)
    }

    /// Stochastic elevation-modulation factor, clamped to a floor of 1.
    ///
    /// The distance-to-strength ratio sets the raw fluctuation magnitude; a
    /// uniform draw recenters it and the cube sharpens it. The floor means
    /// the wave only ever dampens the gather level, never amplifies it.
    fn wave(&self, rng: &mut ChaCha8Rng, distance: f64, strength: f64) -> f64 {
        let raw = (self.circum_fn)(distance) / strength;
        let wave = 1.0 + (raw - rng.gen::<f64>()).powi(3);
        wave.max(1.0)
    }

    /// Build the terrain function for the sample at `index`.
    ///
    /// Membership is the Voronoi rule: a coordinate belongs to this chunk iff
    /// its nearest sample is the anchor. The elevation side is still the raw
    /// noise field.
    // TODO: offset the returned elevation against `altitude(index, ..)` as
    // the regional baseline; needs neighbour-chunk levels to pick a waveform.
    pub fn terrain(
        &self,
        index: usize,
    ) -> impl Fn(f64, f64, f64) -> (f64, bool) + Send + Sync + '_ {
        let noise = &self.noise;
        let samples = &self.samples;
        move |x, y, z| {
            let (near, _) = samples.near(x, y, z);
            (noise.get([x, y, z]), near == index)
        }
    }

    /// SHA-256 fingerprint of the model's observable state, hex-encoded.
    ///
    /// Covers the gene bytes and every sample and gather in index order, with
    /// floats encoded as their exact bit patterns. Any change to any of the
    /// three collaborators changes the digest; identical state always hashes
    /// identically, in-process and across processes.
    pub fn signature(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.gene.bytes());

        hasher.update((self.samples.len() as u64).to_le_bytes());
        for point in self.samples.points() {
            for &c in point {
                hasher.update(c.to_bits().to_le_bytes());
            }
        }

        hasher.update((self.gathers.len() as u64).to_le_bytes());
        for gather in self.gathers.clusters() {
            for &c in &gather.center {
                hasher.update(c.to_bits().to_le_bytes());
            }
            hasher.update(gather.level.to_bits().to_le_bytes());
            hasher.update(gather.strength.to_bits().to_le_bytes());
        }

        hasher
            .finalize()
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }

    /// The sample index backing this model.
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// The gather set backing this model.
    pub fn gathers(&self) -> &Gathers {
        &self.gathers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gathers::Gather;
    use std::collections::HashSet;

    fn small_config(seed: &str) -> ModelConfig {
        ModelConfig {
            sample_count: 20,
            gather_count: 4,
            ..ModelConfig::with_seed(seed)
        }
    }

    /// Minimal world: one sample at the origin, one gather with level 100
    /// and strength 1, seed "test".
    fn scenario_model() -> Model {
        let gene = Gene::new("test");
        let samples = Samples::from_points(vec![[0.0, 0.0, 0.0]]).unwrap();
        let gathers = Gathers::from_clusters(vec![Gather {
            center: [0.0, 0.0, 0.0],
            level: 100.0,
            strength: 1.0,
        }])
        .unwrap();
        Model::from_parts(gene, gathers, samples, &ModelConfig::with_seed("test"))
    }

    #[test]
    fn test_place_at_single_sample() {
        let model = scenario_model();
        let place = model.place(0.0, 0.0, 0.0);
        assert_eq!(place.chunk.index, 0);
        assert_eq!(place.distance, 0.0);
        assert_eq!((place.chunk.x, place.chunk.y, place.chunk.z), (0.0, 0.0, 0.0));

        let (_, inside) = place.chunk.terrain(0.0, 0.0, 0.0);
        assert!(inside);
    }

    #[test]
    fn test_place_far_query_resolves() {
        let model = Model::new(&small_config("far")).unwrap();
        let place = model.place(1e12, -1e12, 1e12);
        assert!(place.chunk.index < model.samples().len());
        assert!(place.distance.is_finite());
    }

    #[test]
    fn test_chunk_self_membership() {
        let model = Model::new(&small_config("membership")).unwrap();
        for i in 0..model.samples().len() {
            let (sx, sy, sz) = model.samples().coord(i);
            let place = model.place(sx, sy, sz);
            assert_eq!(place.chunk.index, i);
            let (_, inside) = place.chunk.terrain(sx, sy, sz);
            assert!(inside, "chunk {} should own its anchor", i);
            let (_, _, inside) = place.chunk.project(sx, sy, sz);
            assert!(inside);
        }
    }

    #[test]
    fn test_altitude_is_deterministic() {
        let model = Model::new(&small_config("determinism")).unwrap();
        for i in 0..model.samples().len() {
            let (x, y, z) = model.samples().coord(i);
            let a = model.altitude(i, x, y, z);
            let b = model.altitude(i, x, y, z);
            assert_eq!(a.to_bits(), b.to_bits());
        }

        // A freshly built identical model agrees bit-for-bit.
        let other = Model::new(&small_config("determinism")).unwrap();
        let (x, y, z) = model.samples().coord(3);
        assert_eq!(
            model.altitude(3, x, y, z).to_bits(),
            other.altitude(3, x, y, z).to_bits()
        );
    }

    #[test]
    fn test_wave_never_below_one() {
        let model = Model::new(&small_config("wave")).unwrap();
        for i in 0..64 {
            let mut rng = model.gene.derive_indexed("wave-test", i);
            for step in 0..50 {
                let distance = step as f64 * 50.0;
                for &strength in &[0.05, 0.3, 1.0, 10.0] {
                    let wave = model.wave(&mut rng, distance, strength);
                    assert!(wave >= 1.0, "wave {} below floor", wave);
                }
            }
        }
    }

    #[test]
    fn test_terrain_elevation_is_raw_noise() {
        // The blended altitude is intentionally not wired into the terrain
        // function yet; elevation must match the bare noise field.
        let model = Model::new(&small_config("placeholder")).unwrap();
        let terrain = model.terrain(0);
        for &(x, y, z) in &[(0.5, 0.25, -0.75), (100.1, -3.2, 7.7), (0.0, 0.0, 0.0)] {
            let (elevation, _) = terrain(x, y, z);
            assert_eq!(elevation.to_bits(), model.noise.get([x, y, z]).to_bits());
        }
    }

    #[test]
    fn test_signature_stable_for_identical_state() {
        let a = Model::new(&small_config("sig")).unwrap();
        let b = Model::new(&small_config("sig")).unwrap();
        assert_eq!(a.signature(), b.signature());
        assert_eq!(a.signature().len(), 64);
    }

    #[test]
    fn test_signature_changes_with_each_input() {
        let base = small_config("sig");
        let model = Model::new(&base).unwrap();

        let reseeded = Model::new(&small_config("sig2")).unwrap();
        assert_ne!(model.signature(), reseeded.signature());

        let mut more_samples = base.clone();
        more_samples.sample_count += 1;
        assert_ne!(
            model.signature(),
            Model::new(&more_samples).unwrap().signature()
        );

        let mut more_gathers = base.clone();
        more_gathers.gather_count += 1;
        assert_ne!(
            model.signature(),
            Model::new(&more_gathers).unwrap().signature()
        );

        // A single scalar tweak in one gather must show up too.
        let gene = Gene::new("sig");
        let samples = Samples::generate(&gene, 5, 1000.0).unwrap();
        let cluster = Gather {
            center: [0.0, 1000.0, 0.0],
            level: 100.0,
            strength: 1.0,
        };
        let a = Model::from_parts(
            gene.clone(),
            Gathers::from_clusters(vec![cluster]).unwrap(),
            samples.clone(),
            &base,
        );
        let b = Model::from_parts(
            gene,
            Gathers::from_clusters(vec![Gather {
                level: 101.0,
                ..cluster
            }])
            .unwrap(),
            samples,
            &base,
        );
        assert_ne!(a.signature(), b.signature());
    }

    #[test]
    fn test_signature_no_collisions_over_many_models() {
        let mut seen = HashSet::new();
        for i in 0..1000 {
            let mut config = small_config(&format!("collision-{}", i));
            config.sample_count = 4;
            config.gather_count = 2;
            let model = Model::new(&config).unwrap();
            assert!(
                seen.insert(model.signature()),
                "signature collision at seed {}",
                i
            );
        }
    }

    #[test]
    fn test_empty_collaborators_rejected() {
        let mut config = small_config("empty");
        config.sample_count = 0;
        assert!(matches!(Model::new(&config), Err(ModelError::EmptySamples)));

        let mut config = small_config("empty");
        config.gather_count = 0;
        assert!(matches!(Model::new(&config), Err(ModelError::EmptyGathers)));
    }

    #[test]
    fn test_custom_curves_are_used() {
        let model = Model::new(&small_config("curves"))
            .unwrap()
            .with_curves(Box::new(|_| 42.0), Box::new(|_| 0.0));
        let (x, y, z) = model.samples().coord(0);
        assert_eq!(model.altitude(0, x, y, z), 42.0);
    }

    #[test]
    fn test_concurrent_queries_agree() {
        let model = Model::new(&small_config("threads")).unwrap();
        let reference: Vec<f64> = (0..model.samples().len())
            .map(|i| {
                let (x, y, z) = model.samples().coord(i);
                model.altitude(i, x, y, z)
            })
            .collect();

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for (i, &expected) in reference.iter().enumerate() {
                        let (x, y, z) = model.samples().coord(i);
                        assert_eq!(model.altitude(i, x, y, z).to_bits(), expected.to_bits());
                        let place = model.place(x, y, z);
                        assert_eq!(place.chunk.index, i);
                    }
                });
            }
        });
    }
}
