//! Model configuration
//!
//! Bundles the knobs for building a terrain model: seed, collaborator sizes,
//! sphere geometry, and the parameter ranges the gather clusters draw from.

use serde::{Deserialize, Serialize};

use crate::model::ModelError;

/// Configuration for [`crate::model::Model::new`].
///
/// Serializable so a world setup can be stored alongside its signature and
/// recreated exactly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Seed string for the model gene. Identical seeds recreate the world.
    pub seed: String,
    /// Number of sample points partitioning the sphere surface.
    pub sample_count: usize,
    /// Number of macro gather clusters biasing elevation.
    pub gather_count: usize,
    /// Sphere radius, in world units.
    pub radius: f64,
    /// Range gather levels are drawn from (target elevation magnitude).
    pub level_min: f64,
    pub level_max: f64,
    /// Range gather strengths are drawn from. Must stay strictly positive,
    /// strength divides the distance proportion in the wave computation.
    pub strength_min: f64,
    pub strength_max: f64,
    /// Ceiling of the altitude shaping curve, in elevation units.
    pub max_altitude: f64,
    /// Level scale of the altitude shaping curve (levels at which the curve
    /// reaches ~76% of the ceiling).
    pub altitude_levels: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            seed: "terra".to_string(),
            sample_count: 300,
            gather_count: 8,
            radius: 1000.0,
            level_min: 50.0,
            level_max: 400.0,
            strength_min: 0.05,
            strength_max: 1.0,
            max_altitude: 500.0,
            altitude_levels: 100.0,
        }
    }
}

impl ModelConfig {
    /// Create a default configuration with the given seed.
    pub fn with_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            ..Self::default()
        }
    }

    /// Check structural preconditions before any collaborator is built.
    ///
    /// Empty sample or gather sets would make "nearest" queries undefined,
    /// so they are rejected here rather than defaulted away.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.sample_count == 0 {
            return Err(ModelError::EmptySamples);
        }
        if self.gather_count == 0 {
            return Err(ModelError::EmptyGathers);
        }
        if !(self.radius > 0.0) {
            return Err(ModelError::InvalidConfig("radius must be positive".into()));
        }
        if !(self.level_min <= self.level_max) {
            return Err(ModelError::InvalidConfig("level range is inverted".into()));
        }
        if !(self.strength_min > 0.0 && self.strength_min <= self.strength_max) {
            return Err(ModelError::InvalidConfig(
                "strength range must be positive and ordered".into(),
            ));
        }
        if !(self.max_altitude > 0.0 && self.altitude_levels > 0.0) {
            return Err(ModelError::InvalidConfig(
                "altitude curve parameters must be positive".into(),
            ));
        }
        Ok(())
    }
}
