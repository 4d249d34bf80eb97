//! Seed-derived terrain model for a spherical world
//!
//! Answers "what is the ground at point (x, y, z)?" deterministically: a
//! [`Gene`](gene::Gene) seed derives every random stream, sample points
//! partition the sphere into chunks, and gather clusters bias the elevation
//! level each chunk settles around. The same seed always rebuilds the same
//! world, and [`Model::signature`](model::Model::signature) fingerprints it.

pub mod config;
pub mod gathers;
pub mod gene;
pub mod model;
pub mod samples;
pub mod shaping;

pub use config::ModelConfig;
pub use gathers::{Gather, Gathers};
pub use gene::Gene;
pub use model::{Chunk, Model, ModelError, Place};
pub use samples::Samples;
