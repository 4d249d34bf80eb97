//! Seed management for the terrain model
//!
//! A `Gene` is the deterministic randomness root of a model. Every consumer
//! derives its own independent random stream from the gene plus a purpose
//! label, so re-evaluating any part of the model yields identical draws.

use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;
use sha2::{Digest, Sha256};

/// Immutable seed bytes from which all model randomness is derived.
///
/// A gene never hands out a shared generator. Each call to [`Gene::derive`]
/// builds a fresh stream, so callers on different threads (or repeated calls
/// from the same thread) cannot interfere with each other's draws.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gene(Vec<u8>);

impl Gene {
    /// Create a gene from arbitrary seed bytes (a string works fine).
    pub fn new(seed: impl AsRef<[u8]>) -> Self {
        Gene(seed.as_ref().to_vec())
    }

    /// Raw seed bytes, used for the model signature.
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    /// Derive a fresh, reproducible random stream for a purpose label.
    ///
    /// The label should combine a purpose tag with any index that scopes it,
    /// e.g. `altitude42` for the altitude draw of sample 42. Identical
    /// (gene, label) pairs always produce identical streams; different labels
    /// produce statistically independent ones.
    pub fn derive(&self, label: &str) -> ChaCha8Rng {
        let mut hasher = Sha256::new();
        hasher.update(&self.0);
        hasher.update(label.as_bytes());
        ChaCha8Rng::from_seed(hasher.finalize().into())
    }

    /// Convenience for index-scoped labels like `altitude{i}`.
    pub fn derive_indexed(&self, purpose: &str, index: usize) -> ChaCha8Rng {
        self.derive(&format!("{}{}", purpose, index))
    }
}
