// ============================================================
// Layer 4 — Shuffling and Batch Sampling
// ============================================================
// Two jobs:
//   1. Shuffle a freshly loaded image set so the class blocks
//      written on disk are mixed before anything looks at it.
//   2. Hand the training loop one mini-batch of indices per
//      iteration.
//
// BatchSampler walks a shuffled permutation of every index,
// batch_size at a time. When the permutation is used up it is
// reshuffled, so each pass visits every sample exactly once:
//
//   perm = [4 1 7 0 | 3 6 2 5]   batch_size = 4
//   iter 0 → [4 1 7 0]
//   iter 1 → [3 6 2 5]
//   iter 2 → reshuffle, [6 0 5 2] ...
//
// Uses Fisher-Yates via rand::seq::SliceRandom.
//
// Reference: rand crate documentation

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// RNG seeded from `seed` when given, from OS entropy otherwise.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None    => StdRng::from_entropy(),
    }
}

/// Shuffle samples in place. Each sample carries its own label,
/// so images and labels stay paired.
pub fn shuffle_samples<T>(samples: &mut [T], rng: &mut StdRng) {
    samples.shuffle(rng);
}

/// Endless source of shuffled mini-batch indices.
pub struct BatchSampler {
    order:      Vec<usize>,
    cursor:     usize,
    batch_size: usize,
    passes:     usize,
    rng:        StdRng,
}

impl BatchSampler {
    /// # Panics
    /// Panics if batch_size is 0 or there are no samples,
    /// since no batch could ever be produced.
    pub fn new(num_samples: usize, batch_size: usize, mut rng: StdRng) -> Self {
        assert!(batch_size > 0, "batch_size must be positive");
        assert!(num_samples > 0, "cannot sample from an empty dataset");

        let mut order: Vec<usize> = (0..num_samples).collect();
        order.shuffle(&mut rng);
        Self { order, cursor: 0, batch_size, passes: 0, rng }
    }

    /// Indices of the next mini-batch.
    /// The last batch of a pass may be shorter than batch_size.
    pub fn next_batch(&mut self) -> Vec<usize> {
        if self.cursor >= self.order.len() {
            self.order.shuffle(&mut self.rng);
            self.cursor = 0;
            self.passes += 1;
        }

        let end   = (self.cursor + self.batch_size).min(self.order.len());
        let batch = self.order[self.cursor..end].to_vec();
        self.cursor = end;
        batch
    }

    /// Completed passes over the data
    pub fn passes(&self) -> usize {
        self.passes
    }
}
