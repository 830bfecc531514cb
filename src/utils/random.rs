//! Seeded pseudo-random number generator owned by each algorithm instance.
//!
//! Every source of randomness in the crate (potential pools, initial
//! permanences, synapse growth, tie breaking) draws from a `Random` that the
//! component owns. There is no process-wide or clock-based entropy: the same
//! seed and call sequence always yields the same stream.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// A deterministic pseudo-random number generator.
///
/// Wraps ChaCha20, which is reproducible across platforms. The serialized
/// form stores the seed and the exact position in the key stream, so a
/// restored generator continues with the very next value the original
/// would have produced.
///
/// # Example
///
/// ```rust
/// use cortical::utils::Random;
///
/// let mut rng = Random::new(42);
/// let idx = rng.get_uint32_range(0, 100);
/// assert!(idx < 100);
///
/// let mut items: Vec<u32> = (0..10).collect();
/// rng.shuffle(&mut items);
/// ```
#[derive(Clone)]
pub struct Random {
    rng: ChaCha20Rng,
    seed: u64,
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct RandomState {
        seed: u64,
        word_pos: u128,
    }

    impl Serialize for Random {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            RandomState {
                seed: self.seed,
                word_pos: self.rng.get_word_pos(),
            }
            .serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Random {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let state = RandomState::deserialize(deserializer)?;
            let mut rng = ChaCha20Rng::seed_from_u64(state.seed);
            rng.set_word_pos(state.word_pos);
            Ok(Random {
                rng,
                seed: state.seed,
            })
        }
    }
}

impl Random {
    /// Creates a new generator. Every seed, including 0, is deterministic.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Returns the seed used for this generator.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generates a random u32.
    pub fn get_uint32(&mut self) -> u32 {
        self.rng.gen()
    }

    /// Generates a random u32 in the range [min, max). Returns `min` for an
    /// empty range.
    pub fn get_uint32_range(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..max)
    }

    /// Generates a random usize in [0, n). Returns 0 when `n == 0`.
    pub fn get_usize(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        self.rng.gen_range(0..n)
    }

    /// Generates a random f32 in [0, 1).
    pub fn get_real32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Generates a random f64 in [0, 1).
    pub fn get_real64(&mut self) -> f64 {
        self.rng.gen()
    }

    /// Shuffles a slice in place (Fisher-Yates).
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        for i in (1..slice.len()).rev() {
            let j = self.get_usize(i + 1);
            slice.swap(i, j);
        }
    }

    /// Picks `k` items without replacement, in random order.
    ///
    /// If `k >= items.len()`, returns a shuffled copy of all items.
    pub fn sample<T>(&mut self, mut items: Vec<T>, k: usize) -> Vec<T> {
        let n = items.len();
        if k >= n {
            self.shuffle(&mut items);
            return items;
        }

        // Partial Fisher-Yates: only the first k slots are settled.
        for i in 0..k {
            let j = i + self.get_usize(n - i);
            items.swap(i, j);
        }
        items.truncate(k);
        items
    }

    /// Picks `k` distinct indices from `0..n`.
    pub fn sample_indices(&mut self, n: usize, k: usize) -> Vec<usize> {
        self.sample((0..n).collect(), k)
    }
}

impl Default for Random {
    fn default() -> Self {
        Self::new(0)
    }
}

impl PartialEq for Random {
    fn eq(&self, other: &Self) -> bool {
        self.seed == other.seed && self.rng.get_word_pos() == other.rng.get_word_pos()
    }
}

impl std::fmt::Debug for Random {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Random")
            .field("seed", &self.seed)
            .field("word_pos", &self.rng.get_word_pos())
            .finish()
    }
}
