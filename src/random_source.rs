//! Injectable randomness for placement, scale, ids and grass.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub trait RandomSource {
    /// Uniform sample in `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Uniform sample in `[low, low + span]`, clamped so float rounding never
    /// leaves the range.
    fn in_span(&mut self, low: f64, span: f64) -> f64 {
        (low + self.next_unit() * span).clamp(low, low + span)
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    fn pick_index(&mut self, len: usize) -> usize {
        let index = (self.next_unit() * len as f64) as usize;
        index.min(len.saturating_sub(1))
    }

    /// Lowercase base-36 token, the shape idea ids take.
    fn token(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| ID_ALPHABET[self.pick_index(ID_ALPHABET.len())] as char)
            .collect()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

/// Picks the generator a garden runs with: seeded when `seed` is set.
pub fn source_for(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom::new()),
    }
}

/// Process-wide generator, used by hosts.
#[derive(Debug, Default)]
pub struct ThreadRandom {
    rng: ThreadRng,
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self { rng: rand::thread_rng() }
    }
}

impl RandomSource for ThreadRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Deterministic generator; the same seed replays the same garden.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}
