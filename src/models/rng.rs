use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

/// Engine-owned source of standard-normal draws for path simulation.
///
/// Seeded generators replay the exact same sequence; unseeded ones draw
/// their state from OS entropy. Nothing here touches process-wide state.
pub struct RandomPathGenerator {
    inner: StdRng,
    seed: Option<u64>,
}

impl RandomPathGenerator {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            inner: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Seeded when `seed` is given, entropy-backed otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(s) => Self::from_seed(s),
            None => Self::from_entropy(),
        }
    }

    #[inline]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    #[inline]
    pub fn next_normal(&mut self) -> f64 {
        StandardNormal.sample(&mut self.inner)
    }

    pub fn fill_normal(&mut self, buffer: &mut [f64]) {
        for z in buffer.iter_mut() {
            *z = StandardNormal.sample(&mut self.inner);
        }
    }
}
