//! Seedable Gaussian and uniform noise.
//!
//! A [`NoiseSource`] is one logical random stream. Each draw holds the lock only while it fills
//! a vector that was allocated beforehand, so concurrent attacks sharing a source advance it one
//! whole vector at a time. Attacks that should not contend at all get their own stream through
//! [`NoiseSource::derive`].
use crate::{Image, PixelFloat};
use log::debug;
use ndarray::Array1;
use ndarray_rand::rand_distr::StandardNormal;
use rand::distributions::{Distribution, Standard};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

const STREAM_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Debug)]
pub struct NoiseSource {
    rng: Mutex<StdRng>,
}

impl NoiseSource {
    pub fn new_seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Seeded from the wall clock, so every process gets a different stream.
    pub fn from_time() -> Self {
        Self::new_seeded(time_seed())
    }

    /// Independent stream number `stream` of the family rooted at `master_seed`.
    pub fn derive(master_seed: u64, stream: u64) -> Self {
        Self::new_seeded(master_seed ^ stream.wrapping_add(1).wrapping_mul(STREAM_MIX))
    }

    /// Restart the stream from `seed`. Draws already taken are unaffected.
    pub fn set_seed(&self, seed: u64) {
        debug!("reseeding noise source with {}", seed);
        *self.lock() = StdRng::seed_from_u64(seed);
    }

    /// `size` independent draws from N(`mean`, `std`²).
    pub fn gen_gaussian(&self, size: usize, mean: f64, std: f64) -> Image {
        self.fill(size, |rng| {
            let z: f64 = StandardNormal.sample(rng);
            mean + std * z
        })
    }

    /// `size` independent draws from U[`min`, `max`).
    pub fn gen_uniform(&self, size: usize, min: f64, max: f64) -> Image {
        let width = max - min;
        self.fill(size, |rng| {
            let u: f64 = Standard.sample(rng);
            min + width * u
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn fill<F>(&self, size: usize, mut draw: F) -> Image
    where
        F: FnMut(&mut StdRng) -> f64,
    {
        let mut out: Image = Array1::zeros(size);
        let mut rng = self.lock();
        out.iter_mut()
            .for_each(|x| *x = draw(&mut *rng) as PixelFloat);
        out
    }

    fn lock(&self) -> MutexGuard<'_, StdRng> {
        // A panic elsewhere cannot leave the generator half-updated.
        self.rng.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for NoiseSource {
    fn default() -> Self {
        Self::from_time()
    }
}

#[allow(clippy::cast_possible_truncation)]
fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos() as u64)
}

static GLOBAL: OnceLock<Arc<NoiseSource>> = OnceLock::new();

/// Process-wide source, time-seeded on first use.
pub fn global() -> &'static Arc<NoiseSource> {
    GLOBAL.get_or_init(|| Arc::new(NoiseSource::from_time()))
}

/// Reseed the process-wide source. Must not race with attacks that draw from it.
pub fn set_seed(seed: u64) {
    global().set_seed(seed);
}

pub fn gen_gaussian(size: usize, mean: f64, std: f64) -> Image {
    global().gen_gaussian(size, mean, std)
}

pub fn gen_uniform(size: usize, min: f64, max: f64) -> Image {
    global().gen_uniform(size, min, max)
}
