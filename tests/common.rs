#![allow(dead_code)]
use hsja_rs::logging::init_console_logger;
use hsja_rs::{Image, Oracle, OracleError, PixelFloat, Sample};
use log::LevelFilter;
use ndarray::{Array1, ArrayView1};
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

static INIT: Once = Once::new();

pub fn setup() {
    INIT.call_once(|| {
        let _log_res = init_console_logger(LevelFilter::Info);
    });
}

/// Label 1 when the first coordinate exceeds 0.5, label 0 otherwise.
pub struct FirstCoordinate {
    pub size: usize,
    pub calls: AtomicUsize,
    pub batch_calls: AtomicUsize,
}

impl FirstCoordinate {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            calls: AtomicUsize::new(0),
            batch_calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }
}

impl Oracle for FirstCoordinate {
    fn predict(&self, input: ArrayView1<PixelFloat>) -> Result<usize, OracleError> {
        if input.len() != self.size {
            return Err(OracleError::InvalidInput {
                expected: self.size,
                given: input.len(),
            });
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(usize::from(input[0] > 0.5))
    }

    fn predict_batch(&self, inputs: &[Image]) -> Vec<Result<usize, OracleError>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        inputs.iter().map(|x| self.predict(x.view())).collect()
    }

    fn input_size(&self) -> usize {
        self.size
    }
}

/// Wraps [`FirstCoordinate`] and fails every `fail_every`-th call.
pub struct Flaky {
    pub inner: FirstCoordinate,
    pub fail_every: usize,
    pub calls: AtomicUsize,
}

impl Flaky {
    pub fn new(size: usize, fail_every: usize) -> Self {
        Self {
            inner: FirstCoordinate::new(size),
            fail_every,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call made, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Oracle for Flaky {
    fn predict(&self, input: ArrayView1<PixelFloat>) -> Result<usize, OracleError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call % self.fail_every == 0 {
            return Err(OracleError::Transport {
                message: format!("call {} timed out", call),
            });
        }
        self.inner.predict(input)
    }

    fn input_size(&self) -> usize {
        self.inner.size
    }
}

/// Never answers.
pub struct Unreachable {
    pub size: usize,
}

impl Oracle for Unreachable {
    fn predict(&self, _input: ArrayView1<PixelFloat>) -> Result<usize, OracleError> {
        Err(OracleError::Transport {
            message: "connection refused".to_string(),
        })
    }

    fn input_size(&self) -> usize {
        self.size
    }
}

/// Samples whose first coordinate is below the boundary, labelled 0.
pub fn samples_below_boundary(n: usize, size: usize, seed: u64) -> Vec<Sample> {
    let mut rng = Pcg64::seed_from_u64(seed);
    (0..n)
        .map(|id| {
            let mut data: Array1<f32> = (0..size).map(|_| rng.gen_range(0.0..1.0)).collect();
            data[0] = rng.gen_range(0.0..0.4);
            Sample::new(id, data, 0, format!("sample_{}.bin", id))
        })
        .collect()
}
